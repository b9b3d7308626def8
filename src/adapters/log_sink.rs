//! Log-based event and status sinks.
//!
//! [`LogEventSink`] writes structured application events to the logger
//! (UART / USB-CDC in production).  [`LogStatusSink`] stands in for the
//! character display by logging the two rendered lines when they change.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, StatusSink};
use crate::app::telemetry::ChannelOutcome;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn outcome(o: ChannelOutcome) -> &'static str {
    match o {
        ChannelOutcome::Delivered => "ok",
        ChannelOutcome::Skipped => "skip",
        ChannelOutcome::Failed(_) => "FAIL",
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(r) => {
                info!("TELEM | mqtt={} http={}", outcome(r.pubsub), outcome(r.http));
            }
            AppEvent::DangerRaised(causes) => {
                warn!("DANGER | {} | door open, alarm on", causes.summary());
            }
            AppEvent::DangerCleared => {
                info!("DANGER | cleared");
            }
            AppEvent::ConnectionChanged { from, to } => {
                info!("MQTT | {:?} -> {:?}", from, to);
            }
            AppEvent::CommandApplied { command, defaulted } => {
                if *defaulted {
                    warn!("CMD | {:?} (malformed payload, defaulted)", command);
                } else {
                    info!("CMD | {:?}", command);
                }
            }
            AppEvent::CommandRejected => {
                warn!("CMD | malformed payload rejected");
            }
            AppEvent::Started => {
                info!("START | outputs safe");
            }
        }
    }
}

/// Display adapter that logs the two status lines.
#[derive(Default)]
pub struct LogStatusSink {
    last: Option<(heapless::String<16>, heapless::String<16>)>,
}

impl LogStatusSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusSink for LogStatusSink {
    fn render(&mut self, line1: &str, line2: &str) {
        let unchanged = self
            .last
            .as_ref()
            .is_some_and(|(a, b)| a.as_str() == line1 && b.as_str() == line2);
        if unchanged {
            return;
        }
        info!("LCD | {:<16} | {:<16}", line1, line2);
        let mut a = heapless::String::new();
        let mut b = heapless::String::new();
        let _ = a.push_str(line1);
        let _ = b.push_str(line2);
        self.last = Some((a, b));
    }
}
