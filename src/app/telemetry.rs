//! Telemetry record and dual-channel publisher.
//!
//! One [`TelemetryRecord`] is built per cycle, after actuation, and sent
//! over two independent channels:
//!
//! | Channel  | Attempted when                     | On failure                      |
//! |----------|------------------------------------|---------------------------------|
//! | pub/sub  | supervisor reports `Connected`     | session dropped, retried later  |
//! | HTTP     | a network link exists              | logged, nothing else            |
//!
//! Neither outcome affects the other and neither is retried within the
//! cycle.  The next cycle simply sends fresh data.

use log::{debug, warn};
use serde::Serialize;

use crate::error::CommsError;
use crate::safety::DangerVerdict;

use super::actuators::ActuatorState;
use super::ports::{HttpPort, PubSubPort};
use super::snapshot::{FlameReading, SensorSnapshot};
use super::supervisor::ConnectionSupervisor;

/// Wire form of one cycle. Field names are part of the backend contract.
///
/// Unavailable readings serialise as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub temp: Option<f32>,
    pub hum: Option<f32>,
    pub gas: Option<u16>,
    pub flame: Option<u16>,
    pub led: u8,
    pub buzzer: u8,
    pub servo: u8,
    pub status: heapless::String<40>,
}

impl TelemetryRecord {
    pub fn from_cycle(
        snapshot: &SensorSnapshot,
        verdict: &DangerVerdict,
        actuators: ActuatorState,
    ) -> Self {
        Self {
            temp: snapshot.temperature_c,
            hum: snapshot.humidity_pct,
            gas: snapshot.gas_level,
            flame: snapshot.flame.map(FlameReading::as_telemetry),
            led: u8::from(actuators.alarm_on),
            buzzer: u8::from(actuators.buzzer_on),
            servo: actuators.door_angle_degrees,
            status: verdict.status_text(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, CommsError> {
        serde_json::to_vec(self).map_err(|_| CommsError::Encode)
    }
}

/// Result of one delivery attempt on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOutcome {
    Delivered,
    /// Preconditions not met; no attempt made.
    Skipped,
    Failed(CommsError),
}

/// Per-cycle delivery outcome for both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub pubsub: ChannelOutcome,
    pub http: ChannelOutcome,
}

pub struct TelemetryPublisher {
    topic: String,
}

impl TelemetryPublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self { topic: topic.into() }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Deliver `record` over both channels. Never fails the cycle.
    pub fn publish(
        &self,
        record: &TelemetryRecord,
        link: &mut impl PubSubPort,
        http: &mut impl HttpPort,
        supervisor: &mut ConnectionSupervisor,
    ) -> DeliveryReport {
        let body = match record.to_json() {
            Ok(b) => b,
            Err(e) => {
                warn!("Telemetry: encode failed ({})", e);
                return DeliveryReport {
                    pubsub: ChannelOutcome::Failed(e),
                    http: ChannelOutcome::Failed(e),
                };
            }
        };

        let pubsub = self.publish_pubsub(&body, link, supervisor);
        let http = Self::post_http(&body, http);
        DeliveryReport { pubsub, http }
    }

    fn publish_pubsub(
        &self,
        body: &[u8],
        link: &mut impl PubSubPort,
        supervisor: &mut ConnectionSupervisor,
    ) -> ChannelOutcome {
        if !supervisor.is_connected() {
            debug!("Telemetry: pub/sub skipped (not connected)");
            return ChannelOutcome::Skipped;
        }
        match link.publish(&self.topic, body) {
            Ok(()) => ChannelOutcome::Delivered,
            Err(e) => {
                warn!("Telemetry: publish to '{}' failed ({})", self.topic, e);
                supervisor.mark_disconnected(link, e);
                ChannelOutcome::Failed(e)
            }
        }
    }

    fn post_http(body: &[u8], http: &mut impl HttpPort) -> ChannelOutcome {
        if !http.network_available() {
            debug!("Telemetry: HTTP skipped (no network)");
            return ChannelOutcome::Skipped;
        }
        match http.post_json(body) {
            Ok(code) if (200..300).contains(&code) => {
                debug!("Telemetry: HTTP {}", code);
                ChannelOutcome::Delivered
            }
            Ok(code) => {
                warn!("Telemetry: HTTP {} from backend", code);
                ChannelOutcome::Failed(CommsError::HttpStatus(code))
            }
            Err(e) => {
                warn!("Telemetry: HTTP post failed ({})", e);
                ChannelOutcome::Failed(e)
            }
        }
    }
}
