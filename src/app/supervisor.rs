//! Pub/sub connection supervisor.
//!
//! Owns the broker session's [`ConnectionState`].  Each control cycle calls
//! [`ConnectionSupervisor::ensure_connected`] exactly once; that call makes
//! at most one bounded connect-and-subscribe attempt and then returns, so
//! sensing and actuation keep running while offline.
//!
//! ```text
//!  Disconnected ──(deadline reached)──▶ Connecting ──(connect + all subs ok)──▶ Connected
//!        ▲                                   │                                     │
//!        └──────────(any step failed)────────┘◀──(liveness lost / publish failed)──┘
//! ```
//!
//! ## Backoff
//!
//! After a failed attempt the next one is deferred by the current backoff
//! delay, which then doubles up to the configured maximum.  A successful
//! connection resets it.  Losing an established session allows an
//! immediate retry on the next cycle.

use log::{info, warn};

use crate::config::{TimingConfig, TopicConfig};
use crate::error::CommsError;

use super::ports::PubSubPort;

/// Pub/sub session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

pub struct ConnectionSupervisor {
    state: ConnectionState,
    initial_backoff_ms: u64,
    max_backoff_ms: u64,
    backoff_ms: u64,
    /// Earliest uptime at which the next attempt may start.
    next_attempt_ms: u64,
    /// Consecutive failed attempts since the last success.
    attempts: u32,
}

impl ConnectionSupervisor {
    pub fn new(timing: &TimingConfig) -> Self {
        let initial = u64::from(timing.reconnect_backoff_initial_ms);
        Self {
            state: ConnectionState::Disconnected,
            initial_backoff_ms: initial,
            max_backoff_ms: u64::from(timing.reconnect_backoff_max_ms),
            backoff_ms: initial,
            next_attempt_ms: 0,
            attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Consecutive failed connection attempts since the last success.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay that will follow the next failed attempt.
    pub fn current_backoff_ms(&self) -> u64 {
        self.backoff_ms
    }

    /// Uptime before which no new attempt is made.
    pub fn next_attempt_ms(&self) -> u64 {
        self.next_attempt_ms
    }

    /// Check liveness and, if needed and allowed, make one connection attempt.
    ///
    /// Connect plus subscription to every control topic is a single unit:
    /// if any step fails the session is torn down and the state stays
    /// [`ConnectionState::Disconnected`].
    pub fn ensure_connected(
        &mut self,
        link: &mut impl PubSubPort,
        topics: &TopicConfig,
        now_ms: u64,
    ) -> ConnectionState {
        if self.state == ConnectionState::Connected {
            if link.is_alive() {
                return self.state;
            }
            warn!("MQTT: session lost, reconnecting");
            link.disconnect();
            self.state = ConnectionState::Disconnected;
            self.next_attempt_ms = now_ms;
        }

        if now_ms < self.next_attempt_ms {
            return self.state;
        }

        self.state = ConnectionState::Connecting;
        info!("MQTT: connecting (attempt {})", self.attempts + 1);

        match Self::connect_and_subscribe(link, topics) {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                self.attempts = 0;
                self.backoff_ms = self.initial_backoff_ms;
                info!("MQTT: connected, {} control topics subscribed", topics.control_topics().len());
            }
            Err(e) => {
                link.disconnect();
                self.state = ConnectionState::Disconnected;
                self.attempts = self.attempts.saturating_add(1);
                self.next_attempt_ms = now_ms.saturating_add(self.backoff_ms);
                warn!(
                    "MQTT: connect failed ({}), retry in {} ms",
                    e, self.backoff_ms
                );
                self.backoff_ms = (self.backoff_ms.saturating_mul(2)).min(self.max_backoff_ms);
            }
        }
        self.state
    }

    /// Record that an operation on the session failed.
    ///
    /// The next [`ensure_connected`](Self::ensure_connected) call retries
    /// without waiting for a backoff delay.
    pub fn mark_disconnected(&mut self, link: &mut impl PubSubPort, reason: CommsError) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        warn!("MQTT: dropping session ({})", reason);
        link.disconnect();
        self.state = ConnectionState::Disconnected;
    }

    fn connect_and_subscribe(
        link: &mut impl PubSubPort,
        topics: &TopicConfig,
    ) -> Result<(), CommsError> {
        link.connect()?;
        for topic in topics.control_topics() {
            link.subscribe(topic)?;
        }
        Ok(())
    }
}
