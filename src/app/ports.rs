//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, display, broker, REST backend,
//! event sinks) implement these traits.  The
//! [`ControlLoop`](super::service::ControlLoop) consumes them via generics,
//! so the domain core never touches hardware or sockets directly.
//!
//! ## Blocking contract
//!
//! Sensor and actuator calls are synchronous and fast.  Network calls
//! ([`PubSubPort`], [`HttpPort`]) may block, but every implementation MUST
//! bound each call by a timeout so a dead socket cannot stall a cycle.

use crate::error::{ActuatorError, CommsError};

use super::events::AppEvent;
use super::snapshot::SensorSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Read every sensor and return a unified snapshot stamped with
    /// `timestamp_ms`.  Individual failures become unavailable readings.
    fn read_all(&mut self, timestamp_ms: u64) -> SensorSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
///
/// Calls are only issued for outputs whose value changes.  An `Err` means
/// the output did not change, so the caller must not record it as applied.
pub trait ActuatorPort {
    /// Drive the alarm LED.
    fn set_alarm_led(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// Drive the buzzer.
    fn set_buzzer(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// Move the door servo to `degrees` (0–180, already clamped).
    fn set_door_angle(&mut self, degrees: u8) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Status sink (driven adapter: domain → local display)
// ───────────────────────────────────────────────────────────────

/// Two-line, 16-column local status display.
pub trait StatusSink {
    fn render(&mut self, line1: &str, line2: &str);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Pub/sub port (driven adapter: domain ↔ MQTT broker)
// ───────────────────────────────────────────────────────────────

/// Maximum topic length carried through the inbox.
pub const MAX_TOPIC_LEN: usize = 64;
/// Maximum command payload length carried through the inbox.
pub const MAX_PAYLOAD_LEN: usize = 64;

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<MAX_TOPIC_LEN>,
    pub payload: heapless::Vec<u8, MAX_PAYLOAD_LEN>,
}

impl InboundMessage {
    /// Build a message, rejecting oversized topics or payloads.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = heapless::String::new();
        t.push_str(topic).ok()?;
        let p = heapless::Vec::from_slice(payload).ok()?;
        Some(Self { topic: t, payload: p })
    }
}

/// Session-oriented publish/subscribe channel.
pub trait PubSubPort {
    /// Open a broker session. Bounded by the adapter's connect timeout.
    fn connect(&mut self) -> Result<(), CommsError>;

    /// Subscribe to one topic on the open session.
    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError>;

    /// Publish one message on the open session.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;

    /// Liveness of the current session as last seen by the client.
    fn is_alive(&self) -> bool;

    /// Tear down the session. Idempotent.
    fn disconnect(&mut self);

    /// Take the next received message, if any. Never blocks.
    fn poll_inbound(&mut self) -> Option<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Request/response port (driven adapter: domain → REST backend)
// ───────────────────────────────────────────────────────────────

/// One-shot JSON POST to the telemetry backend.
pub trait HttpPort {
    /// Whether an underlying network link exists right now.
    fn network_available(&self) -> bool;

    /// POST `body` as JSON; returns the HTTP status code.
    fn post_json(&mut self, body: &[u8]) -> Result<u16, CommsError>;
}
