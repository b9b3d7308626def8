//! Outbound application events.
//!
//! The [`ControlLoop`](super::service::ControlLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::safety::CauseSet;

use super::commands::RemoteCommand;
use super::supervisor::ConnectionState;
use super::telemetry::DeliveryReport;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The control loop has started (outputs forced safe).
    Started,

    /// A cycle's verdict went from safe to danger, or the cause set changed.
    DangerRaised(CauseSet),

    /// A cycle's verdict went from danger to safe.
    DangerCleared,

    /// The broker session changed state.
    ConnectionChanged {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// A remote command was applied to the actuators.
    CommandApplied {
        command: RemoteCommand,
        /// `true` when a malformed payload was mapped to the off branch.
        defaulted: bool,
    },

    /// A malformed remote command was dropped by policy.
    CommandRejected,

    /// Per-cycle telemetry delivery outcome.
    Telemetry(DeliveryReport),
}
