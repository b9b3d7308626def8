//! Remote command handling.
//!
//! Messages arrive from the broker client's inbox and are handled on the
//! control thread, between cycles.  Each message is decoded once, applied
//! through the [`ActuatorController`], and acknowledged on the paired
//! confirmation topic exactly once.

use core::fmt::Write as _;

use log::{debug, info, warn};

use crate::config::{MalformedCommandPolicy, TopicConfig};

use super::actuators::{ActuatorController, ActuatorState};
use super::commands::{ControlTopic, Decoded, RemoteCommand, decode_command};
use super::ports::{ActuatorPort, InboundMessage, PubSubPort};
use super::supervisor::ConnectionSupervisor;

/// Human-readable acknowledgement for an applied command.
///
/// Reports the state the hardware actually holds afterwards: the clamped
/// angle, or the old level if the write failed.
pub fn confirmation_text(cmd: RemoteCommand, applied: ActuatorState) -> heapless::String<32> {
    let mut out = heapless::String::new();
    let _ = match cmd {
        RemoteCommand::SetAlarm(_) => {
            out.push_str(if applied.alarm_on { "LED ON" } else { "LED OFF" })
        }
        RemoteCommand::SetBuzzer(_) => {
            out.push_str(if applied.buzzer_on { "Buzzer ON" } else { "Buzzer OFF" })
        }
        RemoteCommand::SetDoorAngle(_) => {
            write!(out, "Servo moved to {}", applied.door_angle_degrees).map_err(|_| ())
        }
    };
    out
}

pub struct CommandChannel {
    topics: TopicConfig,
    policy: MalformedCommandPolicy,
}

impl CommandChannel {
    pub fn new(topics: TopicConfig, policy: MalformedCommandPolicy) -> Self {
        Self { topics, policy }
    }

    pub fn policy(&self) -> MalformedCommandPolicy {
        self.policy
    }

    /// Decode, apply, and confirm one inbound message.
    ///
    /// Returns the decode outcome so the caller can report it.  Unknown
    /// topics and rejected payloads touch nothing.
    pub fn on_message(
        &self,
        msg: &InboundMessage,
        controller: &mut ActuatorController,
        hw: &mut impl ActuatorPort,
        link: &mut impl PubSubPort,
        supervisor: &mut ConnectionSupervisor,
    ) -> Decoded {
        let decoded = decode_command(&msg.topic, &msg.payload, &self.topics, self.policy);

        let cmd = match decoded {
            Decoded::Command(cmd) => cmd,
            Decoded::Defaulted(cmd) => {
                warn!("Command: malformed payload on '{}', applying {:?}", msg.topic, cmd);
                cmd
            }
            Decoded::Rejected => {
                warn!("Command: malformed payload on '{}' dropped", msg.topic);
                return decoded;
            }
            Decoded::UnknownTopic => {
                debug!("Command: ignoring message on '{}'", msg.topic);
                return decoded;
            }
        };

        let applied = controller.apply_command(cmd, hw);
        info!("Command: {:?} applied", cmd);

        // A known topic always has a kind; UnknownTopic returned above.
        if let Some(kind) = ControlTopic::from_topic(&msg.topic, &self.topics) {
            self.confirm(kind, cmd, applied, link, supervisor);
        }
        decoded
    }

    fn confirm(
        &self,
        kind: ControlTopic,
        cmd: RemoteCommand,
        applied: ActuatorState,
        link: &mut impl PubSubPort,
        supervisor: &mut ConnectionSupervisor,
    ) {
        let text = confirmation_text(cmd, applied);
        let topic = kind.confirm_topic(&self.topics);
        if !supervisor.is_connected() {
            warn!("Command: confirmation '{}' not sent (offline)", text);
            return;
        }
        if let Err(e) = link.publish(topic, text.as_bytes()) {
            warn!("Command: confirmation to '{}' failed ({})", topic, e);
            supervisor.mark_disconnected(link, e);
        }
    }
}
