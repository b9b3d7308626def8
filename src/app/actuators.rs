//! Actuator controller: the single mutation point for alarm, buzzer, and
//! door state.
//!
//! Two writers exist: the per-cycle verdict and remote overrides.  Both go
//! through [`ActuatorController`], which only issues a port call when an
//! output actually changes.  A manual override lasts until the next
//! verdict is applied.
//!
//! The recorded state only ever holds what the hardware accepted.  A
//! failed write leaves the field at its old value, so the next verdict
//! sees a difference and writes again.

use log::{debug, info, warn};

use crate::safety::DangerVerdict;

use super::commands::RemoteCommand;
use super::ports::ActuatorPort;

/// Door angle commanded while danger is active.
pub const DOOR_OPEN_DEGREES: u8 = 180;
/// Door angle commanded while safe.
pub const DOOR_CLOSED_DEGREES: u8 = 0;

/// Consistent copy of every actuator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorState {
    pub alarm_on: bool,
    pub buzzer_on: bool,
    /// Always within 0–180.
    pub door_angle_degrees: u8,
}

impl ActuatorState {
    /// Target state for a verdict.
    pub fn for_verdict(verdict: &DangerVerdict) -> Self {
        let danger = verdict.is_danger();
        Self {
            alarm_on: danger,
            buzzer_on: danger,
            door_angle_degrees: if danger { DOOR_OPEN_DEGREES } else { DOOR_CLOSED_DEGREES },
        }
    }
}

/// Clamp a commanded angle into the servo's 0–180 range.
pub fn clamp_angle(angle: i32) -> u8 {
    // Clamped to 0..=180, so the cast cannot truncate.
    angle.clamp(0, i32::from(DOOR_OPEN_DEGREES)) as u8
}

/// Owns [`ActuatorState`] and mirrors it onto an [`ActuatorPort`].
#[derive(Debug, Default)]
pub struct ActuatorController {
    state: ActuatorState,
}

impl ActuatorController {
    /// Starts with all outputs off and the door closed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current outputs, by value.
    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// Drive every output to the safe state regardless of what is cached.
    ///
    /// Used at boot, when the physical outputs are in an unknown state.  An
    /// output whose write fails is recorded as still active, so the first
    /// safe verdict writes it again.
    pub fn force_safe_outputs(&mut self, hw: &mut impl ActuatorPort) -> ActuatorState {
        self.state = ActuatorState {
            alarm_on: hw.set_alarm_led(false).is_err(),
            buzzer_on: hw.set_buzzer(false).is_err(),
            door_angle_degrees: match hw.set_door_angle(DOOR_CLOSED_DEGREES) {
                Ok(()) => DOOR_CLOSED_DEGREES,
                Err(_) => DOOR_OPEN_DEGREES,
            },
        };
        if self.state == ActuatorState::default() {
            info!("Actuators: forced safe (alarm off, door closed)");
        } else {
            warn!("Actuators: safe state not fully reached: {:?}", self.state);
        }
        self.state
    }

    /// Apply one cycle's verdict. Idempotent.
    pub fn apply_verdict(
        &mut self,
        verdict: &DangerVerdict,
        hw: &mut impl ActuatorPort,
    ) -> ActuatorState {
        self.transition_to(ActuatorState::for_verdict(verdict), hw);
        self.state
    }

    /// Apply a remote override. Angles are clamped to 0–180.
    pub fn apply_command(
        &mut self,
        cmd: RemoteCommand,
        hw: &mut impl ActuatorPort,
    ) -> ActuatorState {
        let mut target = self.state;
        match cmd {
            RemoteCommand::SetAlarm(on) => target.alarm_on = on,
            RemoteCommand::SetBuzzer(on) => target.buzzer_on = on,
            RemoteCommand::SetDoorAngle(angle) => target.door_angle_degrees = clamp_angle(angle),
        }
        self.transition_to(target, hw);
        self.state
    }

    fn transition_to(&mut self, target: ActuatorState, hw: &mut impl ActuatorPort) {
        let before = self.state;
        if target.alarm_on != self.state.alarm_on && hw.set_alarm_led(target.alarm_on).is_ok() {
            self.state.alarm_on = target.alarm_on;
        }
        if target.buzzer_on != self.state.buzzer_on && hw.set_buzzer(target.buzzer_on).is_ok() {
            self.state.buzzer_on = target.buzzer_on;
        }
        if target.door_angle_degrees != self.state.door_angle_degrees
            && hw.set_door_angle(target.door_angle_degrees).is_ok()
        {
            self.state.door_angle_degrees = target.door_angle_degrees;
        }

        if self.state != before {
            debug!("Actuators: {:?} -> {:?}", before, self.state);
        }
        if self.state != target {
            warn!("Actuators: wanted {:?}, hardware holds {:?}", target, self.state);
        }
    }
}
