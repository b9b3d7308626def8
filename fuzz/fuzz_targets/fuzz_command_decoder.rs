//! Fuzz target: `decode_command` → `ActuatorController::apply_command`
//!
//! The first byte picks a control topic (or an unknown one), the rest is
//! the payload.  Checks that:
//! - No payload panics the decoder, under either malformed-command policy
//! - `Rejected` only ever appears under `Ignore`
//! - Whatever is applied, the door angle stays within 0–180
//!
//! cargo fuzz run fuzz_command_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use kitchenguard::app::actuators::ActuatorController;
use kitchenguard::app::commands::{Decoded, decode_command};
use kitchenguard::app::ports::ActuatorPort;
use kitchenguard::config::{MalformedCommandPolicy, TopicConfig};
use kitchenguard::error::ActuatorError;

struct NullHw;

impl ActuatorPort for NullHw {
    fn set_alarm_led(&mut self, _on: bool) -> Result<(), ActuatorError> {
        Ok(())
    }
    fn set_buzzer(&mut self, _on: bool) -> Result<(), ActuatorError> {
        Ok(())
    }
    fn set_door_angle(&mut self, degrees: u8) -> Result<(), ActuatorError> {
        assert!(degrees <= 180, "servo commanded past its range");
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };

    let topics = TopicConfig::default();
    let topic = match selector % 4 {
        0 => topics.alarm_control.as_str(),
        1 => topics.door_control.as_str(),
        2 => topics.buzzer_control.as_str(),
        _ => "kitchen/unknown",
    };

    let mut ctl = ActuatorController::new();
    for policy in [MalformedCommandPolicy::TreatAsOff, MalformedCommandPolicy::Ignore] {
        match decode_command(topic, payload, &topics, policy) {
            Decoded::Command(cmd) | Decoded::Defaulted(cmd) => {
                let state = ctl.apply_command(cmd, &mut NullHw);
                assert!(state.door_angle_degrees <= 180);
            }
            Decoded::Rejected => assert_eq!(policy, MalformedCommandPolicy::Ignore),
            Decoded::UnknownTopic => assert_eq!(selector % 4, 3),
        }
    }
});
