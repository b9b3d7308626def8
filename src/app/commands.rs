//! Remote override commands.
//!
//! Each control topic carries one command kind.  Payloads are decoded once
//! into [`RemoteCommand`]; from there on nothing looks at raw bytes.
//!
//! | Topic (default) | Payload            | Command           |
//! |-----------------|--------------------|-------------------|
//! | `led`           | `ON` / `OFF`       | `SetAlarm`        |
//! | `servo`         | integer degrees    | `SetDoorAngle`    |
//! | `buzzer`        | `ON` / `OFF`       | `SetBuzzer`       |

use crate::config::{MalformedCommandPolicy, TopicConfig};

/// Commands that the remote backend can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Drive the alarm LED.
    SetAlarm(bool),
    /// Move the door servo. Clamped to 0–180 when applied.
    SetDoorAngle(i32),
    /// Drive the buzzer.
    SetBuzzer(bool),
}

/// Which control topic a message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTopic {
    Alarm,
    Door,
    Buzzer,
}

impl ControlTopic {
    /// Map a topic name to its control kind. Unknown topics map to `None`.
    pub fn from_topic(topic: &str, topics: &TopicConfig) -> Option<Self> {
        if topic == topics.alarm_control {
            Some(Self::Alarm)
        } else if topic == topics.door_control {
            Some(Self::Door)
        } else if topic == topics.buzzer_control {
            Some(Self::Buzzer)
        } else {
            None
        }
    }

    /// The paired confirmation topic.
    pub fn confirm_topic(self, topics: &TopicConfig) -> &str {
        match self {
            Self::Alarm => &topics.alarm_confirm,
            Self::Door => &topics.door_confirm,
            Self::Buzzer => &topics.buzzer_confirm,
        }
    }
}

/// Outcome of decoding one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Payload parsed cleanly.
    Command(RemoteCommand),
    /// Payload was malformed and the policy mapped it to the off/0 branch.
    Defaulted(RemoteCommand),
    /// Payload was malformed and the policy drops it.
    Rejected,
    /// Topic is not a control topic.
    UnknownTopic,
}

/// Parse an on/off token.  Only the exact tokens `ON` and `OFF` are
/// recognised; surrounding whitespace is ignored, case is not.
pub fn parse_switch(payload: &str) -> Option<bool> {
    match payload.trim() {
        "ON" => Some(true),
        "OFF" => Some(false),
        _ => None,
    }
}

/// Parse a door angle in whole degrees. No clamping here.
pub fn parse_angle(payload: &str) -> Option<i32> {
    payload.trim().parse::<i32>().ok()
}

/// Decode a payload received on `topic`.
pub fn decode_command(
    topic: &str,
    payload: &[u8],
    topics: &TopicConfig,
    policy: MalformedCommandPolicy,
) -> Decoded {
    let Some(kind) = ControlTopic::from_topic(topic, topics) else {
        return Decoded::UnknownTopic;
    };

    // Invalid UTF-8 is just another malformed payload.
    let text = core::str::from_utf8(payload).ok();

    let parsed = match kind {
        ControlTopic::Alarm => text.and_then(parse_switch).map(RemoteCommand::SetAlarm),
        ControlTopic::Door => text.and_then(parse_angle).map(RemoteCommand::SetDoorAngle),
        ControlTopic::Buzzer => text.and_then(parse_switch).map(RemoteCommand::SetBuzzer),
    };

    match (parsed, policy) {
        (Some(cmd), _) => Decoded::Command(cmd),
        (None, MalformedCommandPolicy::TreatAsOff) => Decoded::Defaulted(off_command(kind)),
        (None, MalformedCommandPolicy::Ignore) => Decoded::Rejected,
    }
}

fn off_command(kind: ControlTopic) -> RemoteCommand {
    match kind {
        ControlTopic::Alarm => RemoteCommand::SetAlarm(false),
        ControlTopic::Door => RemoteCommand::SetDoorAngle(0),
        ControlTopic::Buzzer => RemoteCommand::SetBuzzer(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> TopicConfig {
        TopicConfig::default()
    }

    #[test]
    fn switch_tokens() {
        assert_eq!(parse_switch("ON"), Some(true));
        assert_eq!(parse_switch(" ON \n"), Some(true));
        assert_eq!(parse_switch("OFF"), Some(false));
        assert_eq!(parse_switch("on"), None);
        assert_eq!(parse_switch("1"), None);
        assert_eq!(parse_switch("TRUE"), None);
        assert_eq!(parse_switch("maybe"), None);
        assert_eq!(parse_switch(""), None);
    }

    #[test]
    fn loose_on_tokens_never_switch_on() {
        let t = topics();
        let p = MalformedCommandPolicy::TreatAsOff;
        assert_eq!(
            decode_command("led", b"on", &t, p),
            Decoded::Defaulted(RemoteCommand::SetAlarm(false))
        );
        assert_eq!(
            decode_command("buzzer", b"1", &t, p),
            Decoded::Defaulted(RemoteCommand::SetBuzzer(false))
        );
        assert_eq!(
            decode_command("buzzer", b"true", &t, MalformedCommandPolicy::Ignore),
            Decoded::Rejected
        );
    }

    #[test]
    fn angle_parsing_is_strict() {
        assert_eq!(parse_angle(" 90 "), Some(90));
        assert_eq!(parse_angle("-5"), Some(-5));
        assert_eq!(parse_angle("90deg"), None);
        assert_eq!(parse_angle("open"), None);
    }

    #[test]
    fn decodes_each_control_topic() {
        let t = topics();
        let p = MalformedCommandPolicy::TreatAsOff;
        assert_eq!(
            decode_command("led", b"ON", &t, p),
            Decoded::Command(RemoteCommand::SetAlarm(true))
        );
        assert_eq!(
            decode_command("servo", b"120", &t, p),
            Decoded::Command(RemoteCommand::SetDoorAngle(120))
        );
        assert_eq!(
            decode_command("buzzer", b"OFF", &t, p),
            Decoded::Command(RemoteCommand::SetBuzzer(false))
        );
    }

    #[test]
    fn unknown_topic_is_ignored() {
        assert_eq!(
            decode_command("kitchen/alert", b"ON", &topics(), MalformedCommandPolicy::TreatAsOff),
            Decoded::UnknownTopic
        );
    }

    #[test]
    fn malformed_payload_defaults_to_off() {
        let t = topics();
        let p = MalformedCommandPolicy::TreatAsOff;
        assert_eq!(
            decode_command("servo", b"wide open", &t, p),
            Decoded::Defaulted(RemoteCommand::SetDoorAngle(0))
        );
        assert_eq!(
            decode_command("led", &[0xff, 0xfe], &t, p),
            Decoded::Defaulted(RemoteCommand::SetAlarm(false))
        );
    }

    #[test]
    fn malformed_payload_rejected_under_ignore_policy() {
        assert_eq!(
            decode_command("buzzer", b"loud", &topics(), MalformedCommandPolicy::Ignore),
            Decoded::Rejected
        );
    }

    #[test]
    fn confirm_topics_are_paired() {
        let t = topics();
        assert_eq!(ControlTopic::Alarm.confirm_topic(&t), "led/confirm");
        assert_eq!(ControlTopic::Door.confirm_topic(&t), "servo/confirm");
        assert_eq!(ControlTopic::Buzzer.confirm_topic(&t), "buzzer/confirm");
    }
}
