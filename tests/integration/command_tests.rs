//! Remote commands: inbox → decode → actuators → confirmation.

use super::mock_hw::{ActuatorCall, CollectSink, MockDisplay, MockHardware, MockHttp, MockLink};

use kitchenguard::app::commands::RemoteCommand;
use kitchenguard::app::events::AppEvent;
use kitchenguard::app::service::{ControlLoop, MAX_COMMANDS_PER_POLL};
use kitchenguard::config::{MalformedCommandPolicy, SystemConfig};

fn connected(config: SystemConfig) -> (ControlLoop, MockHardware, MockLink, CollectSink) {
    let mut app = ControlLoop::new(config);
    let mut hw = MockHardware::new();
    let mut display = MockDisplay::default();
    let mut link = MockLink::online();
    let mut http = MockHttp::ok();
    let mut sink = CollectSink::default();
    app.start(&mut hw, &mut display, &mut sink);
    app.run_cycle(0, &mut hw, &mut display, &mut link, &mut http, &mut sink);
    hw.calls.clear();
    sink.events.clear();
    (app, hw, link, sink)
}

#[test]
fn each_command_is_confirmed_exactly_once() {
    let (mut app, mut hw, mut link, mut sink) = connected(SystemConfig::default());
    link.push("led", "ON");
    link.push("buzzer", "ON");
    link.push("servo", "90");

    let handled = app.service_commands(&mut hw, &mut link, &mut sink);

    assert_eq!(handled, 3);
    assert_eq!(link.published_on("led/confirm"), vec!["LED ON"]);
    assert_eq!(link.published_on("buzzer/confirm"), vec!["Buzzer ON"]);
    assert_eq!(link.published_on("servo/confirm"), vec!["Servo moved to 90"]);
    assert_eq!(
        hw.calls,
        vec![ActuatorCall::AlarmLed(true), ActuatorCall::Buzzer(true), ActuatorCall::DoorAngle(90)]
    );
    assert_eq!(sink.count(|e| matches!(e, AppEvent::CommandApplied { .. })), 3);
}

#[test]
fn door_angle_is_clamped_and_confirmed_as_applied() {
    let (mut app, mut hw, mut link, mut sink) = connected(SystemConfig::default());
    link.push("servo", "200");
    link.push("servo", "-5");

    app.service_commands(&mut hw, &mut link, &mut sink);

    assert_eq!(
        link.published_on("servo/confirm"),
        vec!["Servo moved to 180", "Servo moved to 0"]
    );
    assert_eq!(app.actuator_state().door_angle_degrees, 0);
}

#[test]
fn malformed_payload_defaults_to_off_and_is_confirmed() {
    let (mut app, mut hw, mut link, mut sink) = connected(SystemConfig::default());
    link.push("led", "ON");
    link.push("led", "blink");

    app.service_commands(&mut hw, &mut link, &mut sink);

    assert_eq!(link.published_on("led/confirm"), vec!["LED ON", "LED OFF"]);
    assert!(!app.actuator_state().alarm_on);
    assert!(sink.events.contains(&AppEvent::CommandApplied {
        command: RemoteCommand::SetAlarm(false),
        defaulted: true,
    }));
}

#[test]
fn ignore_policy_drops_malformed_payload_silently() {
    let mut config = SystemConfig::default();
    config.malformed_command = MalformedCommandPolicy::Ignore;
    let (mut app, mut hw, mut link, mut sink) = connected(config);
    link.push("servo", "wide open");

    app.service_commands(&mut hw, &mut link, &mut sink);

    assert!(link.published_on("servo/confirm").is_empty());
    assert!(hw.calls.is_empty());
    assert_eq!(sink.events, vec![AppEvent::CommandRejected]);
}

#[test]
fn unknown_topic_is_ignored() {
    let (mut app, mut hw, mut link, mut sink) = connected(SystemConfig::default());
    link.push("fan", "ON");

    assert_eq!(app.service_commands(&mut hw, &mut link, &mut sink), 1);
    assert!(hw.calls.is_empty());
    assert!(sink.events.is_empty());
}

#[test]
fn next_verdict_overrides_a_stale_command() {
    let (mut app, mut hw, mut link, mut sink) = connected(SystemConfig::default());
    let mut display = MockDisplay::default();
    let mut http = MockHttp::ok();

    link.push("servo", "120");
    link.push("led", "ON");
    app.service_commands(&mut hw, &mut link, &mut sink);
    assert_eq!(app.actuator_state().door_angle_degrees, 120);

    let report = app.run_cycle(5000, &mut hw, &mut display, &mut link, &mut http, &mut sink);

    assert!(!report.verdict.is_danger());
    assert_eq!(report.actuators.door_angle_degrees, 0);
    assert!(!report.actuators.alarm_on);
    assert_eq!(http.last_json()["servo"], 0);
}

#[test]
fn offline_command_is_applied_without_confirmation() {
    let mut app = ControlLoop::new(SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut link = MockLink::offline();
    let mut sink = CollectSink::default();
    link.push("buzzer", "ON");

    app.service_commands(&mut hw, &mut link, &mut sink);

    assert!(app.actuator_state().buzzer_on);
    assert!(link.published.is_empty());
}

#[test]
fn drain_is_bounded_per_poll() {
    let (mut app, mut hw, mut link, mut sink) = connected(SystemConfig::default());
    for _ in 0..MAX_COMMANDS_PER_POLL + 3 {
        link.push("led", "ON");
    }

    assert_eq!(app.service_commands(&mut hw, &mut link, &mut sink), MAX_COMMANDS_PER_POLL);
    assert_eq!(app.service_commands(&mut hw, &mut link, &mut sink), 3);
    assert_eq!(app.service_commands(&mut hw, &mut link, &mut sink), 0);
}
