//! ControlLoop → evaluator → actuators → telemetry, end to end.

use super::mock_hw::{
    ActuatorCall, CollectSink, MockDisplay, MockHardware, MockHttp, MockLink, new_trace,
    safe_snapshot,
};

use kitchenguard::app::events::AppEvent;
use kitchenguard::app::service::ControlLoop;
use kitchenguard::app::snapshot::FlameReading;
use kitchenguard::app::supervisor::ConnectionState;
use kitchenguard::app::telemetry::ChannelOutcome;
use kitchenguard::config::SystemConfig;
use kitchenguard::safety::DangerCause;

fn started() -> (ControlLoop, MockHardware, MockDisplay, CollectSink) {
    let mut app = ControlLoop::new(SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut display = MockDisplay::default();
    let mut sink = CollectSink::default();
    app.start(&mut hw, &mut display, &mut sink);
    (app, hw, display, sink)
}

#[test]
fn start_forces_outputs_safe_and_shows_splash() {
    let (app, hw, display, sink) = started();

    assert_eq!(
        hw.calls,
        vec![
            ActuatorCall::AlarmLed(false),
            ActuatorCall::Buzzer(false),
            ActuatorCall::DoorAngle(0),
        ]
    );
    assert_eq!(display.frames[0], ("Smart Kitchen".to_string(), "Starting...".to_string()));
    assert_eq!(sink.events, vec![AppEvent::Started]);
    assert_eq!(app.cycle_count(), 0);
}

#[test]
fn cycle_steps_run_in_fixed_order() {
    let trace = new_trace();
    let mut app = ControlLoop::new(SystemConfig::default());
    let mut hw = MockHardware::traced(&trace);
    let mut display = MockDisplay::traced(&trace);
    let mut link = MockLink::traced(&trace);
    let mut http = MockHttp::traced(&trace);
    let mut sink = CollectSink::default();
    app.start(&mut hw, &mut display, &mut sink);
    trace.borrow_mut().clear();

    hw.snapshot.gas_level = Some(2500);
    app.run_cycle(0, &mut hw, &mut display, &mut link, &mut http, &mut sink);

    let mut steps = trace.borrow().clone();
    steps.dedup();
    assert_eq!(steps, vec!["connect", "read", "actuate", "render", "publish", "post"]);
}

#[test]
fn gas_danger_scenario_end_to_end() {
    let (mut app, mut hw, mut display, mut sink) = started();
    let mut link = MockLink::online();
    let mut http = MockHttp::ok();
    hw.snapshot.gas_level = Some(2500);

    let report = app.run_cycle(0, &mut hw, &mut display, &mut link, &mut http, &mut sink);

    assert!(report.verdict.is_danger());
    assert!(report.verdict.causes().contains(DangerCause::Gas));
    assert_eq!(report.verdict.causes().iter().count(), 1);

    assert!(report.actuators.alarm_on);
    assert!(report.actuators.buzzer_on);
    assert_eq!(report.actuators.door_angle_degrees, 180);
    assert_eq!(hw.last_door_angle(), Some(180));

    let json = http.last_json();
    let status = json["status"].as_str().unwrap_or_default();
    assert!(status.contains("Gas"), "status was {status:?}");
    assert!(!status.contains("All Safe"));
    assert_eq!(json["led"], 1);
    assert_eq!(json["buzzer"], 1);
    assert_eq!(json["servo"], 180);

    let (line1, _) = display.frames.last().cloned().unwrap_or_default();
    assert_eq!(line1, "DANGER! EVACUATE");
    assert_eq!(sink.count(|e| matches!(e, AppEvent::DangerRaised(_))), 1);
}

#[test]
fn all_safe_scenario_end_to_end() {
    let (mut app, mut hw, mut display, mut sink) = started();
    let mut link = MockLink::online();
    let mut http = MockHttp::ok();

    let report = app.run_cycle(0, &mut hw, &mut display, &mut link, &mut http, &mut sink);

    assert!(!report.verdict.is_danger());
    assert_eq!(http.last_json()["status"], "All Safe");
    assert_eq!(report.delivery.pubsub, ChannelOutcome::Delivered);
    assert_eq!(report.delivery.http, ChannelOutcome::Delivered);
    assert_eq!(link.published_on("sensors/data").len(), 1);
}

#[test]
fn failed_climate_read_is_null_not_zero() {
    let (mut app, mut hw, mut display, mut sink) = started();
    let mut link = MockLink::online();
    let mut http = MockHttp::ok();
    hw.snapshot.temperature_c = None;
    hw.snapshot.humidity_pct = None;

    let report = app.run_cycle(0, &mut hw, &mut display, &mut link, &mut http, &mut sink);

    assert!(!report.verdict.is_danger());
    let json = http.last_json();
    assert!(json["temp"].is_null());
    assert!(json["hum"].is_null());
    assert_eq!(json["status"], "All Safe");

    let (line1, _) = display.frames.last().cloned().unwrap_or_default();
    assert_eq!(line1, "T:--.-C H:--%");
}

#[test]
fn failed_adc_reads_are_null_not_zero() {
    let (mut app, mut hw, mut display, mut sink) = started();
    let mut link = MockLink::online();
    let mut http = MockHttp::ok();
    hw.snapshot.gas_level = None;
    hw.snapshot.flame = None;

    let report = app.run_cycle(0, &mut hw, &mut display, &mut link, &mut http, &mut sink);

    assert!(!report.verdict.is_danger());
    let json = http.last_json();
    assert!(json["gas"].is_null());
    assert!(json["flame"].is_null());
    assert_eq!(json["temp"], 25.0);

    let (_, line2) = display.frames.last().cloned().unwrap_or_default();
    assert_eq!(line2, "G:-- F:--");
}

#[test]
fn telemetry_reflects_this_cycles_actuation() {
    let (mut app, mut hw, mut display, mut sink) = started();
    let mut link = MockLink::online();
    let mut http = MockHttp::ok();

    hw.snapshot.flame = Some(FlameReading::Analog(200));
    app.run_cycle(0, &mut hw, &mut display, &mut link, &mut http, &mut sink);
    assert_eq!(http.last_json()["servo"], 180);

    hw.snapshot = safe_snapshot();
    app.run_cycle(5000, &mut hw, &mut display, &mut link, &mut http, &mut sink);
    let json = http.last_json();
    assert_eq!(json["servo"], 0);
    assert_eq!(json["led"], 0);
    assert_eq!(json["status"], "All Safe");
    assert_eq!(sink.count(|e| *e == AppEvent::DangerCleared), 1);
}

#[test]
fn jammed_servo_is_reported_as_closed_and_retried() {
    let (mut app, mut hw, mut display, mut sink) = started();
    let mut link = MockLink::online();
    let mut http = MockHttp::ok();
    hw.snapshot.gas_level = Some(2500);
    hw.servo_jammed = true;

    let report = app.run_cycle(0, &mut hw, &mut display, &mut link, &mut http, &mut sink);
    assert!(report.actuators.alarm_on);
    assert_eq!(report.actuators.door_angle_degrees, 0);
    assert_eq!(http.last_json()["servo"], 0);
    assert_eq!(http.last_json()["led"], 1);

    hw.servo_jammed = false;
    hw.calls.clear();
    let report = app.run_cycle(5000, &mut hw, &mut display, &mut link, &mut http, &mut sink);
    assert_eq!(report.actuators.door_angle_degrees, 180);
    assert_eq!(hw.calls, vec![ActuatorCall::DoorAngle(180)]);
    assert_eq!(http.last_json()["servo"], 180);
}

#[test]
fn steady_danger_does_not_retoggle_outputs() {
    let (mut app, mut hw, mut display, mut sink) = started();
    let mut link = MockLink::online();
    let mut http = MockHttp::ok();
    hw.snapshot.temperature_c = Some(55.0);

    app.run_cycle(0, &mut hw, &mut display, &mut link, &mut http, &mut sink);
    let after_first = hw.calls.len();
    app.run_cycle(5000, &mut hw, &mut display, &mut link, &mut http, &mut sink);
    app.run_cycle(10_000, &mut hw, &mut display, &mut link, &mut http, &mut sink);

    assert_eq!(hw.calls.len(), after_first);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::DangerRaised(_))), 1);
    assert_eq!(app.cycle_count(), 3);
}

#[test]
fn offline_cycle_still_actuates_and_renders() {
    let (mut app, mut hw, mut display, mut sink) = started();
    let mut link = MockLink::offline();
    let mut http = MockHttp::ok();
    http.network = false;
    hw.snapshot.gas_level = Some(3000);

    let report = app.run_cycle(0, &mut hw, &mut display, &mut link, &mut http, &mut sink);

    assert_eq!(report.connection, ConnectionState::Disconnected);
    assert_eq!(report.actuators.door_angle_degrees, 180);
    assert_eq!(report.delivery.pubsub, ChannelOutcome::Skipped);
    assert_eq!(report.delivery.http, ChannelOutcome::Skipped);
    assert_eq!(display.frames.len(), 2);
}
