//! Broker connection supervision as seen through the control loop.

use super::mock_hw::{CollectSink, MockDisplay, MockHardware, MockHttp, MockLink};

use kitchenguard::app::events::AppEvent;
use kitchenguard::app::service::ControlLoop;
use kitchenguard::app::supervisor::ConnectionState;
use kitchenguard::app::telemetry::ChannelOutcome;
use kitchenguard::config::SystemConfig;
use kitchenguard::error::CommsError;

struct Rig {
    app: ControlLoop,
    hw: MockHardware,
    display: MockDisplay,
    link: MockLink,
    http: MockHttp,
    sink: CollectSink,
}

impl Rig {
    fn new(link: MockLink) -> Self {
        let mut rig = Self {
            app: ControlLoop::new(SystemConfig::default()),
            hw: MockHardware::new(),
            display: MockDisplay::default(),
            link,
            http: MockHttp::ok(),
            sink: CollectSink::default(),
        };
        rig.app.start(&mut rig.hw, &mut rig.display, &mut rig.sink);
        rig
    }

    fn cycle(&mut self, now_ms: u64) -> kitchenguard::app::service::CycleReport {
        self.app.run_cycle(
            now_ms,
            &mut self.hw,
            &mut self.display,
            &mut self.link,
            &mut self.http,
            &mut self.sink,
        )
    }
}

#[test]
fn connects_and_subscribes_all_control_topics() {
    let mut rig = Rig::new(MockLink::online());
    let report = rig.cycle(0);

    assert_eq!(report.connection, ConnectionState::Connected);
    assert_eq!(rig.link.subscriptions, vec!["led", "servo", "buzzer"]);
    assert!(rig.sink.events.contains(&AppEvent::ConnectionChanged {
        from: ConnectionState::Disconnected,
        to: ConnectionState::Connected,
    }));
}

#[test]
fn partial_subscription_leaves_state_disconnected() {
    let mut link = MockLink::online();
    link.fail_subscribe_on = Some("servo".to_string());
    let mut rig = Rig::new(link);

    let report = rig.cycle(0);

    assert_eq!(report.connection, ConnectionState::Disconnected);
    assert!(!rig.link.alive, "half-open session must be torn down");
    assert_eq!(report.delivery.pubsub, ChannelOutcome::Skipped);
}

#[test]
fn disconnected_broker_still_posts_http() {
    let mut rig = Rig::new(MockLink::offline());
    let report = rig.cycle(0);

    assert_eq!(report.delivery.pubsub, ChannelOutcome::Skipped);
    assert_eq!(report.delivery.http, ChannelOutcome::Delivered);
    assert_eq!(rig.http.bodies.len(), 1);
}

#[test]
fn http_failure_does_not_block_pubsub() {
    let mut rig = Rig::new(MockLink::online());
    rig.http.response = Err(CommsError::Timeout);

    let report = rig.cycle(0);

    assert_eq!(report.delivery.pubsub, ChannelOutcome::Delivered);
    assert_eq!(report.delivery.http, ChannelOutcome::Failed(CommsError::Timeout));
}

#[test]
fn non_2xx_is_a_soft_failure() {
    let mut rig = Rig::new(MockLink::online());
    rig.http.response = Ok(401);

    let report = rig.cycle(0);

    assert_eq!(report.delivery.http, ChannelOutcome::Failed(CommsError::HttpStatus(401)));
    assert_eq!(report.connection, ConnectionState::Connected);
}

#[test]
fn retries_respect_doubling_backoff() {
    let mut rig = Rig::new(MockLink::offline());

    rig.cycle(0);
    assert_eq!(rig.link.connects, 1);

    // Initial backoff is 5 s: the next cycle is too early.
    rig.cycle(1000);
    assert_eq!(rig.link.connects, 1);

    rig.cycle(5000);
    assert_eq!(rig.link.connects, 2);

    // Now 10 s.
    rig.cycle(14_000);
    assert_eq!(rig.link.connects, 2);
    rig.cycle(15_000);
    assert_eq!(rig.link.connects, 3);

    // Broker comes back; the next due attempt succeeds.
    rig.link.reachable = true;
    let report = rig.cycle(35_000);
    assert_eq!(report.connection, ConnectionState::Connected);
    assert_eq!(rig.link.connects, 4);
    assert_eq!(rig.app.cycle_count(), 6);
}

#[test]
fn publish_failure_drops_session_and_reconnects_next_cycle() {
    let mut rig = Rig::new(MockLink::online());
    rig.cycle(0);

    rig.link.fail_publish = true;
    let report = rig.cycle(5000);
    assert_eq!(report.delivery.pubsub, ChannelOutcome::Failed(CommsError::PublishFailed));
    assert_eq!(report.delivery.http, ChannelOutcome::Delivered);
    assert_eq!(report.connection, ConnectionState::Disconnected);

    rig.link.fail_publish = false;
    let report = rig.cycle(10_000);
    assert_eq!(report.connection, ConnectionState::Connected);
    assert_eq!(report.delivery.pubsub, ChannelOutcome::Delivered);
    assert_eq!(rig.link.connects, 2);
}

#[test]
fn lost_liveness_triggers_reconnect() {
    let mut rig = Rig::new(MockLink::online());
    rig.cycle(0);

    rig.link.alive = false;
    let report = rig.cycle(5000);

    assert_eq!(report.connection, ConnectionState::Connected);
    assert_eq!(rig.link.connects, 2);
}
