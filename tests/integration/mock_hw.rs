//! Mock adapters for integration tests.
//!
//! Every port call is recorded so tests can assert on the full history
//! without touching real GPIO, sockets, or the REST backend.  Mocks can
//! share a [`Trace`] to check the order of calls across ports.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use kitchenguard::app::events::AppEvent;
use kitchenguard::app::ports::{
    ActuatorPort, EventSink, HttpPort, InboundMessage, PubSubPort, SensorPort, StatusSink,
};
use kitchenguard::app::snapshot::{FlameReading, SensorSnapshot};
use kitchenguard::error::{ActuatorError, CommsError};

// ── Cross-port call trace ─────────────────────────────────────

pub type Trace = Rc<RefCell<Vec<&'static str>>>;

pub fn new_trace() -> Trace {
    Rc::new(RefCell::new(Vec::new()))
}

fn record(trace: &Option<Trace>, step: &'static str) {
    if let Some(t) = trace {
        t.borrow_mut().push(step);
    }
}

// ── Snapshots ─────────────────────────────────────────────────

/// A snapshot well below every default threshold.
pub fn safe_snapshot() -> SensorSnapshot {
    SensorSnapshot {
        gas_level: Some(100),
        flame: Some(FlameReading::Analog(4000)),
        temperature_c: Some(25.0),
        humidity_pct: Some(40.0),
        timestamp_ms: 0,
    }
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    AlarmLed(bool),
    Buzzer(bool),
    DoorAngle(u8),
}

pub struct MockHardware {
    pub snapshot: SensorSnapshot,
    pub calls: Vec<ActuatorCall>,
    pub reads: usize,
    /// While set, door servo writes are recorded but fail.
    pub servo_jammed: bool,
    pub trace: Option<Trace>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            snapshot: safe_snapshot(),
            calls: Vec::new(),
            reads: 0,
            servo_jammed: false,
            trace: None,
        }
    }

    pub fn traced(trace: &Trace) -> Self {
        Self { trace: Some(trace.clone()), ..Self::new() }
    }

    pub fn last_door_angle(&self) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::DoorAngle(a) => Some(*a),
            _ => None,
        })
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_all(&mut self, timestamp_ms: u64) -> SensorSnapshot {
        record(&self.trace, "read");
        self.reads += 1;
        SensorSnapshot { timestamp_ms, ..self.snapshot }
    }
}

impl ActuatorPort for MockHardware {
    fn set_alarm_led(&mut self, on: bool) -> Result<(), ActuatorError> {
        record(&self.trace, "actuate");
        self.calls.push(ActuatorCall::AlarmLed(on));
        Ok(())
    }

    fn set_buzzer(&mut self, on: bool) -> Result<(), ActuatorError> {
        record(&self.trace, "actuate");
        self.calls.push(ActuatorCall::Buzzer(on));
        Ok(())
    }

    fn set_door_angle(&mut self, degrees: u8) -> Result<(), ActuatorError> {
        record(&self.trace, "actuate");
        self.calls.push(ActuatorCall::DoorAngle(degrees));
        if self.servo_jammed {
            return Err(ActuatorError::DoorServo);
        }
        Ok(())
    }
}

// ── Display ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockDisplay {
    pub frames: Vec<(String, String)>,
    pub trace: Option<Trace>,
}

impl MockDisplay {
    pub fn traced(trace: &Trace) -> Self {
        Self { frames: Vec::new(), trace: Some(trace.clone()) }
    }
}

impl StatusSink for MockDisplay {
    fn render(&mut self, line1: &str, line2: &str) {
        record(&self.trace, "render");
        self.frames.push((line1.to_string(), line2.to_string()));
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct CollectSink {
    pub events: Vec<AppEvent>,
}

impl CollectSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for CollectSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Pub/sub link ──────────────────────────────────────────────

pub struct MockLink {
    pub reachable: bool,
    pub alive: bool,
    pub fail_subscribe_on: Option<String>,
    pub fail_publish: bool,
    pub connects: usize,
    pub disconnects: usize,
    pub subscriptions: Vec<String>,
    pub published: Vec<(String, Vec<u8>)>,
    pub inbox: VecDeque<InboundMessage>,
    pub trace: Option<Trace>,
}

impl MockLink {
    /// A broker that accepts everything.
    pub fn online() -> Self {
        Self {
            reachable: true,
            alive: false,
            fail_subscribe_on: None,
            fail_publish: false,
            connects: 0,
            disconnects: 0,
            subscriptions: Vec::new(),
            published: Vec::new(),
            inbox: VecDeque::new(),
            trace: None,
        }
    }

    /// A broker that refuses connections.
    pub fn offline() -> Self {
        Self { reachable: false, ..Self::online() }
    }

    pub fn traced(trace: &Trace) -> Self {
        Self { trace: Some(trace.clone()), ..Self::online() }
    }

    pub fn push(&mut self, topic: &str, payload: &str) {
        if let Some(msg) = InboundMessage::new(topic, payload.as_bytes()) {
            self.inbox.push_back(msg);
        }
    }

    pub fn published_on(&self, topic: &str) -> Vec<String> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

impl PubSubPort for MockLink {
    fn connect(&mut self) -> Result<(), CommsError> {
        record(&self.trace, "connect");
        self.connects += 1;
        if !self.reachable {
            return Err(CommsError::ConnectFailed);
        }
        self.alive = true;
        self.subscriptions.clear();
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        if self.fail_subscribe_on.as_deref() == Some(topic) {
            return Err(CommsError::SubscribeFailed);
        }
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        record(&self.trace, "publish");
        if !self.alive {
            return Err(CommsError::NotConnected);
        }
        if self.fail_publish {
            return Err(CommsError::PublishFailed);
        }
        self.published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.alive = false;
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.inbox.pop_front()
    }
}

// ── HTTP backend ──────────────────────────────────────────────

pub struct MockHttp {
    pub network: bool,
    pub response: Result<u16, CommsError>,
    pub bodies: Vec<Vec<u8>>,
    pub trace: Option<Trace>,
}

impl MockHttp {
    pub fn ok() -> Self {
        Self { network: true, response: Ok(201), bodies: Vec::new(), trace: None }
    }

    pub fn traced(trace: &Trace) -> Self {
        Self { trace: Some(trace.clone()), ..Self::ok() }
    }

    pub fn last_json(&self) -> serde_json::Value {
        let body = self.bodies.last().expect("no HTTP body recorded");
        serde_json::from_slice(body).expect("body is not JSON")
    }
}

impl HttpPort for MockHttp {
    fn network_available(&self) -> bool {
        self.network
    }

    fn post_json(&mut self, body: &[u8]) -> Result<u16, CommsError> {
        record(&self.trace, "post");
        self.bodies.push(body.to_vec());
        self.response
    }
}
