//! MQTT broker adapter.
//!
//! Implements [`PubSubPort`].  The client's event callback runs on the
//! MQTT task; it never touches domain state.  Received messages are
//! pushed into a bounded `embassy-sync` channel (the command inbox) that
//! the control thread drains between cycles.
//!
//! ```text
//! ┌──────────────┐ InboundMessage ┌───────────────┐
//! │  MQTT task   │───────────────▶│ Control loop  │
//! │  (callback)  │  CommandInbox  │ (poll_inbound)│
//! └──────────────┘                └───────────────┘
//! ```
//!
//! Every blocking wait is bounded: the connect and subscribe acks by
//! `connect_timeout_ms`, publishes by the client's network timeout
//! (`publish_timeout_ms`).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: an in-process broker simulation with failure
//!   injection for host-side tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(target_os = "espidf")]
use std::time::{Duration, Instant};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::ports::{InboundMessage, PubSubPort};
use crate::config::{BrokerConfig, TimingConfig};
use crate::error::CommsError;

#[cfg(target_os = "espidf")]
use std::sync::atomic::AtomicU32;

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

/// Inbox depth. Overflow drops the newest message.
pub const INBOX_DEPTH: usize = 8;

/// Command inbox: MQTT task → control loop.
pub type CommandInbox = Channel<CriticalSectionRawMutex, InboundMessage, INBOX_DEPTH>;

/// Push one received message into the inbox, dropping it if it does not
/// fit or the inbox is full.
fn enqueue(inbox: &CommandInbox, topic: &str, payload: &[u8]) {
    let Some(msg) = InboundMessage::new(topic, payload) else {
        warn!("MQTT: oversized message on '{}' dropped ({} bytes)", topic, payload.len());
        return;
    };
    if inbox.try_send(msg).is_err() {
        warn!("MQTT: command inbox full, message on '{}' dropped", topic);
    }
}

/// Poll `cond` every 10 ms until it holds or `timeout_ms` elapses.
#[cfg(target_os = "espidf")]
fn wait_until(timeout_ms: u32, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

// ───────────────────────────────────────────────────────────────
// Settings
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub url: String,
    pub client_id: String,
    pub username: String,
    pub password: String,
    pub connect_timeout_ms: u32,
    pub publish_timeout_ms: u32,
}

impl MqttSettings {
    pub fn from_config(broker: &BrokerConfig, timing: &TimingConfig, client_id: &str) -> Self {
        Self {
            url: broker.url.clone(),
            client_id: client_id.into(),
            username: broker.username.clone(),
            password: broker.password.clone(),
            connect_timeout_ms: timing.connect_timeout_ms,
            publish_timeout_ms: timing.publish_timeout_ms,
        }
    }

    pub fn uses_tls(&self) -> bool {
        self.url.starts_with("mqtts://")
    }
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    settings: MqttSettings,
    inbox: Arc<CommandInbox>,
    /// Set by the callback on CONNACK, cleared on disconnect.
    connected: Arc<AtomicBool>,
    /// Latched on any disconnect; a session that dropped is dead even if
    /// the client reconnects on its own, since its subscriptions are gone.
    session_lost: Arc<AtomicBool>,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    last_suback: Arc<AtomicU32>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

impl MqttAdapter {
    pub fn new(settings: MqttSettings) -> Self {
        info!(
            "MQTT: broker {} as '{}' (tls={})",
            settings.url,
            settings.client_id,
            settings.uses_tls()
        );
        Self {
            settings,
            inbox: Arc::new(CommandInbox::new()),
            connected: Arc::new(AtomicBool::new(false)),
            session_lost: Arc::new(AtomicBool::new(false)),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            last_suback: Arc::new(AtomicU32::new(0)),
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker::default(),
        }
    }

    pub fn settings(&self) -> &MqttSettings {
        &self.settings
    }

    /// Messages waiting in the inbox.
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }
}

// ── ESP-IDF client ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl MqttAdapter {
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        let s = &self.settings;
        let conf = MqttClientConfiguration {
            client_id: Some(&s.client_id),
            username: (!s.username.is_empty()).then_some(s.username.as_str()),
            password: (!s.password.is_empty()).then_some(s.password.as_str()),
            network_timeout: Duration::from_millis(u64::from(s.publish_timeout_ms)),
            keep_alive_interval: Some(Duration::from_secs(30)),
            crt_bundle_attach: if s.uses_tls() {
                Some(esp_idf_svc::sys::esp_crt_bundle_attach)
            } else {
                None
            },
            ..Default::default()
        };

        let connected = Arc::clone(&self.connected);
        let session_lost = Arc::clone(&self.session_lost);
        let inbox = Arc::clone(&self.inbox);
        let last_suback = Arc::clone(&self.last_suback);

        let client = EspMqttClient::new_cb(&s.url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => connected.store(true, Ordering::Release),
            EventPayload::Disconnected => {
                connected.store(false, Ordering::Release);
                session_lost.store(true, Ordering::Release);
            }
            EventPayload::Subscribed(id) => last_suback.store(id, Ordering::Release),
            EventPayload::Received { topic: Some(topic), data, .. } => enqueue(&inbox, topic, data),
            EventPayload::Error(e) => warn!("MQTT: client error: {:?}", e),
            _ => {}
        })
        .map_err(|e| {
            warn!("MQTT: client create failed: {}", e);
            CommsError::Io
        })?;
        self.client = Some(client);

        if wait_until(self.settings.connect_timeout_ms, || self.connected.load(Ordering::Acquire)) {
            Ok(())
        } else {
            Err(CommsError::Timeout)
        }
    }

    fn platform_subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::NotConnected)?;
        let id = client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|_| CommsError::SubscribeFailed)?;
        let acked = wait_until(self.settings.connect_timeout_ms, || {
            self.last_suback.load(Ordering::Acquire) == id
        });
        if acked { Ok(()) } else { Err(CommsError::Timeout) }
    }

    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::NotConnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|_| CommsError::PublishFailed)
    }

    fn platform_disconnect(&mut self) {
        // Dropping the client stops its task and closes the socket.
        self.client = None;
    }

    fn platform_alive(&self) -> bool {
        self.client.is_some()
    }
}

// ── Host simulation ───────────────────────────────────────────

/// In-process broker used on the host.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimBroker {
    unreachable: bool,
    fail_subscribe: bool,
    fail_publish: bool,
    subscriptions: Vec<String>,
    published: Vec<(String, Vec<u8>)>,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    fn platform_connect(&mut self) -> Result<(), CommsError> {
        if self.sim.unreachable {
            return Err(CommsError::Timeout);
        }
        self.sim.subscriptions.clear();
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    fn platform_subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        if self.sim.fail_subscribe {
            return Err(CommsError::SubscribeFailed);
        }
        self.sim.subscriptions.push(topic.into());
        Ok(())
    }

    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if self.sim.fail_publish {
            return Err(CommsError::PublishFailed);
        }
        self.sim.published.push((topic.into(), payload.to_vec()));
        Ok(())
    }

    fn platform_disconnect(&mut self) {
        self.sim.subscriptions.clear();
    }

    fn platform_alive(&self) -> bool {
        !self.sim.unreachable
    }

    /// Simulation: broker reachable or not. Going unreachable drops the session.
    pub fn sim_set_reachable(&mut self, reachable: bool) {
        self.sim.unreachable = !reachable;
        if !reachable {
            self.connected.store(false, Ordering::Release);
            self.session_lost.store(true, Ordering::Release);
        }
    }

    pub fn sim_fail_subscribe(&mut self, fail: bool) {
        self.sim.fail_subscribe = fail;
    }

    pub fn sim_fail_publish(&mut self, fail: bool) {
        self.sim.fail_publish = fail;
    }

    /// Simulation: a message arriving from the broker.  Only delivered on
    /// subscribed topics, as a real broker would.
    pub fn sim_deliver(&self, topic: &str, payload: &[u8]) -> bool {
        if !self.sim.subscriptions.iter().any(|t| t == topic) {
            return false;
        }
        enqueue(&self.inbox, topic, payload);
        true
    }

    pub fn sim_subscriptions(&self) -> &[String] {
        &self.sim.subscriptions
    }

    pub fn sim_published(&self) -> &[(String, Vec<u8>)] {
        &self.sim.published
    }
}

// ── PubSubPort ────────────────────────────────────────────────

impl PubSubPort for MqttAdapter {
    fn connect(&mut self) -> Result<(), CommsError> {
        self.disconnect();
        self.session_lost.store(false, Ordering::Release);
        let result = self.platform_connect();
        if let Err(e) = result {
            warn!("MQTT: connect to {} failed ({})", self.settings.url, e);
            self.disconnect();
        }
        result
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        if !self.is_alive() {
            return Err(CommsError::NotConnected);
        }
        self.platform_subscribe(topic)
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if !self.is_alive() {
            return Err(CommsError::NotConnected);
        }
        self.platform_publish(topic, payload)
    }

    fn is_alive(&self) -> bool {
        self.platform_alive()
            && self.connected.load(Ordering::Acquire)
            && !self.session_lost.load(Ordering::Acquire)
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.connected.store(false, Ordering::Release);
    }

    fn poll_inbound(&mut self) -> Option<InboundMessage> {
        self.inbox.try_receive().ok()
    }
}
