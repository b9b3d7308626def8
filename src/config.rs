//! System configuration parameters
//!
//! All tunable parameters for the KitchenGuard controller.
//! Values are supplied by the outer configuration loader; the binary
//! overrides the network credentials from compile-time environment
//! variables.

use crate::app::service::MAX_COMMANDS_PER_POLL;
use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub thresholds: DangerThresholds,
    pub timing: TimingConfig,
    pub topics: TopicConfig,
    pub broker: BrokerConfig,
    pub backend: BackendConfig,
    pub wifi: WifiConfig,
    /// How undecodable remote command payloads are interpreted.
    pub malformed_command: MalformedCommandPolicy,
}

/// Fixed danger thresholds. All comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DangerThresholds {
    /// Raw MQ-2 ADC counts (0-4095) above which gas is dangerous.
    pub gas_threshold: u16,
    /// Temperature (Celsius) above which heat is dangerous.
    pub temperature_threshold_c: f32,
    /// Which flame sensor is fitted and how its reading is judged.
    pub flame_sensor: FlameSensorKind,
}

/// Flame sensing mode. Must be chosen explicitly for the fitted module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlameSensorKind {
    /// IR module on an ADC pin. Lower reading = more flame.
    Analog { danger_below: u16 },
    /// IR module digital output. HIGH = flame.
    Digital,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Period of one sense → decide → act → report cycle.
    pub control_period_ms: u32,
    /// How often the command inbox is drained between cycles.
    pub command_poll_ms: u32,
    /// First reconnect delay after a broker failure.
    pub reconnect_backoff_initial_ms: u32,
    /// Upper bound for the doubling reconnect delay.
    pub reconnect_backoff_max_ms: u32,
    /// Upper bound on a broker connect + subscribe attempt.
    pub connect_timeout_ms: u32,
    /// Upper bound on a single pub/sub publish.
    pub publish_timeout_ms: u32,
    /// Upper bound on the REST telemetry POST.
    pub http_timeout_ms: u32,
    /// Task watchdog timeout. Must exceed the worst-case cycle.
    pub watchdog_timeout_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    pub alarm_control: String,
    pub alarm_confirm: String,
    pub door_control: String,
    pub door_confirm: String,
    pub buzzer_control: String,
    pub buzzer_confirm: String,
    pub telemetry: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// `mqtt://host:1883` or `mqtts://host:8883`.
    pub url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// REST endpoint receiving one JSON record per cycle.
    pub url: String,
    /// Sent both as `apikey` and as `Authorization: Bearer`.
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
}

/// Policy for remote command payloads that cannot be decoded
/// (non-numeric angle, unrecognised on/off token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MalformedCommandPolicy {
    /// Interpret as the "off" / 0° branch and confirm it.
    #[default]
    TreatAsOff,
    /// Drop the message; nothing is applied or confirmed.
    Ignore,
}

impl Default for DangerThresholds {
    fn default() -> Self {
        Self {
            gas_threshold: 2000,
            temperature_threshold_c: 40.0,
            flame_sensor: FlameSensorKind::Analog { danger_below: 1000 },
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            control_period_ms: 5000,
            command_poll_ms: 100,
            reconnect_backoff_initial_ms: 5000,
            reconnect_backoff_max_ms: 60_000,
            connect_timeout_ms: 4000,
            publish_timeout_ms: 2000,
            http_timeout_ms: 4000,
            watchdog_timeout_ms: 30_000,
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            alarm_control: "led".into(),
            alarm_confirm: "led/confirm".into(),
            door_control: "servo".into(),
            door_confirm: "servo/confirm".into(),
            buzzer_control: "buzzer".into(),
            buzzer_confirm: "buzzer/confirm".into(),
            telemetry: "sensors/data".into(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "mqtt://broker.hivemq.com:1883".into(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "https://example.supabase.co/rest/v1/sensors".into(),
            api_key: String::new(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            thresholds: DangerThresholds::default(),
            timing: TimingConfig::default(),
            topics: TopicConfig::default(),
            broker: BrokerConfig::default(),
            backend: BackendConfig::default(),
            wifi: WifiConfig::default(),
            malformed_command: MalformedCommandPolicy::default(),
        }
    }
}

/// Errors from [`SystemConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl TimingConfig {
    /// Longest stretch between watchdog feeds around one `run_cycle`: the
    /// last command-poll delay, the connect ack, one SUBACK per control
    /// topic, the telemetry publish and the HTTP post.
    pub fn worst_case_cycle_ms(&self) -> u64 {
        let acks = 1 + CONTROL_TOPIC_COUNT as u64;
        u64::from(self.command_poll_ms)
            + u64::from(self.connect_timeout_ms) * acks
            + u64::from(self.publish_timeout_ms)
            + u64::from(self.http_timeout_ms)
    }

    /// Longest stretch between watchdog feeds while servicing commands:
    /// the poll delay plus one confirmation publish per drained message.
    pub fn worst_case_command_poll_ms(&self) -> u64 {
        u64::from(self.command_poll_ms)
            + u64::from(self.publish_timeout_ms) * MAX_COMMANDS_PER_POLL as u64
    }

    /// The longer of the two blocking stretches the watchdog must cover.
    pub fn worst_case_blocking_ms(&self) -> u64 {
        self.worst_case_cycle_ms().max(self.worst_case_command_poll_ms())
    }
}

/// Number of subscribed control topics.
pub const CONTROL_TOPIC_COUNT: usize = 3;

impl TopicConfig {
    /// The subscribed control topics, in subscription order.
    pub fn control_topics(&self) -> [&str; CONTROL_TOPIC_COUNT] {
        [&self.alarm_control, &self.door_control, &self.buzzer_control]
    }
}

impl SystemConfig {
    /// Range-check every field. Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        if t.control_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("control_period_ms must be > 0"));
        }
        if t.command_poll_ms == 0 || t.command_poll_ms > t.control_period_ms {
            return Err(ConfigError::ValidationFailed(
                "command_poll_ms must be in 1..=control_period_ms",
            ));
        }
        if t.reconnect_backoff_initial_ms == 0 {
            return Err(ConfigError::ValidationFailed("reconnect_backoff_initial_ms must be > 0"));
        }
        if t.reconnect_backoff_max_ms < t.reconnect_backoff_initial_ms {
            return Err(ConfigError::ValidationFailed(
                "reconnect_backoff_max_ms must be >= reconnect_backoff_initial_ms",
            ));
        }
        if t.connect_timeout_ms == 0 || t.publish_timeout_ms == 0 || t.http_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("network timeouts must be > 0"));
        }
        if u64::from(t.watchdog_timeout_ms) <= t.worst_case_blocking_ms() {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed the worst-case blocking time",
            ));
        }

        if !self.thresholds.temperature_threshold_c.is_finite() {
            return Err(ConfigError::ValidationFailed("temperature_threshold_c must be finite"));
        }
        if self.thresholds.gas_threshold >= 4095 {
            return Err(ConfigError::ValidationFailed("gas_threshold must be below ADC full scale"));
        }

        let topics = &self.topics;
        let all = [
            &topics.alarm_control,
            &topics.alarm_confirm,
            &topics.door_control,
            &topics.door_confirm,
            &topics.buzzer_control,
            &topics.buzzer_confirm,
            &topics.telemetry,
        ];
        if all.iter().any(|t| t.is_empty()) {
            return Err(ConfigError::ValidationFailed("topics must not be empty"));
        }
        let controls = topics.control_topics();
        if controls[0] == controls[1] || controls[0] == controls[2] || controls[1] == controls[2] {
            return Err(ConfigError::ValidationFailed("control topics must be distinct"));
        }
        Ok(())
    }
}
