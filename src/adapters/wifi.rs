//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`]: the network link underneath both
//! telemetry channels.  The adapter never blocks: `connect()` only starts
//! association and `poll()` advances the state machine once per cycle.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Reconnection policy
//!
//! On disconnect the adapter waits an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s) before retrying.

use core::fmt;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

pub trait ConnectivityPort {
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    fn poll(&mut self, now_ms: u64);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn rssi(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Link query
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_AP_REACHABLE: AtomicBool = AtomicBool::new(true);

/// Simulation: make the access point reachable or not.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_ap_reachable(reachable: bool) {
    SIM_AP_REACHABLE.store(reachable, Ordering::Relaxed);
}

/// Whether the station is currently associated with an AP.
///
/// Queried directly from the driver so that other adapters can check the
/// link without holding the [`WifiAdapter`].
#[cfg(target_os = "espidf")]
pub fn link_up() -> bool {
    let mut ap = esp_idf_svc::sys::wifi_ap_record_t::default();
    // SAFETY: fills `ap` on success; no other side effects.
    (unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap) }) == esp_idf_svc::sys::ESP_OK
}

#[cfg(not(target_os = "espidf"))]
pub fn link_up() -> bool {
    SIM_AP_REACHABLE.load(Ordering::Relaxed)
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting { since_ms: u64 },
    Connected,
    Reconnecting { attempt: u32, retry_at_ms: u64 },
}

const INITIAL_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;
/// How long association may take before it counts as failed.
const ASSOCIATION_TIMEOUT_MS: u64 = 15_000;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_secs: u32,
    last_rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_secs: INITIAL_BACKOFF_SECS,
            last_rssi: None,
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_secs: INITIAL_BACKOFF_SECS,
            last_rssi: None,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    fn schedule_retry(&mut self, attempt: u32, now_ms: u64) {
        let retry_at_ms = now_ms + u64::from(self.backoff_secs) * 1000;
        info!("WiFi: retry {} in {}s", attempt + 1, self.backoff_secs);
        self.state = WifiState::Reconnecting { attempt, retry_at_ms };
        self.backoff_secs = (self.backoff_secs * 2).min(MAX_BACKOFF_SECS);
        self.last_rssi = None;
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let cfg = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&cfg)
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| ConnectivityError::ConnectionFailed)?;
        }
        // Starts association only; completion is observed in poll().
        self.wifi.connect().map_err(|_| ConnectivityError::ConnectionFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        info!("WiFi(sim): associating with '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        let _ = self.wifi.disconnect();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_associated(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
            && self.wifi.sta_netif().is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_associated(&self) -> bool {
        link_up()
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        let mut ap = esp_idf_svc::sys::wifi_ap_record_t::default();
        // SAFETY: fills `ap` on success; no other side effects.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap) };
        (ret == esp_idf_svc::sys::ESP_OK).then_some(ap.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        link_up().then_some(-60)
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connecting { since_ms: now_ms };
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: connect failed: {}", e);
                self.schedule_retry(0, now_ms);
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.last_rssi = None;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_associated()
    }

    fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Connecting { since_ms } => {
                if self.platform_is_associated() {
                    self.state = WifiState::Connected;
                    self.backoff_secs = INITIAL_BACKOFF_SECS;
                    self.last_rssi = self.platform_rssi();
                    info!("WiFi: connected (RSSI={:?})", self.last_rssi);
                } else if now_ms.saturating_sub(since_ms) > ASSOCIATION_TIMEOUT_MS {
                    warn!("WiFi: association timed out");
                    self.platform_disconnect();
                    self.schedule_retry(0, now_ms);
                }
            }
            WifiState::Connected => {
                if self.platform_is_associated() {
                    self.last_rssi = self.platform_rssi();
                } else {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.schedule_retry(0, now_ms);
                }
            }
            WifiState::Reconnecting { attempt, retry_at_ms } if now_ms >= retry_at_ms => {
                info!("WiFi: reconnect attempt {}", attempt + 1);
                match self.platform_connect() {
                    Ok(()) => self.state = WifiState::Connecting { since_ms: now_ms },
                    Err(_) => self.schedule_retry(attempt + 1, now_ms),
                }
            }
            _ => {}
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
