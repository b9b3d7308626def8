//! REST telemetry backend adapter.
//!
//! Implements [`HttpPort`]: one JSON POST per cycle to the configured
//! endpoint, authenticated with the project API key sent both as `apikey`
//! and as a bearer token.  The whole request is bounded by
//! `http_timeout_ms`.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` driven through the
//!   `embedded-svc` blocking client.
//! - **all other targets**: records requests and returns an injectable
//!   status code.

use log::debug;

use crate::app::ports::HttpPort;
use crate::config::{BackendConfig, TimingConfig};
use crate::error::CommsError;

use super::wifi;

#[cfg(target_os = "espidf")]
use embedded_svc::http::client::Client;
#[cfg(target_os = "espidf")]
use embedded_svc::io::Write;
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};

/// Body encoding header; the backend rejects anything else.
pub const CONTENT_TYPE: (&str, &str) = ("Content-Type", "application/json");

pub struct HttpAdapter {
    url: String,
    api_key: String,
    bearer: String,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    timeout_ms: u32,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBackend,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
struct SimBackend {
    status: Result<u16, CommsError>,
    requests: Vec<Vec<u8>>,
}

impl HttpAdapter {
    pub fn new(backend: &BackendConfig, timing: &TimingConfig) -> Self {
        Self {
            url: backend.url.clone(),
            api_key: backend.api_key.clone(),
            bearer: format!("Bearer {}", backend.api_key),
            timeout_ms: timing.http_timeout_ms,
            #[cfg(not(target_os = "espidf"))]
            sim: SimBackend { status: Ok(201), requests: Vec::new() },
        }
    }

    /// Request headers in send order.
    pub fn headers<'a>(&'a self, content_length: &'a str) -> [(&'a str, &'a str); 4] {
        [
            CONTENT_TYPE,
            ("apikey", self.api_key.as_str()),
            ("Authorization", self.bearer.as_str()),
            ("Content-Length", content_length),
        ]
    }

    #[cfg(target_os = "espidf")]
    fn platform_post(&mut self, body: &[u8]) -> Result<u16, CommsError> {
        use core::time::Duration;

        let conn = EspHttpConnection::new(&HttpConfiguration {
            timeout: Some(Duration::from_millis(u64::from(self.timeout_ms))),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(|_| CommsError::Io)?;
        let mut client = Client::wrap(conn);

        let len = body.len().to_string();
        let headers = self.headers(&len);
        let mut req = client.post(&self.url, &headers).map_err(|_| CommsError::Io)?;
        req.write_all(body).map_err(|_| CommsError::Io)?;
        req.flush().map_err(|_| CommsError::Io)?;
        let resp = req.submit().map_err(|_| CommsError::Timeout)?;
        Ok(resp.status())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_post(&mut self, body: &[u8]) -> Result<u16, CommsError> {
        self.sim.requests.push(body.to_vec());
        self.sim.status
    }

    /// Simulation: what the next POSTs return.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_response(&mut self, status: Result<u16, CommsError>) {
        self.sim.status = status;
    }

    /// Simulation: bodies POSTed so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_requests(&self) -> &[Vec<u8>] {
        &self.sim.requests
    }
}

impl HttpPort for HttpAdapter {
    fn network_available(&self) -> bool {
        wifi::link_up()
    }

    fn post_json(&mut self, body: &[u8]) -> Result<u16, CommsError> {
        if !self.network_available() {
            return Err(CommsError::NoNetwork);
        }
        let status = self.platform_post(body)?;
        debug!("HTTP: POST {} -> {}", self.url, status);
        Ok(status)
    }
}
