//! Unified error types for the KitchenGuard firmware.
//!
//! Every subsystem error converts into the top-level [`Error`], keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be logged and stored in reports without allocation.
//!
//! None of these are fatal: sensor errors degrade a single reading to
//! "unavailable", communication errors skip one delivery.

use core::fmt;

use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// An actuator output could not be driven.
    Actuator(ActuatorError),
    /// A pub/sub or request/response operation failed.
    Comms(CommsError),
    /// Configuration is invalid.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error.
    AdcReadFailed,
    /// Single-wire sensor did not answer the start pulse.
    NoResponse,
    /// Single-wire frame checksum did not match.
    ChecksumMismatch,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::NoResponse => write!(f, "no response from sensor"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

/// An output write the driver could not complete.  The output keeps
/// whatever level it had before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO write to the alarm LED failed.
    AlarmLed,
    /// GPIO write to the buzzer failed.
    Buzzer,
    /// Duty-cycle write to the door servo failed.
    DoorServo,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlarmLed => write!(f, "alarm LED write failed"),
            Self::Buzzer => write!(f, "buzzer write failed"),
            Self::DoorServo => write!(f, "door servo write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// Operation requires a live broker session but none is present.
    NotConnected,
    /// Broker refused or did not acknowledge the session in time.
    ConnectFailed,
    /// A control-topic subscription was not acknowledged.
    SubscribeFailed,
    /// The broker client rejected an outbound message.
    PublishFailed,
    /// A bounded wait expired.
    Timeout,
    /// No network link (Wi-Fi station not associated).
    NoNetwork,
    /// Socket, TLS, or client-construction failure.
    Io,
    /// Request/response endpoint answered with a non-2xx status.
    HttpStatus(u16),
    /// Payload could not be serialised.
    Encode,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "broker not connected"),
            Self::ConnectFailed => write!(f, "broker connect failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::Timeout => write!(f, "timed out"),
            Self::NoNetwork => write!(f, "network unavailable"),
            Self::Io => write!(f, "I/O error"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::Encode => write!(f, "payload encode failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
