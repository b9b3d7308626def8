//! Sensor snapshot: one atomic set of readings taken for a single
//! evaluation.
//!
//! Every reading that failed this cycle is `None`, never a sentinel number
//! or a value carried over from an earlier cycle.  Consumers must match on
//! the option; there is no "0 means broken".

/// Flame sensor reading, tagged with the mode it was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlameReading {
    /// Raw ADC counts (0 – 4095). Lower = more IR = more flame.
    Analog(u16),
    /// Digital output level. `true` = HIGH = flame detected.
    Digital(bool),
}

impl FlameReading {
    /// Integer form used in telemetry (`flame` field).
    pub fn as_telemetry(self) -> u16 {
        match self {
            Self::Analog(raw) => raw,
            Self::Digital(high) => u16::from(high),
        }
    }
}

/// A point-in-time snapshot of every sensor in the system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSnapshot {
    /// Raw MQ-2 ADC counts (0 – 4095), `None` when the ADC read failed.
    pub gas_level: Option<u16>,
    /// `None` when the flame sensor could not be read this cycle.
    pub flame: Option<FlameReading>,
    /// Air temperature (°C), `None` when the sensor failed this cycle.
    pub temperature_c: Option<f32>,
    /// Relative humidity (%), `None` when the sensor failed this cycle.
    pub humidity_pct: Option<f32>,
    /// Monotonic milliseconds since boot at acquisition.
    pub timestamp_ms: u64,
}

/// Filter a raw floating-point sensor value into a reading.
///
/// NaN, infinities, and values outside `[min, max]` are unavailable.
pub fn plausible(value: f32, min: f32, max: f32) -> Option<f32> {
    (value.is_finite() && value >= min && value <= max).then_some(value)
}
