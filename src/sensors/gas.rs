//! MQ-2 combustible gas sensor driver.
//!
//! The module's analog output is read as raw 12-bit ADC counts.  No
//! calibration is applied: the danger threshold is expressed in the same
//! raw units.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
static SIM_GAS_ADC: AtomicU16 = AtomicU16::new(300);

#[cfg(not(target_os = "espidf"))]
static SIM_GAS_FAIL: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gas_adc(raw: u16) {
    SIM_GAS_ADC.store(raw, Ordering::Relaxed);
}

/// Make subsequent reads fail with [`SensorError::AdcReadFailed`].
#[cfg(not(target_os = "espidf"))]
pub fn sim_fail_gas_adc(fail: bool) {
    SIM_GAS_FAIL.store(fail, Ordering::Relaxed);
}

pub struct GasSensor {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    adc_channel: u32,
}

impl GasSensor {
    pub fn new(adc_channel: u32) -> Self {
        Self { adc_channel }
    }

    /// Raw ADC counts, 0–4095.
    #[cfg(target_os = "espidf")]
    pub fn read(&self) -> Result<u16, SensorError> {
        crate::drivers::hw_init::adc1_read(self.adc_channel)
    }

    /// Raw ADC counts, 0–4095.
    #[cfg(not(target_os = "espidf"))]
    pub fn read(&self) -> Result<u16, SensorError> {
        if SIM_GAS_FAIL.load(Ordering::Relaxed) {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(SIM_GAS_ADC.load(Ordering::Relaxed).min(4095))
    }
}
