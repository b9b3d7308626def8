//! IR flame sensor driver.
//!
//! Two module variants exist: one with an analog output (lower reading =
//! more infrared = flame) and one with a comparator output (HIGH = flame).
//! The mode comes from configuration; it is never guessed from the pin.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::app::snapshot::FlameReading;
use crate::config::FlameSensorKind;
use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
static SIM_FLAME_ADC: AtomicU16 = AtomicU16::new(4095);
#[cfg(not(target_os = "espidf"))]
static SIM_FLAME_HIGH: AtomicBool = AtomicBool::new(false);
#[cfg(not(target_os = "espidf"))]
static SIM_FLAME_FAIL: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_flame_adc(raw: u16) {
    SIM_FLAME_ADC.store(raw, Ordering::Relaxed);
}

/// Make subsequent analog reads fail with [`SensorError::AdcReadFailed`].
#[cfg(not(target_os = "espidf"))]
pub fn sim_fail_flame_adc(fail: bool) {
    SIM_FLAME_FAIL.store(fail, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_flame_digital(high: bool) {
    SIM_FLAME_HIGH.store(high, Ordering::Relaxed);
}

pub struct FlameSensor {
    kind: FlameSensorKind,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    gpio: i32,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    adc_channel: u32,
}

impl FlameSensor {
    pub fn new(kind: FlameSensorKind, gpio: i32, adc_channel: u32) -> Self {
        Self { kind, gpio, adc_channel }
    }

    pub fn kind(&self) -> FlameSensorKind {
        self.kind
    }

    pub fn read(&self) -> Result<FlameReading, SensorError> {
        match self.kind {
            FlameSensorKind::Analog { .. } => self.read_analog().map(FlameReading::Analog),
            FlameSensorKind::Digital => Ok(FlameReading::Digital(self.read_digital())),
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_analog(&self) -> Result<u16, SensorError> {
        crate::drivers::hw_init::adc1_read(self.adc_channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_analog(&self) -> Result<u16, SensorError> {
        if SIM_FLAME_FAIL.load(Ordering::Relaxed) {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(SIM_FLAME_ADC.load(Ordering::Relaxed).min(4095))
    }

    #[cfg(target_os = "espidf")]
    fn read_digital(&self) -> bool {
        crate::drivers::hw_init::gpio_read(self.gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_digital(&self) -> bool {
        SIM_FLAME_HIGH.load(Ordering::Relaxed)
    }
}
