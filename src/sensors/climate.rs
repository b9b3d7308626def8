//! DHT11 temperature / humidity sensor driver.
//!
//! Single-wire protocol, bit-banged on one GPIO:
//!
//! ```text
//!  host:   ‾‾‾\______ 20 ms ______/‾‾ 30 µs ‾‾ (release)
//!  sensor:                                    \_ 80 µs _/‾ 80 µs ‾\ 40 × bit
//!  bit:    \_ 50 µs _/‾ 26–28 µs ‾\  = 0
//!          \_ 50 µs _/‾‾‾‾ 70 µs ‾‾‾‾\  = 1
//! ```
//!
//! Frame: humidity int, humidity dec, temperature int, temperature dec
//! (bit 7 = negative), checksum (low byte of the sum of the first four).
//!
//! A failed read never produces a number: each field is `None` when it
//! cannot be trusted.  Temperature has no upper plausibility cut-off; a
//! very hot reading is exactly what the heat check exists for.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the pin with `esp_rom_delay_us` and the
//! high-resolution timer.
//! On host/test: returns injected values from static atomics.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::app::snapshot::plausible;
use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(0x41C8_0000); // 25.0
#[cfg(not(target_os = "espidf"))]
static SIM_HUM_BITS: AtomicU32 = AtomicU32::new(0x4220_0000); // 40.0
#[cfg(not(target_os = "espidf"))]
static SIM_CLIMATE_OK: AtomicBool = AtomicBool::new(true);

/// Inject the next climate reading. `None` simulates a sensor timeout.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate(reading: Option<(f32, f32)>) {
    match reading {
        Some((t, h)) => {
            SIM_TEMP_BITS.store(t.to_bits(), Ordering::Relaxed);
            SIM_HUM_BITS.store(h.to_bits(), Ordering::Relaxed);
            SIM_CLIMATE_OK.store(true, Ordering::Relaxed);
        }
        None => SIM_CLIMATE_OK.store(false, Ordering::Relaxed),
    }
}

/// Plausible relative humidity range (%).
pub const HUMIDITY_RANGE_PCT: (f32, f32) = (0.0, 100.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
}

impl ClimateReading {
    pub const UNAVAILABLE: Self = Self { temperature_c: None, humidity_pct: None };

    /// Temperature is kept whenever it is finite; humidity is range-checked.
    pub fn from_raw(temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            temperature_c: temperature_c.is_finite().then_some(temperature_c),
            humidity_pct: plausible(humidity_pct, HUMIDITY_RANGE_PCT.0, HUMIDITY_RANGE_PCT.1),
        }
    }
}

/// Decode a 5-byte DHT11 frame.
pub fn decode_frame(frame: [u8; 5]) -> Result<ClimateReading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }
    let humidity = f32::from(frame[0]) + f32::from(frame[1]) * 0.1;
    let mut temperature = f32::from(frame[2]) + f32::from(frame[3] & 0x7F) * 0.1;
    if frame[3] & 0x80 != 0 {
        temperature = -temperature;
    }
    Ok(ClimateReading::from_raw(temperature, humidity))
}

pub struct Dht11 {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    gpio: i32,
}

impl Dht11 {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    pub fn read(&mut self) -> Result<ClimateReading, SensorError> {
        #[cfg(target_os = "espidf")]
        {
            decode_frame(self.read_frame()?)
        }

        #[cfg(not(target_os = "espidf"))]
        {
            if !SIM_CLIMATE_OK.load(Ordering::Relaxed) {
                return Err(SensorError::NoResponse);
            }
            Ok(ClimateReading::from_raw(
                f32::from_bits(SIM_TEMP_BITS.load(Ordering::Relaxed)),
                f32::from_bits(SIM_HUM_BITS.load(Ordering::Relaxed)),
            ))
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        use esp_idf_svc::sys::*;

        const START_LOW_US: u32 = 20_000;
        const RELEASE_US: u32 = 30;
        /// High phase longer than this is a `1` bit.
        const BIT_ONE_THRESHOLD_US: i64 = 40;

        let pin = self.gpio;

        // SAFETY: the DHT pin is owned by this driver and only touched from
        // the control thread.
        unsafe {
            gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD);
            gpio_set_level(pin, 0);
            esp_rom_delay_us(START_LOW_US);
            gpio_set_level(pin, 1);
            esp_rom_delay_us(RELEASE_US);
            gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT);
        }

        // Response: sensor pulls low, then high, then low before the first bit.
        wait_for_level(pin, false, 100)?;
        wait_for_level(pin, true, 100)?;
        wait_for_level(pin, false, 100)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            wait_for_level(pin, true, 80)?;
            let high_us = wait_for_level(pin, false, 100)?;
            if high_us > BIT_ONE_THRESHOLD_US {
                frame[bit / 8] |= 1 << (7 - bit % 8);
            }
        }
        Ok(frame)
    }
}

/// Spin until `pin` reads `level`; returns the microseconds waited.
#[cfg(target_os = "espidf")]
fn wait_for_level(pin: i32, level: bool, timeout_us: i64) -> Result<i64, SensorError> {
    use esp_idf_svc::sys::{esp_timer_get_time, gpio_get_level};

    // SAFETY: timer and GPIO level reads are side-effect free.
    let start = unsafe { esp_timer_get_time() };
    loop {
        let now = unsafe { esp_timer_get_time() };
        if (unsafe { gpio_get_level(pin) } != 0) == level {
            return Ok(now - start);
        }
        if now - start > timeout_us {
            return Err(SensorError::NoResponse);
        }
    }
}
