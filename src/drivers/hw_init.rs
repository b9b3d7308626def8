//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 oneshot unit and the sensor GPIO directions using
//! raw ESP-IDF sys calls. Called once from `main()` before the control
//! loop starts.  The LED, buzzer, and servo are owned by esp-idf-hal
//! drivers built in `main()` and are not touched here.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::config::FlameSensorKind;
use crate::error::SensorError;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

/// Configure every sensor input. The flame pin is set up for the fitted
/// module's mode.
#[cfg(target_os = "espidf")]
pub fn init_peripherals(flame: FlameSensorKind) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc(flame)?;
        init_gpio_inputs(flame)?;
    }
    info!("hw_init: sensor peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(flame: FlameSensorKind) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped (flame {:?})", flame);
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// control-loop ADC read path.  `init_adc()` completes before the loop
/// starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc(flame: FlameSensorKind) -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    // 12 dB attenuation: full 0–3.3 V swing of the sensor modules.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), pins::GAS_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    if let FlameSensorKind::Analog { .. } = flame {
        let ret =
            unsafe { adc_oneshot_config_channel(adc1_handle(), pins::FLAME_ADC_CHANNEL, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    info!("hw_init: ADC1 configured (CH{}=gas, flame {:?})", pins::GAS_ADC_CHANNEL, flame);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract: single-threaded control-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.clamp(0, 4095) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Result<u16, SensorError> {
    Err(SensorError::AdcReadFailed)
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs(flame: FlameSensorKind) -> Result<(), HwInitError> {
    // DHT data line idles high through the pull-up; the driver flips it to
    // open-drain output only for the start pulse.
    let mut mask = 1u64 << pins::DHT_GPIO;
    if flame == FlameSensorKind::Digital {
        mask |= 1u64 << pins::FLAME_GPIO;
    }

    let cfg = gpio_config_t {
        pin_bit_mask: mask,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    false
}
