//! GPIO / peripheral pin assignments for the KitchenGuard board (ESP32).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Sensors: analog (ADC1)
// ---------------------------------------------------------------------------

/// MQ-2 combustible gas sensor, analog output.
pub const GAS_ADC_GPIO: i32 = 34;
/// ADC1 channel for GPIO34 on the classic ESP32.
pub const GAS_ADC_CHANNEL: u32 = 6;

/// IR flame sensor. Analog output on ADC1, or digital output (HIGH = flame)
/// depending on the fitted module.
pub const FLAME_GPIO: i32 = 35;
/// ADC1 channel for GPIO35 on the classic ESP32.
pub const FLAME_ADC_CHANNEL: u32 = 7;

// ---------------------------------------------------------------------------
// Sensors: single-wire
// ---------------------------------------------------------------------------

/// DHT11 temperature / humidity sensor data line.
pub const DHT_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Door-opening hobby servo, LEDC PWM.
pub const SERVO_GPIO: i32 = 14;
/// Alarm LED, active HIGH.
pub const ALARM_LED_GPIO: i32 = 25;
/// Active buzzer, active HIGH.
pub const BUZZER_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Hobby servo frame rate (20 ms period).
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// Pulse width for 0°.
pub const SERVO_MIN_PULSE_US: u32 = 500;
/// Pulse width for 180°.
pub const SERVO_MAX_PULSE_US: u32 = 2400;
