//! Door servo driver.
//!
//! A hobby servo on a 50 Hz PWM channel.  The pulse width maps linearly
//! from `SERVO_MIN_PULSE_US` at 0° to `SERVO_MAX_PULSE_US` at 180°.
//! Generic over [`embedded_hal::pwm::SetDutyCycle`]; on target this is an
//! esp-idf-hal `LedcDriver`.

use embedded_hal::pwm::SetDutyCycle;
use log::{debug, warn};

use crate::error::ActuatorError;
use crate::pins::{SERVO_MAX_PULSE_US, SERVO_MIN_PULSE_US, SERVO_PWM_FREQ_HZ};

const MAX_ANGLE: u8 = 180;

/// Pulse width for `degrees` (clamped to 0–180).
pub fn pulse_us(degrees: u8) -> u32 {
    let d = u32::from(degrees.min(MAX_ANGLE));
    SERVO_MIN_PULSE_US + (SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US) * d / u32::from(MAX_ANGLE)
}

/// Duty counts for a pulse, given the channel's full-scale duty.
pub fn duty_for_pulse(pulse_us: u32, max_duty: u16) -> u16 {
    let period_us = 1_000_000 / SERVO_PWM_FREQ_HZ;
    (u32::from(max_duty) * pulse_us / period_us) as u16
}

pub struct DoorServo<P: SetDutyCycle> {
    pwm: P,
    angle: u8,
}

impl<P: SetDutyCycle> DoorServo<P> {
    /// Takes ownership of the PWM channel and moves to 0° (door closed).
    pub fn new(pwm: P) -> Self {
        let mut servo = Self { pwm, angle: 0 };
        // Logged by set_angle; the controller forces the safe state at start.
        let _ = servo.set_angle(0);
        servo
    }

    pub fn set_angle(&mut self, degrees: u8) -> Result<(), ActuatorError> {
        let degrees = degrees.min(MAX_ANGLE);
        let pulse = pulse_us(degrees);
        let duty = duty_for_pulse(pulse, self.pwm.max_duty_cycle());
        self.pwm.set_duty_cycle(duty).map_err(|e| {
            warn!("Servo: duty write failed: {:?}", e);
            ActuatorError::DoorServo
        })?;
        self.angle = degrees;
        debug!("Servo: {}° ({} µs, duty {})", degrees, pulse, duty);
        Ok(())
    }

    pub fn angle(&self) -> u8 {
        self.angle
    }
}
