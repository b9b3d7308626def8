//! Alarm LED and buzzer driver.
//!
//! Both outputs are plain active-HIGH GPIOs.  The driver is generic over
//! [`embedded_hal::digital::OutputPin`] so that it runs on an esp-idf-hal
//! `PinDriver` on target and on a recording pin in tests.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::error::ActuatorError;

pub struct AlarmOutputs<L: OutputPin, B: OutputPin> {
    led: L,
    buzzer: B,
    led_on: bool,
    buzzer_on: bool,
}

impl<L: OutputPin, B: OutputPin> AlarmOutputs<L, B> {
    /// Takes ownership of both pins and drives them LOW.
    pub fn new(led: L, buzzer: B) -> Self {
        let mut outputs = Self {
            led,
            buzzer,
            led_on: false,
            buzzer_on: false,
        };
        // Failures are logged by the setters; the controller forces the
        // safe state again at start.
        let _ = outputs.set_led(false);
        let _ = outputs.set_buzzer(false);
        outputs
    }

    pub fn set_led(&mut self, on: bool) -> Result<(), ActuatorError> {
        let res = if on { self.led.set_high() } else { self.led.set_low() };
        res.map_err(|e| {
            warn!("Alarm LED write failed: {:?}", e);
            ActuatorError::AlarmLed
        })?;
        self.led_on = on;
        Ok(())
    }

    pub fn set_buzzer(&mut self, on: bool) -> Result<(), ActuatorError> {
        let res = if on { self.buzzer.set_high() } else { self.buzzer.set_low() };
        res.map_err(|e| {
            warn!("Buzzer write failed: {:?}", e);
            ActuatorError::Buzzer
        })?;
        self.buzzer_on = on;
        Ok(())
    }

    pub fn is_led_on(&self) -> bool {
        self.led_on
    }

    pub fn is_buzzer_on(&self) -> bool {
        self.buzzer_on
    }
}
