//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and the actuator drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  On non-espidf targets
//! the sensors use cfg-gated simulation stubs and the actuator pins can
//! be any `embedded-hal` implementation.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::app::snapshot::SensorSnapshot;
use crate::drivers::alarm::AlarmOutputs;
use crate::error::ActuatorError;
use crate::drivers::servo::DoorServo;
use crate::sensors::SensorHub;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<L: OutputPin, B: OutputPin, P: SetDutyCycle> {
    sensor_hub: SensorHub,
    alarm: AlarmOutputs<L, B>,
    door: DoorServo<P>,
}

impl<L: OutputPin, B: OutputPin, P: SetDutyCycle> HardwareAdapter<L, B, P> {
    pub fn new(sensor_hub: SensorHub, alarm: AlarmOutputs<L, B>, door: DoorServo<P>) -> Self {
        Self {
            sensor_hub,
            alarm,
            door,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<L: OutputPin, B: OutputPin, P: SetDutyCycle> SensorPort for HardwareAdapter<L, B, P> {
    fn read_all(&mut self, timestamp_ms: u64) -> SensorSnapshot {
        self.sensor_hub.read_all(timestamp_ms)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<L: OutputPin, B: OutputPin, P: SetDutyCycle> ActuatorPort for HardwareAdapter<L, B, P> {
    fn set_alarm_led(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.alarm.set_led(on)
    }

    fn set_buzzer(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.alarm.set_buzzer(on)
    }

    fn set_door_angle(&mut self, degrees: u8) -> Result<(), ActuatorError> {
        self.door.set_angle(degrees)
    }
}
