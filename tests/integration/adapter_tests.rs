//! The real adapters (host simulations) wired into the control loop.
//!
//! Sensor simulations are process-wide; this is the only file in the
//! integration binary that sets them.

use super::mock_hw::{CollectSink, MockDisplay};

use embedded_hal::digital::{ErrorType as DigitalErrorType, OutputPin};
use embedded_hal::pwm::{ErrorType as PwmErrorType, SetDutyCycle};

use kitchenguard::adapters::hardware::HardwareAdapter;
use kitchenguard::adapters::http::HttpAdapter;
use kitchenguard::adapters::mqtt::{MqttAdapter, MqttSettings};
use kitchenguard::app::service::ControlLoop;
use kitchenguard::app::supervisor::ConnectionState;
use kitchenguard::app::telemetry::ChannelOutcome;
use kitchenguard::config::SystemConfig;
use kitchenguard::drivers::alarm::AlarmOutputs;
use kitchenguard::drivers::servo::DoorServo;
use kitchenguard::pins;
use kitchenguard::sensors::{SensorHub, climate, flame, gas};

#[derive(Default)]
struct Pin {
    high: bool,
}

impl DigitalErrorType for Pin {
    type Error = core::convert::Infallible;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

#[derive(Default)]
struct Pwm {
    duty: u16,
}

impl PwmErrorType for Pwm {
    type Error = core::convert::Infallible;
}

impl SetDutyCycle for Pwm {
    fn max_duty_cycle(&self) -> u16 {
        16_383
    }
    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty;
        Ok(())
    }
}

#[test]
fn simulated_board_reports_gas_danger_over_both_channels() {
    let config = SystemConfig::default();

    gas::sim_set_gas_adc(2600);
    flame::sim_set_flame_adc(4000);
    climate::sim_set_climate(Some((24.0, 45.0)));

    let hub = SensorHub::new(
        gas::GasSensor::new(pins::GAS_ADC_CHANNEL),
        flame::FlameSensor::new(
            config.thresholds.flame_sensor,
            pins::FLAME_GPIO,
            pins::FLAME_ADC_CHANNEL,
        ),
        climate::Dht11::new(pins::DHT_GPIO),
    );
    let mut hw = HardwareAdapter::new(
        hub,
        AlarmOutputs::new(Pin::default(), Pin::default()),
        DoorServo::new(Pwm::default()),
    );

    let mut mqtt =
        MqttAdapter::new(MqttSettings::from_config(&config.broker, &config.timing, "KG-TEST01"));
    let mut http = HttpAdapter::new(&config.backend, &config.timing);
    let mut display = MockDisplay::default();
    let mut sink = CollectSink::default();

    let mut app = ControlLoop::new(config);
    app.start(&mut hw, &mut display, &mut sink);
    let report = app.run_cycle(0, &mut hw, &mut display, &mut mqtt, &mut http, &mut sink);

    assert_eq!(report.connection, ConnectionState::Connected);
    assert_eq!(report.snapshot.gas_level, Some(2600));
    assert_eq!(report.snapshot.temperature_c, Some(24.0));
    assert!(report.verdict.is_danger());
    assert_eq!(report.delivery.pubsub, ChannelOutcome::Delivered);
    assert_eq!(report.delivery.http, ChannelOutcome::Delivered);

    assert_eq!(mqtt.sim_subscriptions().len(), 3);
    let (topic, body) = &mqtt.sim_published()[0];
    assert_eq!(topic, "sensors/data");
    assert_eq!(Some(body), http.sim_requests().last());

    // A command sent by the backend lands in the inbox and is confirmed.
    assert!(mqtt.sim_deliver("servo", b"45"));
    assert_eq!(app.service_commands(&mut hw, &mut mqtt, &mut sink), 1);
    assert_eq!(app.actuator_state().door_angle_degrees, 45);
    let confirm = mqtt.sim_published().iter().find(|(t, _)| t == "servo/confirm");
    assert_eq!(confirm.map(|(_, p)| p.as_slice()), Some(&b"Servo moved to 45"[..]));
}
