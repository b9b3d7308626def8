//! KitchenGuard Firmware: Main Entry Point
//!
//! Hexagonal architecture with a fixed-period control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   LogStatusSink  MonotonicClock│
//! │  (Sensor+Actuator) (EventSink)    (StatusSink)                 │
//! │  MqttAdapter       HttpAdapter    WifiAdapter                  │
//! │  (PubSub+inbox)    (REST backend) (Connectivity)               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              ControlLoop (pure logic)                  │    │
//! │  │  Supervisor · Evaluator · Actuators · Telemetry        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution, config::TimerConfig};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use kitchenguard::adapters::device_id;
use kitchenguard::adapters::hardware::HardwareAdapter;
use kitchenguard::adapters::http::HttpAdapter;
use kitchenguard::adapters::log_sink::{LogEventSink, LogStatusSink};
use kitchenguard::adapters::mqtt::{MqttAdapter, MqttSettings};
use kitchenguard::adapters::time::MonotonicClock;
use kitchenguard::adapters::wifi::{ConnectivityPort, WifiAdapter};
use kitchenguard::app::service::ControlLoop;
use kitchenguard::config::SystemConfig;
use kitchenguard::drivers::alarm::AlarmOutputs;
use kitchenguard::drivers::hw_init;
use kitchenguard::drivers::servo::DoorServo;
use kitchenguard::drivers::watchdog::Watchdog;
use kitchenguard::pins;
use kitchenguard::sensors::{SensorHub, climate::Dht11, flame::FlameSensor, gas::GasSensor};

/// Apply compile-time credentials on top of the defaults.
fn load_config() -> SystemConfig {
    let mut config = SystemConfig::default();
    if let Some(ssid) = option_env!("KG_WIFI_SSID") {
        config.wifi.ssid = ssid.into();
    }
    if let Some(pass) = option_env!("KG_WIFI_PASS") {
        config.wifi.password = pass.into();
    }
    if let Some(url) = option_env!("KG_MQTT_URL") {
        config.broker.url = url.into();
    }
    if let Some(user) = option_env!("KG_MQTT_USER") {
        config.broker.username = user.into();
    }
    if let Some(pass) = option_env!("KG_MQTT_PASS") {
        config.broker.password = pass.into();
    }
    if let Some(url) = option_env!("KG_BACKEND_URL") {
        config.backend.url = url.into();
    }
    if let Some(key) = option_env!("KG_BACKEND_KEY") {
        config.backend.api_key = key.into();
    }
    config
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  KitchenGuard v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config();
    config.validate().map_err(|e| anyhow::anyhow!("invalid config: {}", e))?;

    // ── 3. Raw peripherals + watchdog ─────────────────────────
    if let Err(e) = hw_init::init_peripherals(config.thresholds.flame_sensor) {
        // Without sensors there is nothing safe to do; the watchdog resets us.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    let watchdog = Watchdog::new(config.timing.watchdog_timeout_ms);

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 4. Actuator drivers ───────────────────────────────────
    let alarm = AlarmOutputs::new(
        PinDriver::output(peripherals.pins.gpio25)?,
        PinDriver::output(peripherals.pins.gpio26)?,
    );
    let servo_timer = LedcTimerDriver::new(
        peripherals.ledc.timer0,
        &TimerConfig::default()
            .frequency(Hertz(pins::SERVO_PWM_FREQ_HZ))
            .resolution(Resolution::Bits14),
    )?;
    let door = DoorServo::new(LedcDriver::new(
        peripherals.ledc.channel0,
        servo_timer,
        peripherals.pins.gpio14,
    )?);

    // ── 5. Sensors + hardware adapter ─────────────────────────
    let sensor_hub = SensorHub::new(
        GasSensor::new(pins::GAS_ADC_CHANNEL),
        FlameSensor::new(config.thresholds.flame_sensor, pins::FLAME_GPIO, pins::FLAME_ADC_CHANNEL),
        Dht11::new(pins::DHT_GPIO),
    );
    let mut hw = HardwareAdapter::new(sensor_hub, alarm, door);

    let clock = MonotonicClock::new();

    // ── 6. Network ────────────────────────────────────────────
    let mut wifi = WifiAdapter::new(EspWifi::new(peripherals.modem, sysloop, Some(nvs))?);
    if let Err(e) = wifi.set_credentials(&config.wifi.ssid, &config.wifi.password) {
        warn!("WiFi: credentials rejected ({}), running offline", e);
    } else if let Err(e) = wifi.connect(clock.uptime_ms()) {
        warn!("WiFi: initial connect failed ({}), will retry", e);
    }

    let mac = device_id::read_mac();
    let dev_id = device_id::device_id(&mac);
    info!("Device ID: {}", dev_id);

    let mut mqtt =
        MqttAdapter::new(MqttSettings::from_config(&config.broker, &config.timing, &dev_id));
    let mut http = HttpAdapter::new(&config.backend, &config.timing);

    let mut log_sink = LogEventSink::new();
    let mut display = LogStatusSink::new();

    // ── 7. Control loop ───────────────────────────────────────
    let period_ms = u64::from(config.timing.control_period_ms);
    let poll_ms = config.timing.command_poll_ms;
    let mut app = ControlLoop::new(config);
    app.start(&mut hw, &mut display, &mut log_sink);

    info!("System ready. Entering control loop.");

    loop {
        let cycle_start = clock.uptime_ms();
        wifi.poll(cycle_start);

        app.run_cycle(cycle_start, &mut hw, &mut display, &mut mqtt, &mut http, &mut log_sink);
        watchdog.feed();

        // Service remote commands until the next cycle is due.
        while clock.uptime_ms().saturating_sub(cycle_start) < period_ms {
            app.service_commands(&mut hw, &mut mqtt, &mut log_sink);
            watchdog.feed();
            esp_idf_hal::delay::FreeRtos::delay_ms(poll_ms);
        }
    }
}
