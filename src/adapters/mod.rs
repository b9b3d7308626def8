//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `hardware`     | SensorPort         | ESP32 ADC, GPIO          |
//! |                | ActuatorPort       | LED/buzzer GPIO, LEDC    |
//! | `log_sink`     | EventSink          | Serial log output        |
//! |                | StatusSink         | Serial log (LCD stand-in)|
//! | `mqtt`         | PubSubPort         | MQTT broker (TCP/TLS)    |
//! | `http`         | HttpPort           | REST telemetry backend   |
//! | `wifi`         | ConnectivityPort   | ESP-IDF WiFi STA         |
//! | `time`         | (none)             | ESP32 system timer       |
//! | `device_id`    | (none)             | eFuse MAC                |

pub mod device_id;
pub mod hardware;
pub mod http;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod wifi;
