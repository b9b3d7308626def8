//! Actuator drivers, hardware initialisation, and the task watchdog.

pub mod alarm;
pub mod hw_init;
pub mod servo;
pub mod watchdog;
