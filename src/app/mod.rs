//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the KitchenGuard
//! controller: snapshot evaluation, actuator ownership, broker session
//! supervision, telemetry delivery, and remote commands.  All interaction
//! with hardware and the network happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod actuators;
pub mod command_channel;
pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod snapshot;
pub mod status;
pub mod supervisor;
pub mod telemetry;
