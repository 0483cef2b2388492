//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the control-plane rules of the servo daemon:
//! applying commands to the channel table and reporting what changed.
//! All interaction with pins, clocks and log output happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
