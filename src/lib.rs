//! piservo — software PWM servo daemon library.
//!
//! Exposes the pure-logic modules (channel model, frame scheduler, control
//! protocol, control loop) for integration testing, plus the Linux adapters
//! the `piservod` binary wires together.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod daemon;
pub mod error;
pub mod protocol;
pub mod safety;
pub mod scheduler;
pub mod servo;

pub mod adapters;
