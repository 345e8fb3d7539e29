//! Application core — domain orchestration, zero I/O.
//!
//! Ties the motion recognizer, the tag stream and the compliance engine
//! together.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
