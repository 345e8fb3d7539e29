//! MopGuard core library.
//!
//! Cleaning-activity recognition and RFID room/mop compliance for a mop
//! frame attachment.  Everything here is hardware-agnostic; peripherals are
//! reached through the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod cache;
pub mod compliance;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fsm;
pub mod motion;
pub mod rfid;
pub mod storage;

pub use error::{Error, Result};
