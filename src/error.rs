//! Unified error types for the mopguard core.
//!
//! Only the administrative paths (provisioning, config persistence, bring-up)
//! return errors.  The periodic paths (recognizer tick, tag handling) never
//! do: their faults are absorbed into [`Diagnostics`](crate::diagnostics::Diagnostics)
//! counters so a single bad read cannot stall the control loop.
//! All variants are `Copy` so they can be passed around without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, FlashError};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The flash backend rejected a read or write.
    Flash(FlashError),
    /// A record store operation was refused.
    Database(DbError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flash(e) => write!(f, "flash: {e}"),
            Self::Database(e) => write!(f, "database: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl From<FlashError> for Error {
    fn from(e: FlashError) -> Self {
        Self::Flash(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::StorageFull => Self::Config("storage full"),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Record store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbError {
    /// The target region has no erased slot left.
    RegionFull,
    /// The new key does not sort after the last stored key.
    OutOfOrder,
    /// An index read past the known record count.
    IndexOutOfRange,
    /// A slot decoded to an unknown entity type or an erased record.
    Malformed,
    /// The flash device ends before the last record region.
    FlashTooSmall,
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegionFull => write!(f, "region full"),
            Self::OutOfOrder => write!(f, "key out of order"),
            Self::IndexOutOfRange => write!(f, "index out of range"),
            Self::Malformed => write!(f, "malformed record"),
            Self::FlashTooSmall => write!(f, "flash smaller than record layout"),
        }
    }
}

impl From<DbError> for Error {
    fn from(e: DbError) -> Self {
        Self::Database(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
