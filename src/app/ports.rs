//! Port traits — the hexagonal boundary between the core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (flash, event sinks, notification renderer, config
//! storage) implement these traits.  The [`AppService`](super::service::AppService)
//! and the components it owns consume them via generics, so the domain core
//! never touches a peripheral directly.
//!
//! ## Persistence notes
//!
//! - **FlashPort** addresses are absolute byte offsets into the external
//!   flash device.  The region layout in [`crate::storage::layout`] is a
//!   binary-compatibility contract between writer and reader builds.
//! - **ConfigPort** implementations MUST validate before persisting.

use crate::config::SystemConfig;

use super::events::{AppEvent, NotifyCode};

// ───────────────────────────────────────────────────────────────
// Flash port (driven adapter: domain ↔ external NOR flash)
// ───────────────────────────────────────────────────────────────

/// Byte value of an erased flash cell.
pub const ERASED_BYTE: u8 = 0xFF;

/// Random-access storage for the record regions.
///
/// Reads may incur bounded I/O latency; they are only issued from
/// non-time-critical contexts.
pub trait FlashPort {
    /// Fill `buf` with the bytes starting at `addr`.
    fn read(&self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Program `data` at `addr`.  The target cells are expected to be erased.
    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError>;

    /// Reset `len` bytes starting at `addr` to [`ERASED_BYTE`].
    fn erase(&mut self, addr: u32, len: u32) -> Result<(), FlashError>;

    /// Total addressable size in bytes.
    fn capacity(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → outbound queue / log)
// ───────────────────────────────────────────────────────────────

/// The domain emits timestamped [`AppEvent`]s through this port.  Adapters
/// decide where they go (serial log, outbound serializer queue, etc.).
pub trait EventSink {
    /// `at_tick` is the recognizer tick at which the event was raised.
    fn emit(&mut self, at_tick: u64, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Notification port (driven adapter: domain → LED/buzzer renderer)
// ───────────────────────────────────────────────────────────────

/// Receives notification intents.  Rendering (LED pattern, buzzer) happens
/// on the other side of this boundary.
pub trait NotifySink {
    fn notify(&mut self, code: NotifyCode);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Invalid ranges must be rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`FlashPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// The access extends past the end of the device.
    OutOfBounds,
    /// The device did not complete the operation.
    IoError,
    /// A program operation targeted cells that were not erased.
    NotErased,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// The config region cannot hold the encoded blob.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for FlashError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "address out of bounds"),
            Self::IoError => write!(f, "I/O error"),
            Self::NotErased => write!(f, "write to non-erased cells"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<FlashError> for ConfigError {
    fn from(_: FlashError) -> Self {
        Self::IoError
    }
}
