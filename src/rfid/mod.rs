//! RFID tag identity, stream decoder and the ISR → main-loop tag ring.

pub mod decoder;
pub mod ring;

use core::fmt;

use serde::{Deserialize, Serialize};

/// Width of a stored tag identifier (ASCII EPC digits).
pub const TAG_LEN: usize = 24;

/// Fill byte for short identifiers.
pub const TAG_PAD: u8 = b'0';

/// Fixed-width tag identifier, compared as raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagId([u8; TAG_LEN]);

impl TagId {
    pub const fn from_bytes(bytes: [u8; TAG_LEN]) -> Self {
        Self(bytes)
    }

    /// Right-align `payload` into the fixed width, left-padding with
    /// [`TAG_PAD`].  Longer payloads keep their rightmost bytes.
    pub fn right_aligned(payload: &[u8]) -> Self {
        let mut bytes = [TAG_PAD; TAG_LEN];
        let take = payload.len().min(TAG_LEN);
        bytes[TAG_LEN - take..].copy_from_slice(&payload[payload.len() - take..]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }
}

impl fmt::Debug for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagId({self})")
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() { b as char } else { '?' };
            fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}
