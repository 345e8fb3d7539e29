//! On-flash record formats (little-endian, fixed stride).
//!
//! ```text
//! RFID  (32 B): [tag 24][entity u8][rsvd u8][id u16][rsvd 4]
//! Room  (16 B): [room_id u16][colors u8][types u8][wall_tags u16][rsvd 10]
//! Mop   (16 B): [mop_id u16][color u8][type u8][size u8][sides u8][rsvd 10]
//! ```
//!
//! A slot whose bytes are all `0xFF` is erased.  Reserved bytes are written
//! as zero.

use serde::{Deserialize, Serialize};

use crate::app::ports::ERASED_BYTE;
use crate::error::DbError;
use crate::rfid::{TAG_LEN, TagId};

/// A fixed-stride record with an ordered search key.
pub trait Record: Sized {
    const STRIDE: usize;
    type Key: Ord + Copy;

    fn key(&self) -> Self::Key;

    /// Extract the key without validating the rest of the record.
    fn key_from_bytes(buf: &[u8]) -> Self::Key;

    fn encode(&self, buf: &mut [u8]);

    fn decode(buf: &[u8]) -> Result<Self, DbError>;
}

pub fn is_erased(buf: &[u8]) -> bool {
    buf.iter().all(|&b| b == ERASED_BYTE)
}

fn u16_at(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

// ───────────────────────────────────────────────────────────────
// RFID record
// ───────────────────────────────────────────────────────────────

/// What a tag is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityType {
    Wall = 1,
    RoomPosition = 2,
    Warning = 3,
    Mop = 4,
}

impl TryFrom<u8> for EntityType {
    type Error = DbError;

    fn try_from(raw: u8) -> Result<Self, DbError> {
        match raw {
            1 => Ok(Self::Wall),
            2 => Ok(Self::RoomPosition),
            3 => Ok(Self::Warning),
            4 => Ok(Self::Mop),
            _ => Err(DbError::Malformed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfidRecord {
    pub tag: TagId,
    pub entity: EntityType,
    /// Room id for Wall / RoomPosition / Warning, mop id for Mop.
    pub id: u16,
}

impl Record for RfidRecord {
    const STRIDE: usize = 32;
    type Key = TagId;

    fn key(&self) -> TagId {
        self.tag
    }

    fn key_from_bytes(buf: &[u8]) -> TagId {
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&buf[..TAG_LEN]);
        TagId::from_bytes(tag)
    }

    fn encode(&self, buf: &mut [u8]) {
        buf[..Self::STRIDE].fill(0);
        buf[..TAG_LEN].copy_from_slice(self.tag.as_bytes());
        buf[24] = self.entity as u8;
        buf[26..28].copy_from_slice(&self.id.to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Result<Self, DbError> {
        if buf.len() < Self::STRIDE || is_erased(&buf[..Self::STRIDE]) {
            return Err(DbError::Malformed);
        }
        Ok(Self {
            tag: Self::key_from_bytes(buf),
            entity: EntityType::try_from(buf[24])?,
            id: u16_at(buf, 26),
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Room record
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub room_id: u16,
    /// Bitmask of mop colors allowed in this room.
    pub allowed_colors: u8,
    /// Bitmask of mop type groups allowed in this room.
    pub allowed_types: u8,
    pub wall_tag_count: u16,
}

impl Record for RoomRecord {
    const STRIDE: usize = 16;
    type Key = u16;

    fn key(&self) -> u16 {
        self.room_id
    }

    fn key_from_bytes(buf: &[u8]) -> u16 {
        u16_at(buf, 0)
    }

    fn encode(&self, buf: &mut [u8]) {
        buf[..Self::STRIDE].fill(0);
        buf[0..2].copy_from_slice(&self.room_id.to_le_bytes());
        buf[2] = self.allowed_colors;
        buf[3] = self.allowed_types;
        buf[4..6].copy_from_slice(&self.wall_tag_count.to_le_bytes());
    }

    fn decode(buf: &[u8]) -> Result<Self, DbError> {
        if buf.len() < Self::STRIDE || is_erased(&buf[..Self::STRIDE]) {
            return Err(DbError::Malformed);
        }
        Ok(Self {
            room_id: u16_at(buf, 0),
            allowed_colors: buf[2],
            allowed_types: buf[3],
            wall_tag_count: u16_at(buf, 4),
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Mop record
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MopRecord {
    pub mop_id: u16,
    /// One-hot color bit.
    pub color: u8,
    /// One-hot type-group bit.
    pub type_group: u8,
    pub size: u8,
    pub sides: u8,
}

impl Record for MopRecord {
    const STRIDE: usize = 16;
    type Key = u16;

    fn key(&self) -> u16 {
        self.mop_id
    }

    fn key_from_bytes(buf: &[u8]) -> u16 {
        u16_at(buf, 0)
    }

    fn encode(&self, buf: &mut [u8]) {
        buf[..Self::STRIDE].fill(0);
        buf[0..2].copy_from_slice(&self.mop_id.to_le_bytes());
        buf[2] = self.color;
        buf[3] = self.type_group;
        buf[4] = self.size;
        buf[5] = self.sides;
    }

    fn decode(buf: &[u8]) -> Result<Self, DbError> {
        if buf.len() < Self::STRIDE || is_erased(&buf[..Self::STRIDE]) {
            return Err(DbError::Malformed);
        }
        Ok(Self {
            mop_id: u16_at(buf, 0),
            color: buf[2],
            type_group: buf[3],
            size: buf[4],
            sides: buf[5],
        })
    }
}
