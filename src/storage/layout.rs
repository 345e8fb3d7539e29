//! Flash regions.  Bases, strides and capacities are a binary-compatibility
//! contract with the provisioning tool; do not change them.
//!
//! ```text
//! 0x0000_0000 ┌──────────────────────────┐
//!             │ RFID records  32 B × 8192│
//! 0x0004_0000 ├──────────────────────────┤
//!             │ Room records  16 B × 4096│
//! 0x0005_0000 ├──────────────────────────┤
//!             │ Mop records   16 B × 4096│
//! 0x0006_0000 ├──────────────────────────┤
//!             │ Config blob   4 KiB      │
//! 0x0006_1000 └──────────────────────────┘
//! ```

/// A fixed-base, fixed-stride array of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub base: u32,
    pub stride: u32,
    pub capacity: u32,
}

impl Region {
    /// Address of record `index`, or `None` past the end of the region.
    pub const fn addr(&self, index: u32) -> Option<u32> {
        if index >= self.capacity {
            return None;
        }
        Some(self.base + index * self.stride)
    }

    /// One past the last byte of the region.
    pub const fn end(&self) -> u32 {
        self.base + self.capacity * self.stride
    }
}

pub const RFID_REGION: Region = Region {
    name: "rfid",
    base: 0x0000_0000,
    stride: 32,
    capacity: 8192,
};

pub const ROOM_REGION: Region = Region {
    name: "room",
    base: 0x0004_0000,
    stride: 16,
    capacity: 4096,
};

pub const MOP_REGION: Region = Region {
    name: "mop",
    base: 0x0005_0000,
    stride: 16,
    capacity: 4096,
};

/// Length-prefixed configuration blob.
pub const CONFIG_REGION_BASE: u32 = 0x0006_0000;
pub const CONFIG_REGION_LEN: u32 = 0x1000;

/// Smallest flash that holds every region.
pub const FLASH_SIZE: u32 = CONFIG_REGION_BASE + CONFIG_REGION_LEN;
