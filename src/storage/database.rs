//! Flash-resident tag, room and mop tables.
//!
//! Records are provisioned out of band and read-only while the tool is in
//! use.  Appends are admin-only and must not run concurrently with lookups;
//! the database enforces ascending keys at the append boundary so lookups
//! can binary-search.

use log::{info, warn};

use super::layout::{MOP_REGION, RFID_REGION, ROOM_REGION, Region};
use super::record::{MopRecord, Record, RfidRecord, RoomRecord, is_erased};
use super::search::{DEFAULT_SEARCH_CAP, SearchResult, bounded_search};
use crate::app::ports::FlashPort;
use crate::error::{DbError, Result};
use crate::rfid::TagId;

/// Largest record stride; sizes the scratch buffers.
const MAX_STRIDE: usize = 32;

/// Record counts per region, cached across boots to skip the recovery scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegionCounts {
    pub rfid: u32,
    pub room: u32,
    pub mop: u32,
}

/// Adjacent pairs found out of order by [`TagDatabase::verify_sorted`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderReport {
    pub rfid: u32,
    pub room: u32,
    pub mop: u32,
}

impl OrderReport {
    pub fn total(&self) -> u32 {
        self.rfid + self.room + self.mop
    }
}

/// A lookup outcome: the search statistics plus the record when found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup<R> {
    pub search: SearchResult,
    pub record: Option<R>,
}

pub struct TagDatabase<F: FlashPort> {
    flash: F,
    counts: RegionCounts,
    search_cap: u8,
}

impl<F: FlashPort> TagDatabase<F> {
    /// Bring the database up.  Without cached counts each region is scanned
    /// for its first fully-erased slot.
    pub fn open(flash: F, cached: Option<RegionCounts>) -> Result<Self> {
        let needed = [RFID_REGION, ROOM_REGION, MOP_REGION]
            .iter()
            .map(Region::end)
            .max()
            .unwrap_or(0);
        if flash.capacity() < needed {
            warn!("tag db: flash is {} bytes, layout needs {}", flash.capacity(), needed);
            return Err(DbError::FlashTooSmall.into());
        }

        let counts = match cached {
            Some(c) => c,
            None => RegionCounts {
                rfid: scan_count::<RfidRecord, F>(&flash, &RFID_REGION)?,
                room: scan_count::<RoomRecord, F>(&flash, &ROOM_REGION)?,
                mop: scan_count::<MopRecord, F>(&flash, &MOP_REGION)?,
            },
        };
        info!(
            "tag db: {} rfid, {} room, {} mop records{}",
            counts.rfid,
            counts.room,
            counts.mop,
            if cached.is_some() { " (cached)" } else { "" }
        );
        Ok(Self {
            flash,
            counts,
            search_cap: DEFAULT_SEARCH_CAP,
        })
    }

    pub fn set_search_cap(&mut self, cap: u8) {
        self.search_cap = cap;
    }

    pub fn counts(&self) -> RegionCounts {
        self.counts
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    // ── Lookups ───────────────────────────────────────────────

    pub fn find_tag(&self, tag: &TagId) -> Result<Lookup<RfidRecord>> {
        self.find(&RFID_REGION, self.counts.rfid, tag)
    }

    pub fn find_room(&self, room_id: u16) -> Result<Lookup<RoomRecord>> {
        self.find(&ROOM_REGION, self.counts.room, &room_id)
    }

    pub fn find_mop(&self, mop_id: u16) -> Result<Lookup<MopRecord>> {
        self.find(&MOP_REGION, self.counts.mop, &mop_id)
    }

    // ── Index reads ───────────────────────────────────────────

    pub fn read_rfid(&self, index: u32) -> Result<RfidRecord> {
        self.read_at(&RFID_REGION, self.counts.rfid, index)
    }

    pub fn read_room(&self, index: u32) -> Result<RoomRecord> {
        self.read_at(&ROOM_REGION, self.counts.room, index)
    }

    pub fn read_mop(&self, index: u32) -> Result<MopRecord> {
        self.read_at(&MOP_REGION, self.counts.mop, index)
    }

    // ── Appends ───────────────────────────────────────────────

    /// Append a tag record.  Returns its index.
    pub fn insert_rfid(&mut self, record: &RfidRecord) -> Result<u32> {
        let index = self.append(&RFID_REGION, self.counts.rfid, record)?;
        self.counts.rfid += 1;
        Ok(index)
    }

    pub fn insert_room(&mut self, record: &RoomRecord) -> Result<u32> {
        let index = self.append(&ROOM_REGION, self.counts.room, record)?;
        self.counts.room += 1;
        Ok(index)
    }

    pub fn insert_mop(&mut self, record: &MopRecord) -> Result<u32> {
        let index = self.append(&MOP_REGION, self.counts.mop, record)?;
        self.counts.mop += 1;
        Ok(index)
    }

    /// Count adjacent out-of-order pairs in every region.
    pub fn verify_sorted(&self) -> Result<OrderReport> {
        let report = OrderReport {
            rfid: self.violations::<RfidRecord>(&RFID_REGION, self.counts.rfid)?,
            room: self.violations::<RoomRecord>(&ROOM_REGION, self.counts.room)?,
            mop: self.violations::<MopRecord>(&MOP_REGION, self.counts.mop)?,
        };
        if report.total() > 0 {
            warn!(
                "tag db: order violations rfid={} room={} mop={}; lookups may miss",
                report.rfid, report.room, report.mop
            );
        }
        Ok(report)
    }

    // ── Internal ──────────────────────────────────────────────

    fn read_slot(&self, region: &Region, index: u32, buf: &mut [u8]) -> Result<()> {
        let addr = region.addr(index).ok_or(DbError::IndexOutOfRange)?;
        self.flash.read(addr, &mut buf[..region.stride as usize])?;
        Ok(())
    }

    fn key_at<R: Record>(&self, region: &Region, index: u32) -> Result<R::Key> {
        let mut buf = [0u8; MAX_STRIDE];
        self.read_slot(region, index, &mut buf)?;
        Ok(R::key_from_bytes(&buf[..R::STRIDE]))
    }

    fn read_at<R: Record>(&self, region: &Region, count: u32, index: u32) -> Result<R> {
        if index >= count {
            return Err(DbError::IndexOutOfRange.into());
        }
        let mut buf = [0u8; MAX_STRIDE];
        self.read_slot(region, index, &mut buf)?;
        Ok(R::decode(&buf[..R::STRIDE])?)
    }

    fn find<R: Record>(&self, region: &Region, count: u32, key: &R::Key) -> Result<Lookup<R>> {
        let search = bounded_search(count, self.search_cap, |i| {
            self.key_at::<R>(region, i).map(|k| k.cmp(key))
        })?;
        if search.capped {
            warn!("tag db: {} search hit the {}-probe cap", region.name, self.search_cap);
        }
        let record = if search.found {
            Some(self.read_at::<R>(region, count, search.index)?)
        } else {
            None
        };
        Ok(Lookup { search, record })
    }

    fn append<R: Record>(&mut self, region: &Region, count: u32, record: &R) -> Result<u32> {
        let addr = region.addr(count).ok_or(DbError::RegionFull)?;
        if count > 0 {
            let last = self.key_at::<R>(region, count - 1)?;
            if record.key() <= last {
                return Err(DbError::OutOfOrder.into());
            }
        }
        let mut buf = [0u8; MAX_STRIDE];
        record.encode(&mut buf);
        self.flash.write(addr, &buf[..R::STRIDE])?;
        Ok(count)
    }

    fn violations<R: Record>(&self, region: &Region, count: u32) -> Result<u32> {
        if count < 2 {
            return Ok(0);
        }
        let mut bad = 0;
        let mut prev = self.key_at::<R>(region, 0)?;
        for i in 1..count {
            let key = self.key_at::<R>(region, i)?;
            if key <= prev {
                bad += 1;
            }
            prev = key;
        }
        Ok(bad)
    }
}

/// Index of the first fully-erased slot (append-only regions have no holes).
fn scan_count<R: Record, F: FlashPort>(flash: &F, region: &Region) -> Result<u32> {
    let mut buf = [0u8; MAX_STRIDE];
    let slot = &mut buf[..R::STRIDE];
    for index in 0..region.capacity {
        let addr = region.base + index * region.stride;
        flash.read(addr, slot)?;
        if is_erased(slot) {
            return Ok(index);
        }
    }
    Ok(region.capacity)
}
