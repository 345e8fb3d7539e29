//! Mock adapters and fixtures for integration tests.
//!
//! Records every emitted event and notification so tests can assert on the
//! full history, and provisions a small tag database in simulated flash.

use core::f32::consts::PI;

use mopguard::adapters::memory_flash::MemoryFlash;
use mopguard::app::events::{AppEvent, NotifyCode};
use mopguard::app::ports::{EventSink, NotifySink};
use mopguard::motion::{ImuSample, Vec3};
use mopguard::rfid::TagId;
use mopguard::storage::{EntityType, MopRecord, RfidRecord, RoomRecord, TagDatabase};

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<(u64, AppEvent)>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.iter().any(|(_, e)| e == event)
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|(_, e)| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, at_tick: u64, event: &AppEvent) {
        self.events.push((at_tick, event.clone()));
    }
}

#[derive(Default)]
pub struct RecordingNotify {
    pub codes: Vec<NotifyCode>,
}

impl NotifySink for RecordingNotify {
    fn notify(&mut self, code: NotifyCode) {
        self.codes.push(code);
    }
}

// ── Tag stream fixtures ───────────────────────────────────────

pub fn tag(s: &str) -> TagId {
    TagId::right_aligned(s.as_bytes())
}

/// One reader frame with the default envelope around `epc`.
pub fn frame(epc: &str) -> Vec<u8> {
    let mut v = vec![0x02];
    v.extend_from_slice(b"HDR01");
    v.extend_from_slice(epc.as_bytes());
    v.extend_from_slice(b"CRC1");
    v.extend_from_slice(b"\r\n");
    v
}

// ── Provisioned database ──────────────────────────────────────

pub const ROOM_KITCHEN: u16 = 5;
pub const ROOM_WARD: u16 = 6;
pub const MOP_BLUE: u16 = 9;
pub const MOP_RED: u16 = 10;

/// Kitchen (room 5) allows color 0x02 only; the ward (room 6) allows 0x02
/// and 0x04.  Mop 9 is color 0x02, mop 10 is color 0x04.
///
/// | Tag | Entity       | Id |
/// |-----|--------------|----|
/// | M09 | Mop          | 9  |
/// | M10 | Mop          | 10 |
/// | P05 | RoomPosition | 5  |
/// | W05 | Wall         | 5  |
/// | W06 | Wall         | 6  |
/// | X06 | Warning      | 6  |
pub fn provisioned_flash() -> MemoryFlash {
    let mut db = TagDatabase::open(MemoryFlash::new(), None).unwrap();
    for (t, entity, id) in [
        ("M09", EntityType::Mop, MOP_BLUE),
        ("M10", EntityType::Mop, MOP_RED),
        ("P05", EntityType::RoomPosition, ROOM_KITCHEN),
        ("W05", EntityType::Wall, ROOM_KITCHEN),
        ("W06", EntityType::Wall, ROOM_WARD),
        ("X06", EntityType::Warning, ROOM_WARD),
    ] {
        db.insert_rfid(&RfidRecord {
            tag: tag(t),
            entity,
            id,
        })
        .unwrap();
    }
    for (room_id, allowed_colors) in [(ROOM_KITCHEN, 0x02), (ROOM_WARD, 0x06)] {
        db.insert_room(&RoomRecord {
            room_id,
            allowed_colors,
            allowed_types: 0x01,
            wall_tag_count: 4,
        })
        .unwrap();
    }
    for (mop_id, color) in [(MOP_BLUE, 0x02), (MOP_RED, 0x04)] {
        db.insert_mop(&MopRecord {
            mop_id,
            color,
            type_group: 0x01,
            size: 1,
            sides: 2,
        })
        .unwrap();
    }
    db.flash().clone()
}

// ── Motion fixtures ───────────────────────────────────────────

/// Handle tilted ~37° with a 1 Hz, 0.3 g stroke along the handle.
pub fn stroke(t: u64) -> ImuSample {
    let s = (2.0 * PI * t as f32 / 50.0).sin();
    let a = 1.0 + 0.3 * s;
    ImuSample {
        accel: Vec3::new(0.6 * a, 0.0, 0.8 * a),
        gyro: Vec3::new(40.0 * s, 0.0, 5.0 * s),
        mag: Vec3::new(0.3, 0.0, 0.0),
    }
}

#[allow(dead_code)]
pub fn resting() -> ImuSample {
    ImuSample {
        accel: Vec3::new(0.0, 0.0, 1.0),
        gyro: Vec3::ZERO,
        mag: Vec3::new(0.3, 0.0, 0.0),
    }
}
