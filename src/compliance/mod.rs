//! Room / mop compliance engine.
//!
//! Consumes decoded tags on the consumer side of the tag ring, resolves them
//! against the [`TagDatabase`] and keeps the room↔mop context:
//!
//! ```text
//!   Wall ──► room context ──► gates(room, mop) ──► link | violation events
//!   RoomPosition ──► room context
//!   Warning ──► gates(warning room, mop) ──► violation events
//!   Mop ──► debounce ──► swap: reset coverage, drop link, reuse check,
//!                             gates(room in context, new mop)
//! ```
//!
//! Nothing here returns an error.  Flash faults and lookup misses land in
//! [`Diagnostics`]; every call returns a bounded [`ComplianceOutcome`] which
//! the service forwards to its sinks.

pub mod gates;
pub mod link;
pub mod unchipped;

use log::{debug, info, warn};

use crate::app::events::{AppEvent, LinkResetReason};
use crate::app::ports::FlashPort;
use crate::cache::{
    MOP_CACHE_LEN, MostRecentFirst, Observation, OldestTimestamp, ROOM_CACHE_LEN, RecencyCache,
};
use crate::config::SystemConfig;
use crate::diagnostics::Diagnostics;
use crate::motion::MotionSnapshot;
use crate::rfid::TagId;
use crate::storage::{EntityType, MopRecord, RoomRecord, TagDatabase};

use self::gates::GateReport;
use self::link::{DebounceStep, MopDebounce, RoomMopLink};
use self::unchipped::UnchippedDetector;

/// Upper bound on events produced by a single engine call.
pub const MAX_OUTCOME_EVENTS: usize = 6;

/// Mop cache payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MopSighting {
    pub mop_id: u16,
    /// Room this mop was linked in during the current shift, 0 if none.
    pub linked_room: u16,
}

pub type RoomCache = RecencyCache<TagId, u16, ROOM_CACHE_LEN, MostRecentFirst>;
pub type MopCache = RecencyCache<TagId, MopSighting, MOP_CACHE_LEN, OldestTimestamp>;

/// What one engine call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplianceOutcome {
    pub events: heapless::Vec<AppEvent, MAX_OUTCOME_EVENTS>,
    /// The per-mop coverage accumulator must restart.
    pub reset_coverage: bool,
}

impl ComplianceOutcome {
    fn push(&mut self, event: AppEvent) {
        if let Err(dropped) = self.events.push(event) {
            warn!("compliance: outcome full, dropping {:?}", dropped);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && !self.reset_coverage
    }
}

/// The mop currently mounted on the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstalledMop {
    pub tag: TagId,
    pub record: MopRecord,
}

pub struct ComplianceEngine {
    room_cache: RoomCache,
    mop_cache: MopCache,
    room: Option<RoomRecord>,
    room_id: u16,
    mop: Option<InstalledMop>,
    debounce: MopDebounce,
    link: RoomMopLink,
    unchipped: UnchippedDetector,
    /// `(room, mop)` pair whose gates already ran; repeats stay quiet.
    last_gated: Option<(u16, u16)>,

    debounce_reads: u8,
    link_refresh_ticks: u32,
    report_unknown: bool,
}

impl ComplianceEngine {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            room_cache: RoomCache::new(),
            mop_cache: MopCache::new(),
            room: None,
            room_id: 0,
            mop: None,
            debounce: MopDebounce::default(),
            link: RoomMopLink::default(),
            unchipped: UnchippedDetector::new(config),
            last_gated: None,
            debounce_reads: config.mop_debounce_reads,
            link_refresh_ticks: config.link_refresh_ticks,
            report_unknown: config.report_unknown_tags,
        }
    }

    /// Pick up new thresholds.  Context (room, mop, link, caches) is kept.
    pub fn apply_config(&mut self, config: &SystemConfig) {
        self.debounce_reads = config.mop_debounce_reads;
        self.link_refresh_ticks = config.link_refresh_ticks;
        self.report_unknown = config.report_unknown_tags;
        self.unchipped.configure(config);
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn room_id(&self) -> u16 {
        self.room_id
    }

    pub fn room(&self) -> Option<&RoomRecord> {
        self.room.as_ref()
    }

    pub fn installed_mop(&self) -> Option<&InstalledMop> {
        self.mop.as_ref()
    }

    pub fn mop_id(&self) -> u16 {
        self.mop.map_or(0, |m| m.record.mop_id)
    }

    pub fn link(&self) -> &RoomMopLink {
        &self.link
    }

    pub fn room_cache(&self) -> &RoomCache {
        &self.room_cache
    }

    pub fn mop_cache(&self) -> &MopCache {
        &self.mop_cache
    }

    // ── Tag dispatch ──────────────────────────────────────────

    /// Resolve one decoded tag and act on it.
    pub fn handle_tag<F: FlashPort>(
        &mut self,
        tag: TagId,
        db: &TagDatabase<F>,
        now: u64,
        diag: &mut Diagnostics,
    ) -> ComplianceOutcome {
        let mut out = ComplianceOutcome::default();

        let lookup = match db.find_tag(&tag) {
            Ok(l) => l,
            Err(e) => {
                diag.record_flash_error();
                warn!("compliance: lookup of {} failed: {}", tag, e);
                return out;
            }
        };
        diag.record_search(&lookup.search);

        let Some(record) = lookup.record else {
            diag.record_unknown_tag();
            debug!("compliance: unknown tag {}", tag);
            if self.report_unknown {
                out.push(AppEvent::UnknownTag { tag });
            }
            return out;
        };
        if record.id == 0 {
            debug!("compliance: tag {} carries no-context id 0", tag);
            return out;
        }

        match record.entity {
            EntityType::Wall => self.on_wall(tag, record.id, db, now, diag, &mut out),
            EntityType::RoomPosition => self.on_room_position(tag, record.id, db, now, diag, &mut out),
            EntityType::Warning => self.on_warning(tag, record.id, db, now, diag, &mut out),
            EntityType::Mop => self.on_mop(tag, record.id, db, now, diag, &mut out),
        }
        out
    }

    fn on_wall<F: FlashPort>(
        &mut self,
        tag: TagId,
        room_id: u16,
        db: &TagDatabase<F>,
        now: u64,
        diag: &mut Diagnostics,
        out: &mut ComplianceOutcome,
    ) {
        let seen = self.room_cache.observe(tag, room_id, now);
        let pending = self.mop.is_some() && self.last_gated != Some((room_id, self.mop_id()));
        if seen == Observation::Duplicate && !pending {
            return;
        }

        let room = resolve_room(db, room_id, diag);
        self.enter_room(room_id, room, out);

        if let (Some(room), Some(mop)) = (room, self.mop) {
            self.gate_and_link(&room, mop, now, out);
        }
    }

    fn on_room_position<F: FlashPort>(
        &mut self,
        tag: TagId,
        room_id: u16,
        db: &TagDatabase<F>,
        now: u64,
        diag: &mut Diagnostics,
        out: &mut ComplianceOutcome,
    ) {
        if self.room_cache.observe(tag, room_id, now) == Observation::Duplicate {
            return;
        }
        let room = resolve_room(db, room_id, diag);
        self.enter_room(room_id, room, out);
    }

    fn on_warning<F: FlashPort>(
        &mut self,
        tag: TagId,
        room_id: u16,
        db: &TagDatabase<F>,
        now: u64,
        diag: &mut Diagnostics,
        out: &mut ComplianceOutcome,
    ) {
        if self.room_cache.observe(tag, room_id, now) == Observation::Duplicate {
            return;
        }
        let (Some(room), Some(mop)) = (resolve_room(db, room_id, diag), self.mop) else {
            return;
        };
        let report = self.run_gates(&room, &mop, out);
        debug!("compliance: warning tag for room {}: {:?}", room_id, report);
    }

    fn on_mop<F: FlashPort>(
        &mut self,
        tag: TagId,
        mop_id: u16,
        db: &TagDatabase<F>,
        now: u64,
        diag: &mut Diagnostics,
        out: &mut ComplianceOutcome,
    ) {
        self.unchipped.on_chip_read(now);

        if self.mop.is_some_and(|m| m.tag == tag) {
            self.debounce.clear();
            self.link.refresh(mop_id, now);
            return;
        }

        match self.debounce.step(tag, self.debounce_reads) {
            DebounceStep::Pending => return,
            DebounceStep::Restarted => {
                diag.debounce_rejects = diag.debounce_rejects.saturating_add(1);
                return;
            }
            DebounceStep::Accepted => {}
        }
        self.debounce.clear();

        let record = match db.find_mop(mop_id) {
            Ok(l) => {
                diag.record_search(&l.search);
                l.record
            }
            Err(e) => {
                diag.record_flash_error();
                warn!("compliance: mop {} lookup failed: {}", mop_id, e);
                return;
            }
        };
        let Some(record) = record else {
            diag.record_unknown_tag();
            warn!("compliance: tag {} names mop {} with no record", tag, mop_id);
            return;
        };

        self.accept_mop(tag, record, now, out);
    }

    fn accept_mop(&mut self, tag: TagId, record: MopRecord, now: u64, out: &mut ComplianceOutcome) {
        let from = self.mop_id();
        info!("compliance: mop {} -> {}", from, record.mop_id);

        out.reset_coverage = true;
        self.reset_link(LinkResetReason::MopChanged, out);

        let linked_room = self
            .mop_cache
            .get(&tag)
            .map_or(0, |entry| entry.value.linked_room);
        if linked_room != 0 {
            out.push(AppEvent::MopReused {
                mop_id: record.mop_id,
                previous_room_id: linked_room,
            });
        }
        out.push(AppEvent::MopChanged {
            from,
            to: record.mop_id,
        });

        self.mop_cache.observe(
            tag,
            MopSighting {
                mop_id: record.mop_id,
                linked_room,
            },
            now,
        );
        let mop = InstalledMop { tag, record };
        self.mop = Some(mop);
        self.last_gated = None;

        // A room already in context gates the new mop straight away.
        if let Some(room) = self.room.filter(|r| r.room_id != 0) {
            self.gate_and_link(&room, mop, now, out);
        }
    }

    // ── Periodic / boundary hooks ─────────────────────────────

    /// Link refresh timeout and tagless-swap inference.
    pub fn on_tick(&mut self, now: u64, motion: &MotionSnapshot, diag: &mut Diagnostics) -> ComplianceOutcome {
        let mut out = ComplianceOutcome::default();

        if self.link.expired(now, self.link_refresh_ticks) {
            if let Some((room_id, mop_id)) = self.link.reset() {
                warn!("compliance: mop {} not re-read, unlinking room {}", mop_id, room_id);
                diag.link_timeouts = diag.link_timeouts.saturating_add(1);
                self.mop = None;
                self.last_gated = None;
                out.push(AppEvent::MopRemoved { mop_id });
            }
        }

        if let Some(coverage_m2) = self.unchipped.check(now, motion) {
            warn!("compliance: tagless mop swap inferred at {:.1} m²", coverage_m2);
            diag.unchipped_swaps = diag.unchipped_swaps.saturating_add(1);
            out.reset_coverage = true;
            out.push(AppEvent::UnchippedSwapInferred { coverage_m2 });
        }
        out
    }

    pub fn on_frame_lift(&mut self) -> ComplianceOutcome {
        let mut out = ComplianceOutcome::default();
        self.reset_link(LinkResetReason::FrameLifted, &mut out);
        self.debounce.clear();
        self.last_gated = None;
        out
    }

    /// The frame is back on the handle: gate the installed mop against the
    /// room still in context.
    pub fn on_frame_seated(&mut self, now: u64) -> ComplianceOutcome {
        let mut out = ComplianceOutcome::default();
        if let (Some(room), Some(mop)) = (self.room.filter(|r| r.room_id != 0), self.mop) {
            self.gate_and_link(&room, mop, now, &mut out);
        }
        out
    }

    /// Shift start or end: drop the link and forget everything seen.
    pub fn on_shift_boundary(&mut self, now: u64) -> ComplianceOutcome {
        let mut out = ComplianceOutcome::default();
        self.reset_link(LinkResetReason::ShiftBoundary, &mut out);
        self.clear_caches();
        self.unchipped.reset(now);
        self.last_gated = None;
        out
    }

    pub fn clear_caches(&mut self) {
        self.room_cache.clear();
        self.mop_cache.clear();
        self.debounce.clear();
    }

    // ── Internals ─────────────────────────────────────────────

    fn enter_room(&mut self, room_id: u16, room: Option<RoomRecord>, out: &mut ComplianceOutcome) {
        if room_id != self.room_id {
            info!("compliance: room {} -> {}", self.room_id, room_id);
            out.push(AppEvent::RoomChanged {
                from: self.room_id,
                to: room_id,
            });
            self.room_id = room_id;
        }
        self.room = room;
    }

    /// Gate `mop` against `room` once per pairing and link when every gate
    /// passes.
    fn gate_and_link(&mut self, room: &RoomRecord, mop: InstalledMop, now: u64, out: &mut ComplianceOutcome) {
        let pair = (room.room_id, mop.record.mop_id);
        if self.last_gated == Some(pair) {
            return;
        }
        self.last_gated = Some(pair);

        let report = self.run_gates(room, &mop, out);
        if report.all_allowed() && self.link.link(room.room_id, mop.record.mop_id, now) {
            info!("compliance: room {} linked to mop {}", room.room_id, mop.record.mop_id);
            if let Some(entry) = self.mop_cache.get_mut(&mop.tag) {
                entry.value.linked_room = room.room_id;
            }
            out.push(AppEvent::MopLinked {
                room_id: room.room_id,
                mop_id: mop.record.mop_id,
            });
        }
    }

    fn run_gates(&self, room: &RoomRecord, mop: &InstalledMop, out: &mut ComplianceOutcome) -> GateReport {
        let previous_room = self
            .mop_cache
            .get(&mop.tag)
            .map_or(0, |entry| entry.value.linked_room);
        let report = gates::evaluate(room, &mop.record, previous_room);

        if report.reuse.is_disallowed() {
            warn!(
                "compliance: mop {} already used in room {}",
                mop.record.mop_id, previous_room
            );
            out.push(AppEvent::MopUsedElsewhere {
                mop_id: mop.record.mop_id,
                room_id: room.room_id,
                previous_room_id: previous_room,
            });
        }
        if report.color.is_disallowed() {
            warn!(
                "compliance: mop {} color {:#04x} not allowed in room {}",
                mop.record.mop_id, mop.record.color, room.room_id
            );
            out.push(AppEvent::ColorDisallowed {
                room_id: room.room_id,
                mop_id: mop.record.mop_id,
                color: mop.record.color,
                allowed: room.allowed_colors,
            });
        }
        if report.type_group.is_disallowed() {
            warn!(
                "compliance: mop {} type {:#04x} not allowed in room {}",
                mop.record.mop_id, mop.record.type_group, room.room_id
            );
            out.push(AppEvent::TypeDisallowed {
                room_id: room.room_id,
                mop_id: mop.record.mop_id,
                type_group: mop.record.type_group,
                allowed: room.allowed_types,
            });
        }
        report
    }

    fn reset_link(&mut self, reason: LinkResetReason, out: &mut ComplianceOutcome) {
        if let Some((room_id, mop_id)) = self.link.reset() {
            info!("compliance: link {}↔{} reset ({:?})", room_id, mop_id, reason);
            out.push(AppEvent::LinkReset {
                reason,
                room_id,
                mop_id,
            });
        }
    }
}

fn resolve_room<F: FlashPort>(db: &TagDatabase<F>, room_id: u16, diag: &mut Diagnostics) -> Option<RoomRecord> {
    if room_id == 0 {
        return None;
    }
    match db.find_room(room_id) {
        Ok(l) => {
            diag.record_search(&l.search);
            if l.record.is_none() {
                debug!("compliance: room {} has no record", room_id);
            }
            l.record
        }
        Err(e) => {
            diag.record_flash_error();
            warn!("compliance: room {} lookup failed: {}", room_id, e);
            None
        }
    }
}
