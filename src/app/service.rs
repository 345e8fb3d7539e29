//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the motion recognizer, the tag decoder and ring, the
//! tag database and the compliance engine.  It exposes a hardware-agnostic
//! API; all I/O flows through port traits injected at call sites, making
//! the entire service testable with mock adapters.
//!
//! ```text
//!   ImuSample ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!   RFID bytes ──▶│         AppService          │ ──▶ NotifySink
//!  AppCommand ──▶ │ Recognizer · Ring · DB · CE │
//!                 └──────────────┬──────────────┘
//!                                ▼
//!                            FlashPort
//! ```
//!
//! The recognizer tick, byte ingestion and tag polling are separate entry
//! points so a firmware can drive them from different priorities.

use log::{info, warn};

use crate::compliance::{ComplianceEngine, ComplianceOutcome};
use crate::config::SystemConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::fsm::MotionState;
use crate::motion::{ImuSample, MotionInputs, MotionSignals, Recognizer, RecognizerReport};
use crate::rfid::decoder::TagDecoder;
use crate::rfid::ring::{TAG_RING_LEN, TagRing};
use crate::storage::{RegionCounts, TagDatabase};

use super::commands::{AppCommand, CommandReply};
use super::events::{AppEvent, NotifyCode, TelemetryData};
use super::ports::{ConfigPort, EventSink, FlashPort, NotifySink};

/// Seconds a changed config may stay unsaved before auto-save.
const AUTO_SAVE_DELAY_SECS: f32 = 5.0;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<F: FlashPort> {
    config: SystemConfig,
    recognizer: Recognizer,
    signals: MotionSignals,
    decoder: TagDecoder,
    ring: TagRing<TAG_RING_LEN>,
    db: TagDatabase<F>,
    compliance: ComplianceEngine,
    diag: Diagnostics,
    /// Motion parameters changed; applied at the next Idle tick.
    motion_reconfigure_pending: bool,
    config_dirty: bool,
    dirty_since_tick: u64,
}

impl<F: FlashPort> AppService<F> {
    /// Validate `config`, open the tag database and check its ordering.
    ///
    /// `counts` are region record counts cached from a previous boot; `None`
    /// runs the recovery scan.
    pub fn new(config: SystemConfig, flash: F, counts: Option<RegionCounts>) -> Result<Self> {
        config.validate()?;

        let mut db = TagDatabase::open(flash, counts)?;
        db.set_search_cap(config.search_iteration_cap);

        let mut diag = Diagnostics::new();
        let order = db.verify_sorted()?;
        diag.order_violations = order.total();

        Ok(Self {
            recognizer: Recognizer::new(&config),
            signals: MotionSignals::new(),
            decoder: TagDecoder::new(&config),
            ring: TagRing::new(),
            db,
            compliance: ComplianceEngine::new(&config),
            diag,
            config,
            motion_reconfigure_pending: false,
            config_dirty: false,
            dirty_since_tick: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(self.recognizer.ticks(), &AppEvent::Started);
        info!(
            "AppService started: {} tags, {} rooms, {} mops",
            self.db.counts().rfid,
            self.db.counts().room,
            self.db.counts().mop
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one recognizer tick: filter → cycles → FSM → coverage, then the
    /// compliance timers.
    pub fn tick(
        &mut self,
        sample: &ImuSample,
        inputs: MotionInputs,
        sink: &mut impl EventSink,
        notify: &mut impl NotifySink,
    ) -> RecognizerReport {
        let report = self.recognizer.tick(sample, inputs);
        let now = report.tick;

        if let Some((from, to)) = report.transition {
            info!("motion: {:?} -> {:?}", from, to);
            self.emit(now, AppEvent::MotionChanged { from, to }, sink, notify);
        }
        if let Some(side) = report.flipped {
            self.emit(now, AppEvent::FrameFlipped { side }, sink, notify);
        }
        if report.coverage_limit_reached {
            let event = AppEvent::CoverageThresholdReached {
                mop_id: self.compliance.mop_id(),
                coverage_m2: self.recognizer.coverage().per_mop_m2(),
            };
            self.emit(now, event, sink, notify);
        }

        let snapshot = self.recognizer.snapshot();
        self.signals.publish(&snapshot);
        self.diag.rejected_short_cycles = self.recognizer.rejected_short_cycles();

        let outcome = self.compliance.on_tick(now, &snapshot, &mut self.diag);
        self.dispatch(now, outcome, sink, notify);

        if self.motion_reconfigure_pending && report.state == MotionState::Idle {
            self.recognizer.reconfigure(&self.config);
            self.motion_reconfigure_pending = false;
            info!("motion: new parameters applied");
        }
        report
    }

    /// Producer side: decode raw reader bytes into the tag ring.
    /// Returns the number of tags queued.
    pub fn ingest_bytes(&mut self, bytes: &[u8]) -> usize {
        let mut queued = 0;
        self.decoder.feed(bytes, |tag| {
            if self.ring.push(tag) {
                queued += 1;
            }
        });

        let stats = self.decoder.stats();
        self.diag.frames_decoded = stats.frames;
        self.diag.empty_frames = stats.empty_frames;
        self.diag.frame_overflows = stats.overflows;
        self.diag.ring_full_drops = self.ring.ring_full_drops();
        queued
    }

    /// Consumer side: drain the tag ring through the compliance engine.
    /// Returns the number of tags handled.
    pub fn poll_tags(&mut self, sink: &mut impl EventSink, notify: &mut impl NotifySink) -> usize {
        let now = self.recognizer.ticks();
        let mut handled = 0;
        while let Some(tag) = self.ring.pop() {
            let outcome = self.compliance.handle_tag(tag, &self.db, now, &mut self.diag);
            self.dispatch(now, outcome, sink, notify);
            handled += 1;
        }
        handled
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an administrative command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        sink: &mut impl EventSink,
        notify: &mut impl NotifySink,
    ) -> Result<CommandReply> {
        let now = self.recognizer.ticks();
        match cmd {
            AppCommand::InsertRfid(record) => Ok(CommandReply::Inserted(self.db.insert_rfid(&record)?)),
            AppCommand::InsertRoom(record) => Ok(CommandReply::Inserted(self.db.insert_room(&record)?)),
            AppCommand::InsertMop(record) => Ok(CommandReply::Inserted(self.db.insert_mop(&record)?)),
            AppCommand::SearchTag(tag) => {
                let lookup = self.db.find_tag(&tag)?;
                self.diag.record_search(&lookup.search);
                Ok(CommandReply::Search {
                    result: lookup.search,
                    record: lookup.record,
                })
            }
            AppCommand::ClearCaches => {
                self.compliance.clear_caches();
                info!("caches cleared");
                Ok(CommandReply::Done)
            }
            boundary @ (AppCommand::ShiftStart | AppCommand::ShiftEnd) => {
                let outcome = self.compliance.on_shift_boundary(now);
                self.recognizer.reset_shift();
                self.dispatch(now, outcome, sink, notify);
                info!("shift boundary ({:?})", boundary);
                Ok(CommandReply::Done)
            }
            AppCommand::FrameLifted => {
                let outcome = self.compliance.on_frame_lift();
                self.dispatch(now, outcome, sink, notify);
                Ok(CommandReply::Done)
            }
            AppCommand::FrameSeated => {
                let outcome = self.compliance.on_frame_seated(now);
                self.dispatch(now, outcome, sink, notify);
                Ok(CommandReply::Done)
            }
            AppCommand::UpdateConfig(new_config) => {
                new_config.validate()?;
                self.apply_config(new_config);
                self.mark_config_dirty();
                info!("Configuration updated at runtime");
                Ok(CommandReply::Done)
            }
            AppCommand::VerifyDatabase => {
                let report = self.db.verify_sorted()?;
                self.diag.order_violations = report.total();
                Ok(CommandReply::OrderViolations(report.total()))
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self) -> TelemetryData {
        let coverage = self.recognizer.coverage();
        TelemetryData {
            tick: self.recognizer.ticks(),
            motion: self.recognizer.snapshot(),
            per_side_m2: coverage.per_side_m2(),
            shift_m2: coverage.shift_m2(),
            room_id: self.compliance.room_id(),
            mop_id: self.compliance.mop_id(),
            linked_mop_id: self.compliance.link().mop_id,
            pending_tags: self.ring.len() as u16,
            diagnostics: self.diag,
        }
    }

    /// Emit a telemetry event.
    pub fn report_telemetry(&self, sink: &mut impl EventSink) {
        sink.emit(
            self.recognizer.ticks(),
            &AppEvent::Telemetry(self.build_telemetry()),
        );
    }

    pub fn state(&self) -> MotionState {
        self.recognizer.state()
    }

    /// Recognizer ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.recognizer.ticks()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    pub fn recognizer(&self) -> &Recognizer {
        &self.recognizer
    }

    /// Scalars published for lower-priority readers.
    pub fn signals(&self) -> &MotionSignals {
        &self.signals
    }

    pub fn compliance(&self) -> &ComplianceEngine {
        &self.compliance
    }

    pub fn database(&self) -> &TagDatabase<F> {
        &self.db
    }

    /// Tags waiting in the ring.
    pub fn pending_tags(&self) -> usize {
        self.ring.len()
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_config(&mut self, config: SystemConfig) {
        self.db.set_search_cap(config.search_iteration_cap);
        self.decoder.reconfigure(&config);
        self.compliance.apply_config(&config);
        self.motion_reconfigure_pending = true;
        self.config = config;
    }

    fn dispatch(
        &mut self,
        now: u64,
        outcome: ComplianceOutcome,
        sink: &mut impl EventSink,
        notify: &mut impl NotifySink,
    ) {
        if outcome.reset_coverage {
            self.recognizer.reset_mop_coverage();
        }
        for event in outcome.events {
            self.emit(now, event, sink, notify);
        }
    }

    fn emit(&self, now: u64, event: AppEvent, sink: &mut impl EventSink, notify: &mut impl NotifySink) {
        sink.emit(now, &event);
        if let Some(code) = NotifyCode::for_event(&event) {
            notify.notify(code);
        }
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified. Called by `handle_command(UpdateConfig)`.
    pub fn mark_config_dirty(&mut self) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_tick = self.recognizer.ticks();
        }
    }

    /// Persist the config once it has been dirty for a few seconds.
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, storage: &mut impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        let ticks_since_dirty = self.recognizer.ticks().saturating_sub(self.dirty_since_tick);
        if (ticks_since_dirty as f32 * self.config.tick_secs()) < AUTO_SAVE_DELAY_SECS {
            return false;
        }
        self.save_config(storage)
    }

    /// Force-save if dirty (call before power-down).
    pub fn force_save_if_dirty(&mut self, storage: &mut impl ConfigPort) -> bool {
        self.config_dirty && self.save_config(storage)
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }

    fn save_config(&mut self, storage: &mut impl ConfigPort) -> bool {
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config saved");
                true
            }
            Err(e) => {
                warn!("Config save failed: {}", e);
                false
            }
        }
    }
}
