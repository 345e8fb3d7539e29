//! Motion & mop-cycle recognizer.
//!
//! ```text
//! ImuSample ──▶ Vec3Window ×3 ──▶ |a| ──▶ GravityBaseline ──▶ FirLowPass ──┬─▶ PeakFollower (threshold)
//!                    │                                                     └─▶ CycleDetector ──▶ Coverage
//!                    ├──▶ OrientationTracker (in position, frame side)
//!                    └──▶ GyroActivity (sweep pattern)
//!                                          all of the above ──▶ motion FSM
//! ```
//!
//! [`Recognizer::tick`] runs once per inertial sample.  It never fails:
//! garbled samples are zeroed before they enter the buffers.

pub mod coverage;
pub mod cycle;
pub mod filter;
pub mod orientation;

use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::fsm::context::{FsmContext, MotionObservation};
use crate::fsm::{Fsm, MotionState, states};
use coverage::{CoverageAccumulator, MopCycle};
use cycle::{CycleDetector, GyroActivity, SweepPattern};
use filter::{FirLowPass, GravityBaseline, PeakFollower, Vec3Window, saturate};
use orientation::{FrameSide, OrientationTracker};

// ───────────────────────────────────────────────────────────────
// Vector / sample types
// ───────────────────────────────────────────────────────────────

/// Three-axis reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn saturated(self, full_scale: f32) -> Self {
        Self::new(
            saturate(self.x, full_scale),
            saturate(self.y, full_scale),
            saturate(self.z, full_scale),
        )
    }
}

/// Full-scale ranges of the IMU.  Readings beyond them are garbled and get
/// clamped before filtering.
pub const ACCEL_FULL_SCALE_G: f32 = 16.0;
pub const GYRO_FULL_SCALE_DPS: f32 = 2000.0;
pub const MAG_FULL_SCALE_GAUSS: f32 = 16.0;

/// One fixed-rate inertial sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuSample {
    /// Acceleration in g.
    pub accel: Vec3,
    /// Angular rate in deg/s.
    pub gyro: Vec3,
    /// Magnetic field in gauss.
    pub mag: Vec3,
}

/// Discrete inputs sampled alongside the IMU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionInputs {
    /// The wake-on-motion line reports the tool at rest.
    pub inactive: bool,
}

/// Everything that happened on one recognizer tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognizerReport {
    pub tick: u64,
    pub state: MotionState,
    /// `(from, to)` when the motion state changed on this tick.
    pub transition: Option<(MotionState, MotionState)>,
    pub cycle: Option<MopCycle>,
    pub flipped: Option<FrameSide>,
    /// Per-mop coverage crossed the configured limit on this tick.
    pub coverage_limit_reached: bool,
    pub in_position: bool,
    pub filtered_g: f32,
    pub threshold_g: f32,
}

// ───────────────────────────────────────────────────────────────
// Recognizer
// ───────────────────────────────────────────────────────────────

pub struct Recognizer {
    accel: Vec3Window,
    gyro: Vec3Window,
    mag: Vec3Window,
    gravity: GravityBaseline,
    gyro_bias: [GravityBaseline; 3],
    fir: FirLowPass,
    peak: PeakFollower,
    cycles: CycleDetector,
    gyro_activity: GyroActivity,
    orientation: OrientationTracker,
    coverage: CoverageAccumulator,
    fsm: Fsm,
    ctx: FsmContext,
    was_in_position: bool,
    tick: u64,
    threshold_fraction: f32,
    noise_floor_g: f32,
    s_shape_ratio: f32,
}

impl Recognizer {
    pub fn new(config: &SystemConfig) -> Self {
        let mut fsm = Fsm::new(states::build_state_table(), MotionState::Idle);
        let mut ctx = FsmContext::new(config);
        fsm.start(&mut ctx);

        Self {
            accel: Vec3Window::default(),
            gyro: Vec3Window::default(),
            mag: Vec3Window::default(),
            gravity: GravityBaseline::new(config.gravity_alpha),
            gyro_bias: core::array::from_fn(|_| GravityBaseline::new(config.gravity_alpha)),
            fir: FirLowPass::default(),
            peak: PeakFollower::new(config.peak_decay),
            cycles: CycleDetector::new(config.min_cycle_ticks, config.max_cycle_ticks),
            gyro_activity: GyroActivity::new(config.energy_decay, config.gyro_noise_floor_dps),
            orientation: OrientationTracker::new(config),
            coverage: CoverageAccumulator::new(config),
            fsm,
            ctx,
            was_in_position: false,
            tick: 0,
            threshold_fraction: config.threshold_fraction,
            noise_floor_g: config.noise_floor_g,
            s_shape_ratio: config.s_shape_ratio,
        }
    }

    /// Process one inertial sample.
    pub fn tick(&mut self, sample: &ImuSample, inputs: MotionInputs) -> RecognizerReport {
        self.tick += 1;
        let now = self.tick;

        // 1. Per-axis smoothing.
        self.accel.push(sample.accel.saturated(ACCEL_FULL_SCALE_G));
        self.gyro.push(sample.gyro.saturated(GYRO_FULL_SCALE_DPS));
        self.mag.push(sample.mag.saturated(MAG_FULL_SCALE_GAUSS));
        let accel = self.accel.mean();
        let gyro = self.gyro.mean();
        let mag = self.mag.mean();

        // 2–3. Gravity-removed magnitude, low-pass, adaptive threshold.
        let ac = self.gravity.remove(accel.norm());
        let filtered = self.fir.step(ac);
        self.peak.update(filtered);
        let threshold = self.peak.threshold(self.threshold_fraction, self.noise_floor_g);

        // 4 + 8. Orientation and frame flips.
        let orientation = self.orientation.update(accel, mag, now);
        if let Some(side) = orientation.flipped {
            info!("frame flipped to side {side:?}");
        }

        // 5–6. Cycles only count while held in position.
        let mut cycle = None;
        let mut coverage_limit_reached = false;
        if orientation.in_position {
            if let Some(hit) = self.cycles.step(filtered, threshold, now) {
                let (record, crossed) = self.coverage.add_cycle(hit, self.orientation.side());
                debug!(
                    "cycle: {} ticks, {:.3} g, {:.3} m²",
                    record.duration_ticks, record.amplitude_g, record.area_m2
                );
                cycle = Some(record);
                coverage_limit_reached = crossed;
            }
        } else if self.was_in_position {
            self.cycles.reset();
        }
        self.was_in_position = orientation.in_position;

        // 7. Gyro activity on bias-removed rates.
        let rates = [gyro.x, gyro.y, gyro.z];
        let mut centred = [0.0; 3];
        for ((out, bias), rate) in centred.iter_mut().zip(self.gyro_bias.iter_mut()).zip(rates) {
            *out = bias.remove(rate);
        }
        self.gyro_activity.step(centred);

        // 9. Motion state.
        self.ctx.now = now;
        self.ctx.observation = MotionObservation {
            moving: self.peak.peak() > self.noise_floor_g,
            in_position: orientation.in_position,
            cycle_completed: cycle.is_some(),
            inactive: inputs.inactive,
        };
        if cycle.is_some() {
            self.ctx.record_cycle(now);
        }
        let transition = self
            .fsm
            .tick(&mut self.ctx)
            .map(|to| (self.fsm.previous_state(), to));

        RecognizerReport {
            tick: now,
            state: self.fsm.current_state(),
            transition,
            cycle,
            flipped: orientation.flipped,
            coverage_limit_reached,
            in_position: orientation.in_position,
            filtered_g: filtered,
            threshold_g: threshold,
        }
    }

    /// Rebuild filters and state machine for `config`.  Coverage and the
    /// tick counter survive; motion state restarts at Idle.
    pub fn reconfigure(&mut self, config: &SystemConfig) {
        let mut coverage = core::mem::replace(&mut self.coverage, CoverageAccumulator::new(config));
        coverage.configure(config);
        let tick = self.tick;
        *self = Self::new(config);
        self.coverage = coverage;
        self.tick = tick;
    }

    /// A new mop was installed (or a tagless swap inferred).
    pub fn reset_mop_coverage(&mut self) {
        self.coverage.reset_mop();
    }

    /// Shift boundary: per-shift accumulators start over.
    pub fn reset_shift(&mut self) {
        self.coverage.reset_shift();
    }

    pub fn state(&self) -> MotionState {
        self.fsm.current_state()
    }

    pub fn previous_state(&self) -> MotionState {
        self.fsm.previous_state()
    }

    pub fn coverage(&self) -> &CoverageAccumulator {
        &self.coverage
    }

    pub fn sweep_pattern(&self) -> SweepPattern {
        self.gyro_activity.classify(self.s_shape_ratio)
    }

    pub fn side(&self) -> FrameSide {
        self.orientation.side()
    }

    pub fn orientation(&self) -> &OrientationTracker {
        &self.orientation
    }

    pub fn rejected_short_cycles(&self) -> u32 {
        self.cycles.rejected_short()
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Snapshot of the scalars other contexts read.
    pub fn snapshot(&self) -> MotionSnapshot {
        MotionSnapshot {
            state: self.state(),
            cycle_count: self.coverage.cycles(),
            per_mop_coverage_m2: self.coverage.per_mop_m2(),
            pattern: self.sweep_pattern(),
            side: self.side(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Cross-context publication
// ───────────────────────────────────────────────────────────────

/// What the compliance path knows about motion.  May be one tick stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionSnapshot {
    pub state: MotionState,
    pub cycle_count: u32,
    pub per_mop_coverage_m2: f32,
    pub pattern: SweepPattern,
    pub side: FrameSide,
}

impl MotionSnapshot {
    pub fn mopping(&self) -> bool {
        self.state == MotionState::Mopping
    }
}

/// Single-writer scalars published by the recognizer context.
///
/// Every field is an independent relaxed atomic; readers may observe a mix
/// of two consecutive ticks.
pub struct MotionSignals {
    state: AtomicU8,
    cycle_count: AtomicU32,
    coverage_bits: AtomicU32,
    pattern: AtomicU8,
    side: AtomicU8,
}

impl MotionSignals {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(MotionState::Idle as u8),
            cycle_count: AtomicU32::new(0),
            coverage_bits: AtomicU32::new(0),
            pattern: AtomicU8::new(0),
            side: AtomicU8::new(0),
        }
    }

    pub fn publish(&self, snap: &MotionSnapshot) {
        self.state.store(snap.state as u8, Ordering::Relaxed);
        self.cycle_count.store(snap.cycle_count, Ordering::Relaxed);
        self.coverage_bits
            .store(snap.per_mop_coverage_m2.to_bits(), Ordering::Relaxed);
        self.pattern.store(pattern_to_u8(snap.pattern), Ordering::Relaxed);
        self.side.store(snap.side.index() as u8, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MotionSnapshot {
        MotionSnapshot {
            state: MotionState::from_index(self.state.load(Ordering::Relaxed) as usize),
            cycle_count: self.cycle_count.load(Ordering::Relaxed),
            per_mop_coverage_m2: f32::from_bits(self.coverage_bits.load(Ordering::Relaxed)),
            pattern: pattern_from_u8(self.pattern.load(Ordering::Relaxed)),
            side: if self.side.load(Ordering::Relaxed) == 0 {
                FrameSide::A
            } else {
                FrameSide::B
            },
        }
    }
}

impl Default for MotionSignals {
    fn default() -> Self {
        Self::new()
    }
}

fn pattern_to_u8(p: SweepPattern) -> u8 {
    match p {
        SweepPattern::Unknown => 0,
        SweepPattern::BackAndForth => 1,
        SweepPattern::SShape => 2,
    }
}

fn pattern_from_u8(raw: u8) -> SweepPattern {
    match raw {
        1 => SweepPattern::BackAndForth,
        2 => SweepPattern::SShape,
        _ => SweepPattern::Unknown,
    }
}
