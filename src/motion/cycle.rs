//! Zero-cross / extremum cycle detection.
//!
//! ```text
//!   filtered AC ──▶ SlopeTracker ──▶ AlternatingExtrema ──▶ CycleDetector
//!                   (rise→fall =       (threshold + kind      (duration
//!                    local max)         must alternate)        window)
//! ```
//!
//! The same technique runs on each gyroscope axis to accumulate per-axis
//! activity energy, whose ratio classifies the sweep pattern.

use serde::{Deserialize, Serialize};

/// Kind of a local extremum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

/// Reports provisional extrema from sign changes of the first difference.
#[derive(Debug, Clone, Default)]
pub struct SlopeTracker {
    prev: Option<f32>,
    rising: Option<bool>,
}

impl SlopeTracker {
    /// Returns the provisional extremum (at the *previous* sample) when the
    /// slope changes sign.  Flat steps keep the current direction.
    pub fn step(&mut self, value: f32) -> Option<(Extremum, f32)> {
        let Some(prev) = self.prev else {
            self.prev = Some(value);
            return None;
        };
        self.prev = Some(value);

        if value > prev {
            let turned = self.rising == Some(false);
            self.rising = Some(true);
            turned.then_some((Extremum::Min, prev))
        } else if value < prev {
            let turned = self.rising == Some(true);
            self.rising = Some(false);
            turned.then_some((Extremum::Max, prev))
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Confirms extrema that clear the threshold in their own direction and
/// alternate in kind.  Repeated maxima (or minima) are ignored.
#[derive(Debug, Clone, Default)]
pub struct AlternatingExtrema {
    slope: SlopeTracker,
    last_kind: Option<Extremum>,
}

impl AlternatingExtrema {
    pub fn step(&mut self, value: f32, threshold: f32) -> Option<(Extremum, f32)> {
        let (kind, at) = self.slope.step(value)?;
        let clears = match kind {
            Extremum::Max => at > threshold,
            Extremum::Min => at < -threshold,
        };
        if !clears || self.last_kind == Some(kind) {
            return None;
        }
        self.last_kind = Some(kind);
        Some((kind, at))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ───────────────────────────────────────────────────────────────
// Mop cycle detector
// ───────────────────────────────────────────────────────────────

/// A cycle accepted by the duration window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleHit {
    pub duration_ticks: u32,
    /// Half of the peak-to-peak swing, in g.
    pub amplitude_g: f32,
}

/// Closes a cycle on every confirmed max that follows a confirmed min and
/// lands inside `[min_ticks, max_ticks]` of the previous cycle.
#[derive(Debug, Clone)]
pub struct CycleDetector {
    extrema: AlternatingExtrema,
    last_min: Option<f32>,
    last_cycle_tick: Option<u64>,
    min_ticks: u32,
    max_ticks: u32,
    rejected_short: u32,
}

impl CycleDetector {
    pub fn new(min_ticks: u16, max_ticks: u16) -> Self {
        Self {
            extrema: AlternatingExtrema::default(),
            last_min: None,
            last_cycle_tick: None,
            min_ticks: min_ticks as u32,
            max_ticks: max_ticks as u32,
            rejected_short: 0,
        }
    }

    pub fn step(&mut self, value: f32, threshold: f32, now: u64) -> Option<CycleHit> {
        let (kind, at) = self.extrema.step(value, threshold)?;
        if kind == Extremum::Min {
            self.last_min = Some(at);
            return None;
        }

        let min = self.last_min.take()?;
        let Some(prev) = self.last_cycle_tick else {
            self.last_cycle_tick = Some(now);
            return None;
        };

        let elapsed = now.saturating_sub(prev).min(u32::MAX as u64) as u32;
        self.last_cycle_tick = Some(now);
        if elapsed < self.min_ticks {
            // Tremor: restart timing so a fast oscillation never accumulates
            // into one long "cycle".
            self.rejected_short = self.rejected_short.saturating_add(1);
            return None;
        }
        if elapsed > self.max_ticks {
            // Drift after silence: this max only restarts the timing.
            return None;
        }

        Some(CycleHit {
            duration_ticks: elapsed,
            amplitude_g: (at - min) / 2.0,
        })
    }

    /// Re-arm after leaving the mopping position.
    pub fn reset(&mut self) {
        self.extrema.reset();
        self.last_min = None;
        self.last_cycle_tick = None;
    }

    /// Cycles rejected as faster than the plausible window.
    pub fn rejected_short(&self) -> u32 {
        self.rejected_short
    }
}

// ───────────────────────────────────────────────────────────────
// Gyro activity / sweep pattern
// ───────────────────────────────────────────────────────────────

/// Coarse sweep classification from gyro activity energy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepPattern {
    #[default]
    Unknown,
    /// Straight push/pull strokes (pitch/roll dominated).
    BackAndForth,
    /// Figure-eight strokes (yaw dominated).
    SShape,
}

/// Per-axis zero-cross detectors on the gyroscope with decaying energy.
#[derive(Debug, Clone)]
pub struct GyroActivity {
    axes: [AlternatingExtrema; 3],
    energy: [f32; 3],
    decay: f32,
    floor_dps: f32,
}

impl GyroActivity {
    pub fn new(decay: f32, floor_dps: f32) -> Self {
        Self {
            axes: Default::default(),
            energy: [0.0; 3],
            decay,
            floor_dps,
        }
    }

    pub fn step(&mut self, rates: [f32; 3]) {
        for ((detector, energy), rate) in self.axes.iter_mut().zip(self.energy.iter_mut()).zip(rates) {
            *energy *= self.decay;
            if let Some((_, at)) = detector.step(rate, self.floor_dps) {
                *energy += at.abs();
            }
        }
    }

    pub fn energy(&self) -> [f32; 3] {
        self.energy
    }

    /// Yaw energy versus pitch + roll decides the pattern; too little energy
    /// overall is `Unknown`.
    pub fn classify(&self, s_shape_ratio: f32) -> SweepPattern {
        let [x, y, z] = self.energy;
        if x + y + z < self.floor_dps {
            return SweepPattern::Unknown;
        }
        let ratio = z / (x + y).max(f32::EPSILON);
        if ratio > s_shape_ratio {
            SweepPattern::SShape
        } else {
            SweepPattern::BackAndForth
        }
    }
}
