//! Coverage estimation from confirmed mop cycles.
//!
//! A cycle's velocity proxy comes from its swing amplitude and period
//! (mean speed of a sinusoidal stroke), smoothed exponentially.  Area per
//! cycle is `velocity × duration × effective width`, attributed to the
//! installed mop and to the frame side that was down.

use core::f32::consts::PI;

use super::cycle::CycleHit;
use super::orientation::FrameSide;
use crate::config::SystemConfig;

/// Standard gravity (m/s²).
const G: f32 = 9.806_65;

/// One confirmed back-and-forth sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MopCycle {
    pub duration_ticks: u32,
    pub amplitude_g: f32,
    pub velocity_mps: f32,
    pub area_m2: f32,
    pub side: FrameSide,
}

#[derive(Debug, Clone)]
pub struct CoverageAccumulator {
    per_mop_m2: f32,
    per_side_m2: [f32; 2],
    shift_m2: f32,
    velocity: Option<f32>,
    cycles: u32,
    limit_reported: bool,
    alpha: f32,
    width_m: f32,
    tick_secs: f32,
    limit_m2: f32,
}

impl CoverageAccumulator {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            per_mop_m2: 0.0,
            per_side_m2: [0.0; 2],
            shift_m2: 0.0,
            velocity: None,
            cycles: 0,
            limit_reported: false,
            alpha: config.velocity_alpha,
            width_m: config.effective_width_m(),
            tick_secs: config.tick_secs(),
            limit_m2: config.coverage_limit_m2,
        }
    }

    /// Adopt new geometry and limits; accumulated area is kept.
    pub fn configure(&mut self, config: &SystemConfig) {
        self.alpha = config.velocity_alpha;
        self.width_m = config.effective_width_m();
        self.tick_secs = config.tick_secs();
        self.limit_m2 = config.coverage_limit_m2;
    }

    /// Account one cycle.  Returns the cycle record and whether the per-mop
    /// coverage limit was crossed by it.
    pub fn add_cycle(&mut self, hit: CycleHit, side: FrameSide) -> (MopCycle, bool) {
        let period_s = hit.duration_ticks as f32 * self.tick_secs;
        // Sinusoidal stroke: v_peak = a_peak / ω, mean |v| = 2/π · v_peak.
        let omega = 2.0 * PI / period_s.max(f32::EPSILON);
        let raw_velocity = 2.0 / PI * (hit.amplitude_g.abs() * G) / omega;

        let velocity = match self.velocity {
            Some(prev) => prev + self.alpha * (raw_velocity - prev),
            None => raw_velocity,
        };
        self.velocity = Some(velocity);

        let area = velocity * period_s * self.width_m;
        self.per_mop_m2 += area;
        self.per_side_m2[side.index()] += area;
        self.shift_m2 += area;
        self.cycles = self.cycles.saturating_add(1);

        let crossed = !self.limit_reported && self.per_mop_m2 >= self.limit_m2;
        if crossed {
            self.limit_reported = true;
        }

        (
            MopCycle {
                duration_ticks: hit.duration_ticks,
                amplitude_g: hit.amplitude_g,
                velocity_mps: velocity,
                area_m2: area,
                side,
            },
            crossed,
        )
    }

    /// Start accounting for a freshly installed mop.
    pub fn reset_mop(&mut self) {
        self.per_mop_m2 = 0.0;
        self.per_side_m2 = [0.0; 2];
        self.limit_reported = false;
    }

    /// Shift boundary: everything starts over.
    pub fn reset_shift(&mut self) {
        self.reset_mop();
        self.shift_m2 = 0.0;
        self.velocity = None;
        self.cycles = 0;
    }

    pub fn per_mop_m2(&self) -> f32 {
        self.per_mop_m2
    }

    pub fn per_side_m2(&self) -> [f32; 2] {
        self.per_side_m2
    }

    pub fn shift_m2(&self) -> f32 {
        self.shift_m2
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn velocity_mps(&self) -> f32 {
        self.velocity.unwrap_or(0.0)
    }
}
