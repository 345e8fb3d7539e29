//! System configuration parameters
//!
//! All tunable thresholds, debounce counts, mop geometry and timing windows
//! for the recognizer, the tag decoder and the compliance engine.  The
//! config is injected into each component at construction; nothing here is
//! global.  Every window is expressed in recognizer ticks.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Motion filter ---
    /// Recognizer tick period in milliseconds (inertial sample rate).
    pub tick_period_ms: u16,
    /// Exponential weight of the gravity-magnitude baseline (0–1).
    pub gravity_alpha: f32,
    /// Per-tick decay applied to the peak follower (0–1).
    pub peak_decay: f32,
    /// Fraction of the followed peak used as detection threshold.
    pub threshold_fraction: f32,
    /// Lower bound of the adaptive threshold, in g.
    pub noise_floor_g: f32,

    // --- Cycle window ---
    /// Shortest plausible mop cycle (ticks).  Faster = tremor.
    pub min_cycle_ticks: u16,
    /// Longest plausible mop cycle (ticks).  Slower = drift.
    pub max_cycle_ticks: u16,
    /// Exponential weight of the velocity proxy smoothing (0–1).
    pub velocity_alpha: f32,

    // --- Activation ---
    /// Confirmed cycles required inside the activation window to enter Mopping.
    pub activation_cycles: u8,
    /// Width of the activation window (ticks).
    pub activation_window_ticks: u16,

    // --- Orientation ---
    /// Exponential weight of the orientation-angle smoothing (0–1).
    pub angle_alpha: f32,
    /// Lower bound of the floor-handle angle for the mopping position (deg).
    pub mop_angle_min_deg: f32,
    /// Upper bound of the floor-handle angle for the mopping position (deg).
    pub mop_angle_max_deg: f32,
    /// Magnetic field magnitude below which the frame angle is held (gauss).
    pub mag_noise_floor: f32,
    /// Frame-handle angle beyond which a side flip is considered (deg).
    pub flip_angle_deg: f32,
    /// Minimum ticks between two accepted frame flips.
    pub flip_cooldown_ticks: u16,

    // --- Sweep classification ---
    /// Per-tick decay of the gyro activity energy (0–1).
    pub energy_decay: f32,
    /// Yaw / (pitch + roll) energy ratio above which a sweep is an S-shape.
    pub s_shape_ratio: f32,
    /// Gyro rate below which an extremum is ignored (deg/s).
    pub gyro_noise_floor_dps: f32,

    // --- Coverage geometry ---
    /// Physical mop width (m).
    pub mop_width_m: f32,
    /// Fraction of each stroke overlapping the previous one (0–1).
    pub overlap_fraction: f32,
    /// Per-mop coverage at which the coverage-limit event fires (m²).
    pub coverage_limit_m2: f32,

    // --- RFID decoder ---
    /// Byte that opens a reader frame.
    pub frame_start: u8,
    /// Two-byte sequence that closes a reader frame.
    pub frame_terminator: [u8; 2],
    /// Envelope bytes trimmed before the EPC.
    pub envelope_prefix_len: u8,
    /// Envelope bytes trimmed after the EPC.
    pub envelope_suffix_len: u8,

    // --- Compliance ---
    /// Consecutive identical mop-tag reads required to accept a swap.
    pub mop_debounce_reads: u8,
    /// The linked mop must be re-read within this many ticks.
    pub link_refresh_ticks: u32,
    /// Mopping ticks without any chip read before a tagless swap is inferred.
    pub unchipped_silence_ticks: u32,
    /// Coverage required before a tagless swap is inferred (m²).
    pub unchipped_coverage_m2: f32,
    /// Emit an `UnknownTag` event for tags absent from the database.
    pub report_unknown_tags: bool,

    // --- Storage ---
    /// Hard cap on binary-search probes per lookup.
    pub search_iteration_cap: u8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Motion filter
            tick_period_ms: 20, // 50 Hz
            gravity_alpha: 0.02,
            peak_decay: 0.995,
            threshold_fraction: 0.4,
            noise_floor_g: 0.05,

            // Cycle window
            min_cycle_ticks: 10,  // 0.2 s
            max_cycle_ticks: 100, // 2 s
            velocity_alpha: 0.3,

            // Activation
            activation_cycles: 3,
            activation_window_ticks: 250, // 5 s

            // Orientation
            angle_alpha: 0.1,
            mop_angle_min_deg: 15.0,
            mop_angle_max_deg: 75.0,
            mag_noise_floor: 0.1,
            flip_angle_deg: 60.0,
            flip_cooldown_ticks: 100,

            // Sweep classification
            energy_decay: 0.998,
            s_shape_ratio: 0.6,
            gyro_noise_floor_dps: 5.0,

            // Coverage geometry
            mop_width_m: 0.40,
            overlap_fraction: 0.10,
            coverage_limit_m2: 40.0,

            // RFID decoder
            frame_start: 0x02,
            frame_terminator: *b"\r\n",
            envelope_prefix_len: 5,
            envelope_suffix_len: 4,

            // Compliance
            mop_debounce_reads: 3,
            link_refresh_ticks: 30_000,      // 10 min
            unchipped_silence_ticks: 45_000, // 15 min
            unchipped_coverage_m2: 20.0,
            report_unknown_tags: true,

            // Storage
            search_iteration_cap: 30,
        }
    }
}

impl SystemConfig {
    /// Duration of one recognizer tick in seconds.
    pub fn tick_secs(&self) -> f32 {
        self.tick_period_ms as f32 / 1000.0
    }

    /// Mop width actually laid down per stroke after overlap.
    pub fn effective_width_m(&self) -> f32 {
        self.mop_width_m * (1.0 - self.overlap_fraction)
    }

    /// Range-check every field.  Out-of-range values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1000).contains(&self.tick_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "tick_period_ms must be 1–1000",
            ));
        }
        for (value, msg) in [
            (self.gravity_alpha, "gravity_alpha must be in (0, 1]"),
            (self.velocity_alpha, "velocity_alpha must be in (0, 1]"),
            (self.angle_alpha, "angle_alpha must be in (0, 1]"),
            (self.threshold_fraction, "threshold_fraction must be in (0, 1]"),
            (self.peak_decay, "peak_decay must be in (0, 1]"),
            (self.energy_decay, "energy_decay must be in (0, 1]"),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::ValidationFailed(msg));
            }
        }
        if !(self.noise_floor_g > 0.0) {
            return Err(ConfigError::ValidationFailed("noise_floor_g must be > 0"));
        }
        if self.min_cycle_ticks == 0 || self.min_cycle_ticks >= self.max_cycle_ticks {
            return Err(ConfigError::ValidationFailed(
                "min_cycle_ticks must be > 0 and < max_cycle_ticks",
            ));
        }
        if self.activation_cycles == 0 || self.activation_cycles as usize > crate::fsm::context::CYCLE_HISTORY {
            return Err(ConfigError::ValidationFailed(
                "activation_cycles must be 1–8",
            ));
        }
        if self.activation_window_ticks < self.max_cycle_ticks {
            return Err(ConfigError::ValidationFailed(
                "activation_window_ticks must be ≥ max_cycle_ticks",
            ));
        }
        if !(0.0..=90.0).contains(&self.mop_angle_min_deg)
            || !(0.0..=90.0).contains(&self.mop_angle_max_deg)
            || self.mop_angle_min_deg >= self.mop_angle_max_deg
        {
            return Err(ConfigError::ValidationFailed(
                "mop angle range must be an increasing span within 0–90°",
            ));
        }
        if !(0.0..=180.0).contains(&self.flip_angle_deg) {
            return Err(ConfigError::ValidationFailed(
                "flip_angle_deg must be 0–180",
            ));
        }
        if !(0.05..=2.0).contains(&self.mop_width_m) {
            return Err(ConfigError::ValidationFailed("mop_width_m must be 0.05–2.0"));
        }
        if !(0.0..1.0).contains(&self.overlap_fraction) {
            return Err(ConfigError::ValidationFailed(
                "overlap_fraction must be in [0, 1)",
            ));
        }
        if !(self.coverage_limit_m2 > 0.0) || !(self.unchipped_coverage_m2 > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "coverage thresholds must be > 0",
            ));
        }
        if self.frame_terminator.contains(&self.frame_start) {
            return Err(ConfigError::ValidationFailed(
                "frame_start must not appear in frame_terminator",
            ));
        }
        if self.mop_debounce_reads == 0 {
            return Err(ConfigError::ValidationFailed(
                "mop_debounce_reads must be ≥ 1",
            ));
        }
        if self.unchipped_silence_ticks == 0 {
            return Err(ConfigError::ValidationFailed(
                "unchipped_silence_ticks must be > 0",
            ));
        }
        if self.link_refresh_ticks == 0 {
            return Err(ConfigError::ValidationFailed(
                "link_refresh_ticks must be > 0",
            ));
        }
        if !(1..=32).contains(&self.search_iteration_cap) {
            return Err(ConfigError::ValidationFailed(
                "search_iteration_cap must be 1–32",
            ));
        }
        Ok(())
    }
}
