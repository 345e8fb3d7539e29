//! Inertial signal conditioning.
//!
//! Fixed-depth circular buffers per axis, the 7-tap weighted low-pass used
//! on the gravity-removed acceleration magnitude, and the decaying peak
//! follower that drives the adaptive detection threshold.  Everything is
//! O(1) or O(depth) per tick with no allocation.

use super::Vec3;

/// Depth of the per-axis moving-average windows.
pub const AXIS_WINDOW: usize = 8;

/// Weights of the fixed 7-tap low-pass (symmetric triangle, sum = 16).
const FIR_TAPS: [f32; 7] = [1.0, 2.0, 3.0, 4.0, 3.0, 2.0, 1.0];
const FIR_GAIN: f32 = 16.0;

/// Replace NaN/∞ with zero so a garbled sample saturates instead of
/// poisoning every downstream filter.
pub fn sanitize(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

/// [`sanitize`], then clamp to the sensor's full-scale range.
pub fn saturate(v: f32, full_scale: f32) -> f32 {
    sanitize(v).clamp(-full_scale, full_scale)
}

// ───────────────────────────────────────────────────────────────
// Per-axis circular buffer
// ───────────────────────────────────────────────────────────────

/// Fixed-depth circular buffer.  The mean is summed from the ring on every
/// read so one outlier cannot leave rounding residue behind once it has
/// been shifted out.
#[derive(Debug, Clone)]
pub struct AxisWindow<const N: usize> {
    ring: [f32; N],
    head: usize,
    count: usize,
}

impl<const N: usize> AxisWindow<N> {
    pub const fn new() -> Self {
        Self {
            ring: [0.0; N],
            head: 0,
            count: 0,
        }
    }

    /// Shift `value` in, dropping the oldest sample once full.
    pub fn push(&mut self, value: f32) {
        if self.count < N {
            self.count += 1;
        }
        self.ring[self.head] = sanitize(value);
        self.head = (self.head + 1) % N;
    }

    pub fn mean(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        // Unfilled slots hold 0.0.
        self.ring.iter().sum::<f32>() / self.count as f32
    }

    pub fn is_full(&self) -> bool {
        self.count == N
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl<const N: usize> Default for AxisWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Three [`AxisWindow`]s, one per axis of a vector sensor.
#[derive(Debug, Clone, Default)]
pub struct Vec3Window {
    x: AxisWindow<AXIS_WINDOW>,
    y: AxisWindow<AXIS_WINDOW>,
    z: AxisWindow<AXIS_WINDOW>,
}

impl Vec3Window {
    pub fn push(&mut self, v: Vec3) {
        self.x.push(v.x);
        self.y.push(v.y);
        self.z.push(v.z);
    }

    pub fn mean(&self) -> Vec3 {
        Vec3::new(self.x.mean(), self.y.mean(), self.z.mean())
    }
}

// ───────────────────────────────────────────────────────────────
// 7-tap weighted low-pass
// ───────────────────────────────────────────────────────────────

/// Fixed 7-tap FIR low-pass over the most recent inputs.
#[derive(Debug, Clone, Default)]
pub struct FirLowPass {
    history: [f32; 7],
    head: usize,
}

impl FirLowPass {
    /// Push one input and return the filtered output.
    pub fn step(&mut self, input: f32) -> f32 {
        self.history[self.head] = sanitize(input);
        self.head = (self.head + 1) % FIR_TAPS.len();

        // Oldest sample sits at `head` after the advance.
        let mut acc = 0.0;
        for (i, tap) in FIR_TAPS.iter().enumerate() {
            acc += tap * self.history[(self.head + i) % FIR_TAPS.len()];
        }
        acc / FIR_GAIN
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ───────────────────────────────────────────────────────────────
// Gravity baseline
// ───────────────────────────────────────────────────────────────

/// Slow exponential estimate of the static acceleration magnitude.
#[derive(Debug, Clone)]
pub struct GravityBaseline {
    alpha: f32,
    value: Option<f32>,
}

impl GravityBaseline {
    pub fn new(alpha: f32) -> Self {
        Self { alpha, value: None }
    }

    /// Feed a magnitude and return the AC part (magnitude − baseline).
    /// The first call seeds the baseline so start-up is not a step.
    pub fn remove(&mut self, magnitude: f32) -> f32 {
        let magnitude = sanitize(magnitude);
        let base = match self.value {
            Some(b) => b + self.alpha * (magnitude - b),
            None => magnitude,
        };
        self.value = Some(base);
        magnitude - base
    }

    pub fn value(&self) -> f32 {
        self.value.unwrap_or(0.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Peak follower / adaptive threshold
// ───────────────────────────────────────────────────────────────

/// Decaying maximum of the filtered signal's magnitude.
#[derive(Debug, Clone)]
pub struct PeakFollower {
    decay: f32,
    peak: f32,
}

impl PeakFollower {
    pub fn new(decay: f32) -> Self {
        Self { decay, peak: 0.0 }
    }

    pub fn update(&mut self, value: f32) -> f32 {
        self.peak = (self.peak * self.decay).max(sanitize(value).abs());
        self.peak
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// The detection threshold: a fraction of the peak, never below the
    /// noise floor.
    pub fn threshold(&self, fraction: f32, floor: f32) -> f32 {
        (self.peak * fraction).max(floor)
    }
}
