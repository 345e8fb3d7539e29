//! Tagless mop-swap inference.
//!
//! A long mopping run with no chip read at all, having covered enough area
//! for one mop, suggests the operator swapped in a mop without a tag.  Each
//! inference opens a fresh silence window, so a chipless run keeps inferring
//! one swap per window while coverage builds up again.  Any chip read also
//! restarts the window.

use crate::config::SystemConfig;
use crate::motion::MotionSnapshot;

#[derive(Debug, Clone)]
pub struct UnchippedDetector {
    window_start: u64,
    inferred: u32,
    silence_ticks: u64,
    coverage_m2: f32,
}

impl UnchippedDetector {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            window_start: 0,
            inferred: 0,
            silence_ticks: config.unchipped_silence_ticks as u64,
            coverage_m2: config.unchipped_coverage_m2,
        }
    }

    pub fn configure(&mut self, config: &SystemConfig) {
        self.silence_ticks = config.unchipped_silence_ticks as u64;
        self.coverage_m2 = config.unchipped_coverage_m2;
    }

    pub fn on_chip_read(&mut self, now: u64) {
        self.window_start = now;
    }

    /// Returns the covered area when a tagless swap is inferred on this tick.
    pub fn check(&mut self, now: u64, motion: &MotionSnapshot) -> Option<f32> {
        if !motion.mopping() {
            return None;
        }
        let silent = now.saturating_sub(self.window_start) >= self.silence_ticks;
        if silent && motion.per_mop_coverage_m2 >= self.coverage_m2 {
            self.window_start = now;
            self.inferred = self.inferred.saturating_add(1);
            return Some(motion.per_mop_coverage_m2);
        }
        None
    }

    /// Start a fresh silence window (shift boundary).
    pub fn reset(&mut self, now: u64) {
        self.on_chip_read(now);
    }

    /// Swaps inferred since construction.
    pub fn inferred(&self) -> u32 {
        self.inferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::MotionState;

    fn mopping(coverage: f32) -> MotionSnapshot {
        MotionSnapshot {
            state: MotionState::Mopping,
            per_mop_coverage_m2: coverage,
            ..Default::default()
        }
    }

    fn detector() -> UnchippedDetector {
        UnchippedDetector::new(&SystemConfig {
            unchipped_silence_ticks: 1000,
            unchipped_coverage_m2: 10.0,
            ..Default::default()
        })
    }

    #[test]
    fn fires_after_silence_and_coverage() {
        let mut d = detector();
        assert_eq!(d.check(999, &mopping(12.0)), None);
        assert_eq!(d.check(1000, &mopping(12.0)), Some(12.0));
        assert_eq!(d.check(1001, &mopping(15.0)), None);
    }

    #[test]
    fn needs_mopping_and_coverage() {
        let mut d = detector();
        let moving = MotionSnapshot {
            state: MotionState::Moving,
            per_mop_coverage_m2: 50.0,
            ..Default::default()
        };
        assert_eq!(d.check(5000, &moving), None);
        assert_eq!(d.check(5000, &mopping(9.0)), None);
    }

    #[test]
    fn chip_read_restarts_the_window() {
        let mut d = detector();
        d.on_chip_read(500);
        assert_eq!(d.check(1000, &mopping(11.0)), None);
        assert_eq!(d.check(1499, &mopping(11.0)), None);
        assert!(d.check(1500, &mopping(11.0)).is_some());
    }

    #[test]
    fn chipless_run_infers_each_window() {
        let mut d = detector();
        assert_eq!(d.check(1000, &mopping(10.0)), Some(10.0));
        // Coverage restarted by the service after the first inference.
        assert_eq!(d.check(1500, &mopping(4.0)), None);
        assert_eq!(d.check(1999, &mopping(10.5)), None);
        assert_eq!(d.check(2000, &mopping(10.5)), Some(10.5));
        assert_eq!(d.inferred(), 2);
    }
}
