//! Shared mutable context threaded through every motion-state handler.
//!
//! The recognizer writes the per-tick [`MotionObservation`] and records
//! confirmed cycles; the state handlers only read it back.  The recent
//! cycle timestamps are the activation window.

use heapless::Deque;

use crate::config::SystemConfig;

/// Depth of the activation window history (upper bound of `activation_cycles`).
pub const CYCLE_HISTORY: usize = 8;

/// What the recognizer saw this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionObservation {
    /// Filtered acceleration above the noise floor.
    pub moving: bool,
    /// Floor-handle angle inside the mopping range.
    pub in_position: bool,
    /// A cycle was confirmed on this tick.
    pub cycle_completed: bool,
    /// External inactivity signal (e.g. motion-wake line released).
    pub inactive: bool,
}

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    pub ticks_in_state: u64,
    pub total_ticks: u64,
    /// Recognizer tick of the current observation.
    pub now: u64,

    // -- Inputs --
    pub observation: MotionObservation,

    // -- Thresholds (copied from config) --
    pub activation_cycles: u8,
    pub activation_window_ticks: u64,
    pub max_cycle_ticks: u64,

    recent_cycles: Deque<u64, CYCLE_HISTORY>,
}

impl FsmContext {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            now: 0,
            observation: MotionObservation::default(),
            activation_cycles: config.activation_cycles,
            activation_window_ticks: config.activation_window_ticks as u64,
            max_cycle_ticks: config.max_cycle_ticks as u64,
            recent_cycles: Deque::new(),
        }
    }

    /// Remember a confirmed cycle, forgetting the oldest beyond the history depth.
    pub fn record_cycle(&mut self, now: u64) {
        if self.recent_cycles.is_full() {
            self.recent_cycles.pop_front();
        }
        // Cannot fail: a slot was just freed.
        let _ = self.recent_cycles.push_back(now);
    }

    /// Cycles confirmed within the activation window ending at `now`.
    pub fn cycles_in_window(&self, now: u64) -> usize {
        self.recent_cycles
            .iter()
            .filter(|&&t| now.saturating_sub(t) <= self.activation_window_ticks)
            .count()
    }

    /// Ticks since the most recent cycle, if any was recorded.
    pub fn ticks_since_last_cycle(&self, now: u64) -> Option<u64> {
        self.recent_cycles.back().map(|&t| now.saturating_sub(t))
    }

    pub fn clear_cycles(&mut self) {
        self.recent_cycles.clear();
    }

    /// Enough recent cycles, held in position, to count as mopping.
    pub fn activation_met(&self) -> bool {
        self.observation.in_position
            && self.cycles_in_window(self.now) >= self.activation_cycles as usize
    }
}
