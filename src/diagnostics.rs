//! Runtime diagnostics counters.
//!
//! The periodic paths never return errors; whatever goes wrong there lands
//! in one of these counters instead.  The snapshot is part of every
//! telemetry report.

use serde::{Deserialize, Serialize};

use crate::storage::SearchResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    // -- Tag stream --
    pub frames_decoded: u32,
    pub empty_frames: u32,
    pub frame_overflows: u32,
    pub ring_full_drops: u32,

    // -- Lookups --
    pub unknown_tags: u32,
    pub flash_errors: u32,
    pub search_cap_hits: u32,
    pub worst_search_iterations: u8,
    pub order_violations: u32,

    // -- Compliance --
    pub debounce_rejects: u32,
    pub unchipped_swaps: u32,
    pub link_timeouts: u32,

    // -- Motion --
    pub rejected_short_cycles: u32,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one lookup's probe statistics in.
    pub fn record_search(&mut self, result: &SearchResult) {
        if result.capped {
            self.search_cap_hits = self.search_cap_hits.saturating_add(1);
        }
        self.worst_search_iterations = self.worst_search_iterations.max(result.iterations);
    }

    pub fn record_flash_error(&mut self) {
        self.flash_errors = self.flash_errors.saturating_add(1);
    }

    pub fn record_unknown_tag(&mut self) {
        self.unknown_tags = self.unknown_tags.saturating_add(1);
    }
}
