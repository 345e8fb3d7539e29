//! Room↔mop link and the mop-tag debounce.

use crate::rfid::TagId;

/// At most one room is linked to at most one mop.  Mop id 0 = unlinked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomMopLink {
    pub room_id: u16,
    pub mop_id: u16,
    pub previous_mop_id: u16,
    pub linked_at: u64,
    last_refresh: u64,
}

impl RoomMopLink {
    pub fn is_linked(&self) -> bool {
        self.mop_id != 0
    }

    /// Establish the link.  Sticky: an existing link is left alone and
    /// `false` is returned.
    pub fn link(&mut self, room_id: u16, mop_id: u16, now: u64) -> bool {
        if self.is_linked() || room_id == 0 || mop_id == 0 {
            return false;
        }
        self.room_id = room_id;
        self.mop_id = mop_id;
        self.linked_at = now;
        self.last_refresh = now;
        true
    }

    /// The linked mop was read again.
    pub fn refresh(&mut self, mop_id: u16, now: u64) {
        if self.is_linked() && self.mop_id == mop_id {
            self.last_refresh = now;
        }
    }

    /// No refresh for longer than `timeout` ticks.
    pub fn expired(&self, now: u64, timeout: u32) -> bool {
        self.is_linked() && now.saturating_sub(self.last_refresh) > timeout as u64
    }

    /// Tear the link down.  Returns the `(room, mop)` that was linked.
    pub fn reset(&mut self) -> Option<(u16, u16)> {
        if !self.is_linked() {
            return None;
        }
        let ended = (self.room_id, self.mop_id);
        *self = Self {
            previous_mop_id: self.mop_id,
            ..Self::default()
        };
        Some(ended)
    }
}

/// Counts consecutive identical mop-tag reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MopDebounce {
    candidate: Option<TagId>,
    count: u8,
}

/// Result of one debounced read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceStep {
    /// Still counting.
    Pending,
    /// The required count was reached on exactly this read.
    Accepted,
    /// A different candidate replaced an unfinished one.
    Restarted,
}

impl MopDebounce {
    pub fn step(&mut self, tag: TagId, required: u8) -> DebounceStep {
        if self.candidate == Some(tag) {
            self.count = self.count.saturating_add(1);
            return if self.count == required {
                DebounceStep::Accepted
            } else {
                DebounceStep::Pending
            };
        }
        let restarted = self.candidate.is_some();
        self.candidate = Some(tag);
        self.count = 1;
        if required <= 1 {
            DebounceStep::Accepted
        } else if restarted {
            DebounceStep::Restarted
        } else {
            DebounceStep::Pending
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn count(&self) -> u8 {
        self.count
    }
}
