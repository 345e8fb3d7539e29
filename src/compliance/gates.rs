//! Hygiene gates evaluated when a mop meets a room.
//!
//! | Gate  | Allowed when                                                 |
//! |-------|--------------------------------------------------------------|
//! | reuse | the mop has not been linked in a different room this shift  |
//! | color | `room.allowed_colors & mop.color != 0`                       |
//! | type  | `room.allowed_types & mop.type_group != 0`                   |
//!
//! Room id 0 or mop id 0 means "no context": every gate is
//! `NotApplicable`.

use crate::storage::{MopRecord, RoomRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Allowed,
    Disallowed,
    NotApplicable,
}

impl GateVerdict {
    fn from_bool(ok: bool) -> Self {
        if ok { Self::Allowed } else { Self::Disallowed }
    }

    pub fn is_disallowed(self) -> bool {
        self == Self::Disallowed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateReport {
    pub reuse: GateVerdict,
    pub color: GateVerdict,
    pub type_group: GateVerdict,
}

impl GateReport {
    pub const NOT_APPLICABLE: Self = Self {
        reuse: GateVerdict::NotApplicable,
        color: GateVerdict::NotApplicable,
        type_group: GateVerdict::NotApplicable,
    };

    /// Every gate passed.  `NotApplicable` never links.
    pub fn all_allowed(&self) -> bool {
        [self.reuse, self.color, self.type_group]
            .iter()
            .all(|v| *v == GateVerdict::Allowed)
    }
}

/// `previous_room` is the room the mop was last linked in this shift
/// (0 when never linked).
pub fn evaluate(room: &RoomRecord, mop: &MopRecord, previous_room: u16) -> GateReport {
    if room.room_id == 0 || mop.mop_id == 0 {
        return GateReport::NOT_APPLICABLE;
    }
    GateReport {
        reuse: GateVerdict::from_bool(previous_room == 0 || previous_room == room.room_id),
        color: GateVerdict::from_bool(room.allowed_colors & mop.color != 0),
        type_group: GateVerdict::from_bool(room.allowed_types & mop.type_group != 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: u16, colors: u8, types: u8) -> RoomRecord {
        RoomRecord {
            room_id: id,
            allowed_colors: colors,
            allowed_types: types,
            wall_tag_count: 4,
        }
    }

    fn mop(id: u16, color: u8, type_group: u8) -> MopRecord {
        MopRecord {
            mop_id: id,
            color,
            type_group,
            size: 1,
            sides: 2,
        }
    }

    #[test]
    fn matching_mop_passes_every_gate() {
        let r = evaluate(&room(5, 0x02, 0x01), &mop(9, 0x02, 0x01), 0);
        assert!(r.all_allowed());
    }

    #[test]
    fn wrong_color_fails_only_color() {
        let r = evaluate(&room(5, 0x02, 0x01), &mop(9, 0x04, 0x01), 0);
        assert_eq!(r.color, GateVerdict::Disallowed);
        assert_eq!(r.type_group, GateVerdict::Allowed);
        assert!(!r.all_allowed());
    }

    #[test]
    fn linked_elsewhere_fails_reuse() {
        let r = evaluate(&room(5, 0xFF, 0xFF), &mop(9, 0x01, 0x01), 3);
        assert_eq!(r.reuse, GateVerdict::Disallowed);
        let same = evaluate(&room(5, 0xFF, 0xFF), &mop(9, 0x01, 0x01), 5);
        assert_eq!(same.reuse, GateVerdict::Allowed);
    }

    #[test]
    fn zero_ids_are_not_applicable() {
        assert_eq!(
            evaluate(&room(0, 0xFF, 0xFF), &mop(9, 1, 1), 0),
            GateReport::NOT_APPLICABLE
        );
        let r = evaluate(&room(5, 0xFF, 0xFF), &mop(0, 1, 1), 0);
        assert_eq!(r, GateReport::NOT_APPLICABLE);
        assert!(!r.all_allowed());
    }
}
