//! Outbound application events and notification intents.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port, timestamped with the
//! recognizer tick.  Notification intents derived from them go to the
//! [`NotifySink`](super::ports::NotifySink); rendering them as LED or
//! buzzer patterns happens on the other side.

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::fsm::MotionState;
use crate::motion::MotionSnapshot;
use crate::motion::orientation::FrameSide;
use crate::rfid::TagId;

/// Why the room↔mop link was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkResetReason {
    FrameLifted,
    MopChanged,
    ShiftBoundary,
    RefreshTimeout,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AppEvent {
    /// The service has started.
    Started,

    // ── Motion ────────────────────────────────────────────
    MotionChanged { from: MotionState, to: MotionState },
    FrameFlipped { side: FrameSide },
    /// Per-mop coverage reached the configured limit (once per mop).
    CoverageThresholdReached { mop_id: u16, coverage_m2: f32 },

    // ── Room / mop context ────────────────────────────────
    RoomChanged { from: u16, to: u16 },
    MopChanged { from: u16, to: u16 },
    MopLinked { room_id: u16, mop_id: u16 },
    /// The link was torn down; ids are those of the link that ended.
    LinkReset { reason: LinkResetReason, room_id: u16, mop_id: u16 },
    /// The linked mop stopped answering.
    MopRemoved { mop_id: u16 },

    // ── Compliance violations ─────────────────────────────
    MopUsedElsewhere { mop_id: u16, room_id: u16, previous_room_id: u16 },
    ColorDisallowed { room_id: u16, mop_id: u16, color: u8, allowed: u8 },
    TypeDisallowed { room_id: u16, mop_id: u16, type_group: u8, allowed: u8 },
    /// A mop that already cleaned a room this shift was installed again.
    MopReused { mop_id: u16, previous_room_id: u16 },
    UnchippedSwapInferred { coverage_m2: f32 },

    /// A decoded tag has no record.
    UnknownTag { tag: TagId },

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// Notification intents, in rough priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum NotifyCode {
    WrongRoom = 1,
    WrongColor = 2,
    WrongType = 3,
    MopReused = 4,
    ReplaceMop = 5,
    MopLost = 10,
    MopAccepted = 20,
    Linked = 21,
    RoomEntered = 22,
}

impl NotifyCode {
    /// The intent an event maps to, if it deserves one.
    pub fn for_event(event: &AppEvent) -> Option<Self> {
        match event {
            AppEvent::MopUsedElsewhere { .. } => Some(Self::WrongRoom),
            AppEvent::ColorDisallowed { .. } => Some(Self::WrongColor),
            AppEvent::TypeDisallowed { .. } => Some(Self::WrongType),
            AppEvent::MopReused { .. } => Some(Self::MopReused),
            AppEvent::CoverageThresholdReached { .. } | AppEvent::UnchippedSwapInferred { .. } => {
                Some(Self::ReplaceMop)
            }
            AppEvent::MopRemoved { .. } => Some(Self::MopLost),
            AppEvent::MopChanged { .. } => Some(Self::MopAccepted),
            AppEvent::MopLinked { .. } => Some(Self::Linked),
            AppEvent::RoomChanged { .. } => Some(Self::RoomEntered),
            _ => None,
        }
    }
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    pub tick: u64,
    pub motion: MotionSnapshot,
    pub per_side_m2: [f32; 2],
    pub shift_m2: f32,
    pub room_id: u16,
    pub mop_id: u16,
    pub linked_mop_id: u16,
    pub pending_tags: u16,
    pub diagnostics: Diagnostics,
}
