//! Inbound commands to the application service.
//!
//! These are the administrative actions a provisioning tool or shell would
//! request.  The [`AppService`](super::service::AppService) interprets them
//! and answers with a [`CommandReply`].

use crate::config::SystemConfig;
use crate::rfid::TagId;
use crate::storage::{MopRecord, RfidRecord, RoomRecord, SearchResult};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Append a tag record (keys must ascend).
    InsertRfid(RfidRecord),
    InsertRoom(RoomRecord),
    InsertMop(MopRecord),

    /// Look a tag up without acting on it.
    SearchTag(TagId),

    /// Forget every last-seen tag and mop.
    ClearCaches,

    /// Shift boundaries reset links, caches and per-shift coverage.
    ShiftStart,
    ShiftEnd,

    /// The mop frame was detached from the handle.
    FrameLifted,
    /// The frame is back on the handle; the room in context is re-gated.
    FrameSeated,

    /// Hot-reload configuration.  Rejected if it fails validation.
    UpdateConfig(SystemConfig),

    /// Count order violations in every record region.
    VerifyDatabase,
}

/// Result of a successfully handled command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    Done,
    /// Index at which a record was stored.
    Inserted(u32),
    Search {
        result: SearchResult,
        record: Option<RfidRecord>,
    },
    OrderViolations(u32),
}
