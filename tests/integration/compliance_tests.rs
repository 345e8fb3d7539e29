//! End-to-end room/mop compliance: reader bytes → decoder → ring →
//! compliance engine → events and notification intents.

use mopguard::adapters::memory_flash::MemoryFlash;
use mopguard::app::commands::AppCommand;
use mopguard::app::events::{AppEvent, LinkResetReason, NotifyCode};
use mopguard::app::service::AppService;
use mopguard::config::SystemConfig;

use crate::mock_hw::{
    MOP_BLUE, MOP_RED, ROOM_KITCHEN, ROOM_WARD, RecordingNotify, RecordingSink, frame,
    provisioned_flash, tag,
};

struct Rig {
    app: AppService<MemoryFlash>,
    sink: RecordingSink,
    notify: RecordingNotify,
}

impl Rig {
    fn new() -> Self {
        let mut app = AppService::new(SystemConfig::default(), provisioned_flash(), None).unwrap();
        let mut sink = RecordingSink::new();
        app.start(&mut sink);
        Self {
            app,
            sink,
            notify: RecordingNotify::default(),
        }
    }

    fn read(&mut self, epc: &str) {
        assert_eq!(self.app.ingest_bytes(&frame(epc)), 1);
        self.app.poll_tags(&mut self.sink, &mut self.notify);
    }

    fn read_n(&mut self, epc: &str, n: u8) {
        for _ in 0..n {
            self.read(epc);
        }
    }

    fn install(&mut self, epc: &str) {
        self.read_n(epc, SystemConfig::default().mop_debounce_reads);
    }

    fn command(&mut self, cmd: AppCommand) {
        self.app
            .handle_command(cmd, &mut self.sink, &mut self.notify)
            .unwrap();
    }
}

fn mop_changes(sink: &RecordingSink) -> usize {
    sink.count(|e| matches!(e, AppEvent::MopChanged { .. }))
}

// ── Debounce ──────────────────────────────────────────────────

#[test]
fn mop_swap_fires_on_the_nth_identical_read() {
    let mut rig = Rig::new();
    let n = SystemConfig::default().mop_debounce_reads;

    rig.read_n("M09", n - 1);
    assert_eq!(mop_changes(&rig.sink), 0, "N-1 reads must not swap");

    rig.read("M09");
    assert!(rig.sink.contains(&AppEvent::MopChanged {
        from: 0,
        to: MOP_BLUE
    }));
    assert_eq!(rig.notify.codes, vec![NotifyCode::MopAccepted]);

    rig.read_n("M09", 5);
    assert_eq!(mop_changes(&rig.sink), 1, "re-reads of the installed mop are quiet");
}

#[test]
fn interleaved_mop_reads_restart_the_count() {
    let mut rig = Rig::new();
    rig.read_n("M09", 2);
    rig.read("M10");
    rig.read_n("M09", 2);
    assert_eq!(mop_changes(&rig.sink), 0);
    assert!(rig.app.diagnostics().debounce_rejects >= 1);
}

// ── Gates and link ────────────────────────────────────────────

#[test]
fn matching_mop_links_to_wall_room() {
    let mut rig = Rig::new();
    rig.install("M09");
    rig.read("W05");

    assert!(rig.sink.contains(&AppEvent::RoomChanged {
        from: 0,
        to: ROOM_KITCHEN
    }));
    assert!(rig.sink.contains(&AppEvent::MopLinked {
        room_id: ROOM_KITCHEN,
        mop_id: MOP_BLUE
    }));
    assert!(rig.notify.codes.contains(&NotifyCode::Linked));
    assert_eq!(rig.app.compliance().link().room_id, ROOM_KITCHEN);
    assert_eq!(rig.app.build_telemetry().linked_mop_id, MOP_BLUE);
}

#[test]
fn mop_installed_after_wall_read_links() {
    let mut rig = Rig::new();
    rig.read("W05");
    rig.install("M09");

    assert!(rig.sink.contains(&AppEvent::MopChanged {
        from: 0,
        to: MOP_BLUE
    }));
    assert!(rig.sink.contains(&AppEvent::MopLinked {
        room_id: ROOM_KITCHEN,
        mop_id: MOP_BLUE
    }));
    assert!(rig.notify.codes.contains(&NotifyCode::Linked));
    assert!(rig.app.compliance().link().is_linked());
    assert_eq!(rig.app.build_telemetry().linked_mop_id, MOP_BLUE);
}

#[test]
fn wrong_color_is_flagged_and_not_linked() {
    let mut rig = Rig::new();
    rig.install("M10");
    rig.read("W05");

    assert!(rig.sink.contains(&AppEvent::ColorDisallowed {
        room_id: ROOM_KITCHEN,
        mop_id: MOP_RED,
        color: 0x04,
        allowed: 0x02,
    }));
    assert!(rig.notify.codes.contains(&NotifyCode::WrongColor));
    assert!(!rig.app.compliance().link().is_linked());

    // The same wall again does not repeat the violation.
    let before = rig.sink.events.len();
    rig.read("W05");
    assert_eq!(rig.sink.events.len(), before);
}

#[test]
fn same_mop_in_second_room_is_reuse() {
    let mut rig = Rig::new();
    rig.install("M09");
    rig.read("W05");
    rig.read("W06");

    assert!(rig.sink.contains(&AppEvent::MopUsedElsewhere {
        mop_id: MOP_BLUE,
        room_id: ROOM_WARD,
        previous_room_id: ROOM_KITCHEN,
    }));
    assert!(rig.notify.codes.contains(&NotifyCode::WrongRoom));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::MopLinked { .. })),
        1,
        "the first link is sticky"
    );
}

#[test]
fn shift_boundary_forgets_previous_rooms() {
    let mut rig = Rig::new();
    rig.install("M09");
    rig.read("W05");
    rig.command(AppCommand::ShiftEnd);

    assert!(rig.sink.contains(&AppEvent::LinkReset {
        reason: LinkResetReason::ShiftBoundary,
        room_id: ROOM_KITCHEN,
        mop_id: MOP_BLUE,
    }));

    rig.command(AppCommand::ShiftStart);
    rig.read("W06");
    assert!(rig.sink.contains(&AppEvent::MopLinked {
        room_id: ROOM_WARD,
        mop_id: MOP_BLUE
    }));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::MopUsedElsewhere { .. })),
        0
    );
}

#[test]
fn reinstalled_mop_is_reported_reused() {
    let mut rig = Rig::new();
    rig.install("M09");
    rig.read("W05");
    rig.install("M10");
    rig.install("M09");

    assert!(rig.sink.contains(&AppEvent::MopReused {
        mop_id: MOP_BLUE,
        previous_room_id: ROOM_KITCHEN,
    }));
    assert!(rig.notify.codes.contains(&NotifyCode::MopReused));
}

#[test]
fn frame_lift_resets_link() {
    let mut rig = Rig::new();
    rig.install("M09");
    rig.read("W05");
    rig.command(AppCommand::FrameLifted);

    assert!(rig.sink.contains(&AppEvent::LinkReset {
        reason: LinkResetReason::FrameLifted,
        room_id: ROOM_KITCHEN,
        mop_id: MOP_BLUE,
    }));
    assert!(!rig.app.compliance().link().is_linked());
}

#[test]
fn warning_tag_reports_without_changing_context() {
    let mut rig = Rig::new();
    rig.install("M09");
    rig.read("W05");
    rig.read("X06");

    assert_eq!(rig.app.compliance().room_id(), ROOM_KITCHEN);
    assert_eq!(rig.app.compliance().link().room_id, ROOM_KITCHEN);
}

// ── Tag stream faults ─────────────────────────────────────────

#[test]
fn unknown_tag_is_reported_and_counted() {
    let mut rig = Rig::new();
    rig.read("NOPE");
    assert!(rig.sink.contains(&AppEvent::UnknownTag { tag: tag("NOPE") }));
    assert_eq!(rig.app.diagnostics().unknown_tags, 1);
}

#[test]
fn noise_between_frames_is_ignored() {
    let mut rig = Rig::new();
    let mut bytes = b"garbage\r\n".to_vec();
    bytes.extend(frame("W05"));
    bytes.extend_from_slice(b"\xFF\xFE");
    assert_eq!(rig.app.ingest_bytes(&bytes), 1);
    assert_eq!(rig.app.poll_tags(&mut rig.sink, &mut rig.notify), 1);
    assert_eq!(rig.app.compliance().room_id(), ROOM_KITCHEN);
}

#[test]
fn burst_beyond_ring_capacity_is_dropped_and_counted() {
    let mut rig = Rig::new();
    let bytes: Vec<u8> = (0..20).flat_map(|_| frame("W05")).collect();
    let queued = rig.app.ingest_bytes(&bytes);
    assert_eq!(queued, rig.app.pending_tags());
    assert_eq!(rig.app.diagnostics().ring_full_drops as usize, 20 - queued);
    assert_eq!(rig.app.diagnostics().frames_decoded, 20);
}
