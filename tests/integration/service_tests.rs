//! AppService lifecycle, commands, config hot-reload and the log/switch
//! adapters.

use core::cell::Cell;
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin};
use mopguard::adapters::handle_switch::{FrameEdge, HandleSwitch};
use mopguard::adapters::log_sink::LogEventSink;
use mopguard::adapters::memory_flash::MemoryFlash;
use mopguard::app::commands::{AppCommand, CommandReply};
use mopguard::app::events::{AppEvent, NotifyCode};
use mopguard::app::service::AppService;
use mopguard::config::SystemConfig;
use mopguard::motion::MotionInputs;

use crate::mock_hw::{
    MOP_BLUE, ROOM_KITCHEN, RecordingNotify, RecordingSink, frame, provisioned_flash, resting,
};

fn started(config: SystemConfig) -> (AppService<MemoryFlash>, RecordingSink, RecordingNotify) {
    let mut app = AppService::new(config, provisioned_flash(), None).unwrap();
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    (app, sink, RecordingNotify::default())
}

fn read(app: &mut AppService<MemoryFlash>, epc: &str, sink: &mut RecordingSink, notify: &mut RecordingNotify) {
    app.ingest_bytes(&frame(epc));
    app.poll_tags(sink, notify);
}

#[test]
fn start_emits_started_at_tick_zero() {
    let (_app, sink, _) = started(SystemConfig::default());
    assert_eq!(sink.events, vec![(0, AppEvent::Started)]);
}

#[test]
fn linked_mop_that_goes_silent_is_removed() {
    let config = SystemConfig {
        link_refresh_ticks: 100,
        ..Default::default()
    };
    let (mut app, mut sink, mut notify) = started(config.clone());
    for _ in 0..config.mop_debounce_reads {
        read(&mut app, "M09", &mut sink, &mut notify);
    }
    read(&mut app, "W05", &mut sink, &mut notify);
    assert!(app.compliance().link().is_linked());

    // Re-reads keep the link alive.
    for i in 0..300 {
        app.tick(&resting(), MotionInputs::default(), &mut sink, &mut notify);
        if i % 50 == 0 {
            read(&mut app, "M09", &mut sink, &mut notify);
        }
    }
    assert!(app.compliance().link().is_linked());

    for _ in 0..102 {
        app.tick(&resting(), MotionInputs::default(), &mut sink, &mut notify);
    }
    assert!(sink.contains(&AppEvent::MopRemoved { mop_id: MOP_BLUE }));
    assert!(notify.codes.contains(&NotifyCode::MopLost));
    assert!(!app.compliance().link().is_linked());
    assert_eq!(app.compliance().mop_id(), 0);
    assert_eq!(app.diagnostics().link_timeouts, 1);
}

#[test]
fn telemetry_carries_context_and_serializes() {
    let (mut app, mut sink, mut notify) = started(SystemConfig::default());
    for _ in 0..3 {
        read(&mut app, "M09", &mut sink, &mut notify);
    }
    read(&mut app, "W05", &mut sink, &mut notify);
    app.tick(&resting(), MotionInputs::default(), &mut sink, &mut notify);
    app.report_telemetry(&mut sink);

    let Some((tick, AppEvent::Telemetry(t))) = sink.events.last() else {
        panic!("last event should be telemetry");
    };
    assert_eq!(*tick, 1);
    assert_eq!(t.room_id, ROOM_KITCHEN);
    assert_eq!(t.mop_id, MOP_BLUE);
    assert_eq!(t.linked_mop_id, MOP_BLUE);
    assert_eq!(t.diagnostics.frames_decoded, 4);

    let json = serde_json::to_value(t).unwrap();
    assert_eq!(json["room_id"], 5);
    assert_eq!(json["motion"]["state"], "Idle");
}

#[test]
fn framing_change_applies_to_next_frame() {
    let (mut app, mut sink, mut notify) = started(SystemConfig::default());
    let config = SystemConfig {
        frame_start: 0x01,
        ..Default::default()
    };
    let reply = app
        .handle_command(AppCommand::UpdateConfig(config), &mut sink, &mut notify)
        .unwrap();
    assert_eq!(reply, CommandReply::Done);
    assert!(app.is_config_dirty());

    assert_eq!(app.ingest_bytes(&frame("W05")), 0);
    let mut relabelled = frame("W05");
    relabelled[0] = 0x01;
    assert_eq!(app.ingest_bytes(&relabelled), 1);
}

#[test]
fn clear_caches_empties_both_caches() {
    let (mut app, mut sink, mut notify) = started(SystemConfig::default());
    for _ in 0..3 {
        read(&mut app, "M09", &mut sink, &mut notify);
    }
    read(&mut app, "W05", &mut sink, &mut notify);
    assert!(!app.compliance().room_cache().is_empty());
    assert!(!app.compliance().mop_cache().is_empty());

    app.handle_command(AppCommand::ClearCaches, &mut sink, &mut notify)
        .unwrap();
    assert!(app.compliance().room_cache().is_empty());
    assert!(app.compliance().mop_cache().is_empty());
}

#[test]
fn log_sink_accepts_every_event_kind() {
    let (mut app, _, _) = started(SystemConfig::default());
    let mut log = LogEventSink::new();
    for _ in 0..3 {
        app.ingest_bytes(&frame("M10"));
        app.poll_tags(&mut log, &mut LogEventSink);
    }
    app.ingest_bytes(&frame("W05"));
    app.poll_tags(&mut log, &mut LogEventSink);
    app.report_telemetry(&mut log);
    assert_eq!(app.compliance().mop_id(), 10);
}

// ── Handle switch → FrameLifted ───────────────────────────────

/// Reed switch level shared with the test body.
struct ReedPin {
    high: Rc<Cell<bool>>,
}

impl ErrorType for ReedPin {
    type Error = Infallible;
}

impl InputPin for ReedPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high.get())
    }
}

#[test]
fn reed_switch_edges_unlink_and_relink() {
    let (mut app, mut sink, mut notify) = started(SystemConfig::default());
    for _ in 0..3 {
        read(&mut app, "M09", &mut sink, &mut notify);
    }
    read(&mut app, "W05", &mut sink, &mut notify);
    assert!(app.compliance().link().is_linked());

    // Seated reads high; the magnet leaves when the frame is lifted.
    let level = Rc::new(Cell::new(true));
    let mut switch = HandleSwitch::new(
        ReedPin {
            high: Rc::clone(&level),
        },
        true,
        4,
    );
    let mut edges = Vec::new();
    for i in 0..14 {
        match i {
            2 => level.set(false),
            8 => level.set(true),
            _ => {}
        }
        if let Some(edge) = switch.poll().unwrap() {
            edges.push((i, edge));
            app.handle_command(edge.command(), &mut sink, &mut notify)
                .unwrap();
            if edge == FrameEdge::Lifted {
                assert!(!app.compliance().link().is_linked());
            }
        }
    }
    assert_eq!(edges, vec![(5, FrameEdge::Lifted), (11, FrameEdge::Seated)]);
    assert!(app.compliance().link().is_linked());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::MopLinked { .. })),
        2
    );
}
