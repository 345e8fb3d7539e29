//! Recognizer driven through the service: motion events, coverage and the
//! published signals.

use mopguard::adapters::memory_flash::MemoryFlash;
use mopguard::app::events::{AppEvent, NotifyCode};
use mopguard::app::service::AppService;
use mopguard::config::SystemConfig;
use mopguard::fsm::MotionState;
use mopguard::motion::orientation::FrameSide;
use mopguard::motion::{ImuSample, MotionInputs, Vec3};

use crate::mock_hw::{
    MOP_BLUE, RecordingNotify, RecordingSink, frame, provisioned_flash, resting, stroke,
};

fn app(config: SystemConfig) -> AppService<MemoryFlash> {
    AppService::new(config, provisioned_flash(), None).unwrap()
}

fn run(
    app: &mut AppService<MemoryFlash>,
    ticks: std::ops::Range<u64>,
    sink: &mut RecordingSink,
    notify: &mut RecordingNotify,
) {
    for t in ticks {
        app.tick(&stroke(t), MotionInputs::default(), sink, notify);
    }
}

#[test]
fn sinusoid_drives_idle_to_mopping() {
    let mut app = app(SystemConfig::default());
    let mut sink = RecordingSink::new();
    let mut notify = RecordingNotify::default();
    run(&mut app, 0..1000, &mut sink, &mut notify);

    assert_eq!(app.state(), MotionState::Mopping);
    assert!(app.recognizer().coverage().cycles() > 0);
    assert!(sink.events.iter().any(|(_, e)| matches!(
        e,
        AppEvent::MotionChanged {
            to: MotionState::Mopping,
            ..
        }
    )));

    let published = app.signals().snapshot();
    assert_eq!(published.state, MotionState::Mopping);
    assert!(published.per_mop_coverage_m2 > 0.0);
}

#[test]
fn rest_produces_no_motion_events() {
    let mut app = app(SystemConfig::default());
    let mut sink = RecordingSink::new();
    let mut notify = RecordingNotify::default();
    for _ in 0..500 {
        app.tick(&resting(), MotionInputs::default(), &mut sink, &mut notify);
    }
    assert_eq!(app.state(), MotionState::Idle);
    assert!(sink.events.is_empty());
    assert_eq!(app.build_telemetry().motion.cycle_count, 0);
}

#[test]
fn coverage_limit_fires_once_for_installed_mop() {
    let config = SystemConfig {
        coverage_limit_m2: 0.5,
        ..Default::default()
    };
    let mut app = app(config.clone());
    let mut sink = RecordingSink::new();
    let mut notify = RecordingNotify::default();

    for _ in 0..config.mop_debounce_reads {
        app.ingest_bytes(&frame("M09"));
        app.poll_tags(&mut sink, &mut notify);
    }
    run(&mut app, 0..3000, &mut sink, &mut notify);

    let hits: Vec<_> = sink
        .events
        .iter()
        .filter_map(|(_, e)| match e {
            AppEvent::CoverageThresholdReached { mop_id, coverage_m2 } => Some((*mop_id, *coverage_m2)),
            _ => None,
        })
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, MOP_BLUE);
    assert!(hits[0].1 >= 0.5);
    assert!(notify.codes.contains(&NotifyCode::ReplaceMop));
}

#[test]
fn mop_swap_restarts_per_mop_coverage() {
    let mut app = app(SystemConfig::default());
    let mut sink = RecordingSink::new();
    let mut notify = RecordingNotify::default();
    run(&mut app, 0..1000, &mut sink, &mut notify);
    let shift_before = app.recognizer().coverage().shift_m2();
    assert!(app.recognizer().coverage().per_mop_m2() > 0.0);

    for _ in 0..SystemConfig::default().mop_debounce_reads {
        app.ingest_bytes(&frame("M10"));
        app.poll_tags(&mut sink, &mut notify);
    }
    assert_eq!(app.recognizer().coverage().per_mop_m2(), 0.0);
    assert_eq!(app.recognizer().coverage().shift_m2(), shift_before);
}

#[test]
fn inactivity_line_forces_idle() {
    let mut app = app(SystemConfig::default());
    let mut sink = RecordingSink::new();
    let mut notify = RecordingNotify::default();
    run(&mut app, 0..1000, &mut sink, &mut notify);

    let report = app.tick(
        &stroke(1000),
        MotionInputs { inactive: true },
        &mut sink,
        &mut notify,
    );
    assert_eq!(report.state, MotionState::Idle);
    assert!(sink.contains(&AppEvent::MotionChanged {
        from: MotionState::Mopping,
        to: MotionState::Idle
    }));
}

#[test]
fn turning_the_frame_over_emits_one_flip() {
    let config = SystemConfig::default();
    let mut app = app(config.clone());
    let mut sink = RecordingSink::new();
    let mut notify = RecordingNotify::default();

    // Handle in mopping position, frame field pointing to -90°.
    let turned = ImuSample {
        accel: Vec3::new(0.6, 0.0, 0.8),
        gyro: Vec3::ZERO,
        mag: Vec3::new(0.0, -0.3, 0.0),
    };
    let ticks = config.flip_cooldown_ticks as usize * 2;
    for _ in 0..ticks {
        app.tick(&turned, MotionInputs::default(), &mut sink, &mut notify);
    }

    let flips: Vec<_> = sink
        .events
        .iter()
        .filter(|(_, e)| matches!(e, AppEvent::FrameFlipped { .. }))
        .collect();
    assert_eq!(flips.len(), 1);
    assert_eq!(flips[0].1, AppEvent::FrameFlipped { side: FrameSide::B });
    assert!(flips[0].0 >= config.flip_cooldown_ticks as u64);
    assert_eq!(app.signals().snapshot().side, FrameSide::B);
}
