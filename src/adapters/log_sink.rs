//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] and [`NotifySink`] by writing one structured
//! line per event to the `log` facade (UART / RTT in production, the test
//! harness on the host).  Telemetry is written as JSON so a serial capture
//! can be parsed offline.

use log::{info, warn};

use crate::app::events::{AppEvent, NotifyCode};
use crate::app::ports::{EventSink, NotifySink};

/// Adapter that logs every [`AppEvent`] and notification intent.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, at_tick: u64, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => match serde_json::to_string(t) {
                Ok(json) => info!("TELEM | {} | {}", at_tick, json),
                Err(e) => warn!("TELEM | {} | encode failed: {}", at_tick, e),
            },
            AppEvent::Started => info!("START | {}", at_tick),
            AppEvent::MotionChanged { from, to } => {
                info!("MOTION | {} | {:?} -> {:?}", at_tick, from, to);
            }
            AppEvent::FrameFlipped { side } => info!("FLIP | {} | side={:?}", at_tick, side),
            AppEvent::CoverageThresholdReached { mop_id, coverage_m2 } => {
                warn!("COVER | {} | mop={} {:.1}m\u{00b2}", at_tick, mop_id, coverage_m2);
            }
            AppEvent::RoomChanged { from, to } => info!("ROOM | {} | {} -> {}", at_tick, from, to),
            AppEvent::MopChanged { from, to } => info!("MOP | {} | {} -> {}", at_tick, from, to),
            AppEvent::MopLinked { room_id, mop_id } => {
                info!("LINK | {} | room={} mop={}", at_tick, room_id, mop_id);
            }
            AppEvent::LinkReset {
                reason,
                room_id,
                mop_id,
            } => info!(
                "UNLINK | {} | room={} mop={} reason={:?}",
                at_tick, room_id, mop_id, reason
            ),
            AppEvent::MopRemoved { mop_id } => warn!("LOST | {} | mop={}", at_tick, mop_id),
            AppEvent::UnknownTag { tag } => info!("TAG | {} | unknown {}", at_tick, tag),
            violation => match serde_json::to_string(violation) {
                Ok(json) => warn!("VIOLATION | {} | {}", at_tick, json),
                Err(_) => warn!("VIOLATION | {} | {:?}", at_tick, violation),
            },
        }
    }
}

impl NotifySink for LogEventSink {
    fn notify(&mut self, code: NotifyCode) {
        info!("NOTIFY | {:?} ({})", code, code as u8);
    }
}
