//! Streaming reader-frame decoder.
//!
//! Wire format:
//! ```text
//! ┌─────┬──────────────┬────────────────┬──────────────┬──────┐
//! │ STX │ envelope (5) │ EPC (variable) │ envelope (4) │ \r\n │
//! └─────┴──────────────┴────────────────┴──────────────┴──────┘
//! ```
//!
//! Bytes arrive one at a time from the UART interrupt.  Anything outside a
//! frame is ignored; a frame that outgrows the scratch buffer is dropped and
//! counted.  Complete frames are trimmed and right-aligned into a [`TagId`].

use log::{debug, warn};

use super::TagId;
use crate::config::SystemConfig;

/// Scratch capacity between the start byte and the terminator.
pub const SCRATCH_LEN: usize = 64;

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Waiting for the start byte.
    Hunting,
    /// Inside a frame, `collected` bytes in scratch.
    Collecting { collected: usize },
}

/// Counters kept by the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames: u32,
    pub empty_frames: u32,
    pub overflows: u32,
}

pub struct TagDecoder {
    state: DecoderState,
    scratch: [u8; SCRATCH_LEN],
    start: u8,
    terminator: [u8; 2],
    prefix_len: usize,
    suffix_len: usize,
    stats: DecoderStats,
}

impl TagDecoder {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: DecoderState::Hunting,
            scratch: [0; SCRATCH_LEN],
            start: config.frame_start,
            terminator: config.frame_terminator,
            prefix_len: config.envelope_prefix_len as usize,
            suffix_len: config.envelope_suffix_len as usize,
            stats: DecoderStats::default(),
        }
    }

    /// Feed one byte.  Returns a tag when this byte completed a valid frame.
    pub fn push(&mut self, byte: u8) -> Option<TagId> {
        match self.state {
            DecoderState::Hunting => {
                if byte == self.start {
                    self.state = DecoderState::Collecting { collected: 0 };
                }
                None
            }
            DecoderState::Collecting { collected } => {
                if collected == SCRATCH_LEN {
                    warn!("rfid: frame exceeds {SCRATCH_LEN} bytes, dropped");
                    self.stats.overflows = self.stats.overflows.saturating_add(1);
                    self.state = DecoderState::Hunting;
                    return None;
                }
                self.scratch[collected] = byte;
                let collected = collected + 1;

                if collected >= 2 && self.scratch[collected - 2..collected] == self.terminator {
                    self.state = DecoderState::Hunting;
                    return self.finish(collected - 2);
                }
                self.state = DecoderState::Collecting { collected };
                None
            }
        }
    }

    /// Feed a burst of bytes, handing each completed tag to `on_tag`.
    pub fn feed(&mut self, data: &[u8], mut on_tag: impl FnMut(TagId)) {
        for &b in data {
            if let Some(tag) = self.push(b) {
                on_tag(tag);
            }
        }
    }

    /// Adopt new framing parameters.  Any partial frame is dropped; the
    /// counters are kept.
    pub fn reconfigure(&mut self, config: &SystemConfig) {
        *self = Self {
            stats: self.stats,
            ..Self::new(config)
        };
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.state = DecoderState::Hunting;
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    fn finish(&mut self, len: usize) -> Option<TagId> {
        self.stats.frames = self.stats.frames.saturating_add(1);
        let body = &self.scratch[..len];
        if body.len() <= self.prefix_len + self.suffix_len {
            debug!("rfid: empty frame ({} bytes)", body.len());
            self.stats.empty_frames = self.stats.empty_frames.saturating_add(1);
            return None;
        }
        let epc = &body[self.prefix_len..body.len() - self.suffix_len];
        Some(TagId::right_aligned(epc))
    }
}
