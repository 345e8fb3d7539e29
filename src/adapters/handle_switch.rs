//! Frame-lift detection from the reed switch in the handle joint.
//!
//! The switch is sampled once per recognizer tick through an
//! [`embedded_hal::digital::InputPin`].  A level change is only accepted
//! after it has been stable for `debounce_ticks` consecutive samples; the
//! accepted edge maps onto an [`AppCommand`] through [`FrameEdge::command`].

use embedded_hal::digital::InputPin;
use log::debug;

use crate::app::commands::AppCommand;

/// A debounced change of the frame's mounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEdge {
    Lifted,
    Seated,
}

impl FrameEdge {
    pub fn command(self) -> AppCommand {
        match self {
            Self::Lifted => AppCommand::FrameLifted,
            Self::Seated => AppCommand::FrameSeated,
        }
    }
}

pub struct HandleSwitch<P: InputPin> {
    pin: P,
    /// Pin level that means the frame is seated on the floor.
    seated_level_high: bool,
    debounce_ticks: u8,
    seated: bool,
    candidate: bool,
    stable_for: u8,
}

impl<P: InputPin> HandleSwitch<P> {
    /// Starts out assuming the frame is seated.
    pub fn new(pin: P, seated_level_high: bool, debounce_ticks: u8) -> Self {
        Self {
            pin,
            seated_level_high,
            debounce_ticks: debounce_ticks.max(1),
            seated: true,
            candidate: true,
            stable_for: 0,
        }
    }

    /// Sample the pin once.  Returns an edge on the tick it is accepted.
    pub fn poll(&mut self) -> Result<Option<FrameEdge>, P::Error> {
        let seated = self.pin.is_high()? == self.seated_level_high;

        if seated == self.seated {
            self.candidate = seated;
            self.stable_for = 0;
            return Ok(None);
        }
        if seated != self.candidate {
            self.candidate = seated;
            self.stable_for = 0;
        }
        self.stable_for = self.stable_for.saturating_add(1);
        if self.stable_for < self.debounce_ticks {
            return Ok(None);
        }

        self.seated = seated;
        self.stable_for = 0;
        let edge = if seated { FrameEdge::Seated } else { FrameEdge::Lifted };
        debug!("handle switch: {:?}", edge);
        Ok(Some(edge))
    }

    pub fn is_seated(&self) -> bool {
        self.seated
    }

    pub fn release(self) -> P {
        self.pin
    }
}
