//! Handle orientation: floor-handle angle, frame-handle angle, frame side.
//!
//! The floor-handle angle (tilt of the handle away from vertical, from the
//! averaged accelerometer) decides whether the tool is held in a mopping
//! position.  The frame-handle angle (heading of the frame from the averaged
//! magnetometer) decides which frame face is down.  Both are exponentially
//! smoothed; the frame angle is held whenever the field is too weak to trust.

use serde::{Deserialize, Serialize};

use super::Vec3;
use crate::config::SystemConfig;

/// Accelerometer magnitude (g) below which the tilt is not recomputed.
const MIN_TILT_MAGNITUDE_G: f32 = 0.2;

/// Which physical face of the mop frame is on the floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameSide {
    #[default]
    A,
    B,
}

impl FrameSide {
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Result of one orientation update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationUpdate {
    pub in_position: bool,
    /// The new side when a flip was accepted this tick.
    pub flipped: Option<FrameSide>,
}

/// Wrap an angle into (−180, 180].
fn wrap_deg(a: f32) -> f32 {
    let mut a = a % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

#[derive(Debug, Clone)]
pub struct OrientationTracker {
    floor_deg: Option<f32>,
    frame_deg: Option<f32>,
    side: FrameSide,
    last_flip_tick: u64,
    alpha: f32,
    min_deg: f32,
    max_deg: f32,
    mag_floor: f32,
    flip_deg: f32,
    cooldown: u64,
}

impl OrientationTracker {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            floor_deg: None,
            frame_deg: None,
            side: FrameSide::A,
            last_flip_tick: 0,
            alpha: config.angle_alpha,
            min_deg: config.mop_angle_min_deg,
            max_deg: config.mop_angle_max_deg,
            mag_floor: config.mag_noise_floor,
            flip_deg: config.flip_angle_deg,
            cooldown: config.flip_cooldown_ticks as u64,
        }
    }

    pub fn update(&mut self, accel: Vec3, mag: Vec3, now: u64) -> OrientationUpdate {
        if accel.norm() >= MIN_TILT_MAGNITUDE_G {
            let raw = accel.x.hypot(accel.y).atan2(accel.z).to_degrees();
            self.floor_deg = Some(match self.floor_deg {
                Some(prev) => prev + self.alpha * (raw - prev),
                None => raw,
            });
        }

        if mag.norm() >= self.mag_floor {
            let raw = mag.y.atan2(mag.x).to_degrees();
            self.frame_deg = Some(match self.frame_deg {
                Some(prev) => wrap_deg(prev + self.alpha * wrap_deg(raw - prev)),
                None => raw,
            });
        }

        let in_position = self.in_position();
        let mut flipped = None;

        if let Some(frame) = self.frame_deg {
            let target = if frame > self.flip_deg {
                Some(FrameSide::A)
            } else if frame < -self.flip_deg {
                Some(FrameSide::B)
            } else {
                None
            };
            let cooled = now.saturating_sub(self.last_flip_tick) >= self.cooldown;
            if let Some(target) = target {
                if target != self.side && in_position && cooled {
                    self.side = target;
                    self.last_flip_tick = now;
                    flipped = Some(target);
                }
            }
        }

        OrientationUpdate {
            in_position,
            flipped,
        }
    }

    /// Floor-handle angle inside the configured mopping range.
    pub fn in_position(&self) -> bool {
        self.floor_deg
            .is_some_and(|a| a >= self.min_deg && a <= self.max_deg)
    }

    pub fn floor_angle_deg(&self) -> Option<f32> {
        self.floor_deg
    }

    pub fn frame_angle_deg(&self) -> Option<f32> {
        self.frame_deg
    }

    pub fn side(&self) -> FrameSide {
        self.side
    }
}
