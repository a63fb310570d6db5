// src/pinch.rs
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hands::Role;
use crate::landmarks::round1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinchAxis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchPhase {
    Inactive,
    Armed,
    Locked(PinchAxis),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchConfig {
    /// Level magnitude below which displacement is noise, and the
    /// hysteresis band between successive levels.
    pub axis_threshold: f64,
    /// Frames a level must hold before it is applied.
    pub apply_frames: u32,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            axis_threshold: 0.3,
            apply_frames: 5,
        }
    }
}

/// Continuous-control state shared by both hand roles; only one pinch is
/// acted upon at a time.
#[derive(Debug, Clone)]
pub struct PinchControl {
    config: PinchConfig,
    start: Option<(f64, f64)>,
    confirmed_level: f64,
    applied_level: f64,
    frame_count: u32,
    axis: Option<PinchAxis>,
    major_active: bool,
    minor_active: bool,
}

impl PinchControl {
    pub fn new(config: PinchConfig) -> Self {
        Self {
            config,
            start: None,
            confirmed_level: 0.0,
            applied_level: 0.0,
            frame_count: 0,
            axis: None,
            major_active: false,
            minor_active: false,
        }
    }

    pub fn phase(&self) -> PinchPhase {
        match (self.start, self.axis) {
            (None, _) => PinchPhase::Inactive,
            (Some(_), None) => PinchPhase::Armed,
            (Some(_), Some(axis)) => PinchPhase::Locked(axis),
        }
    }

    pub fn is_active(&self, role: Role) -> bool {
        match role {
            Role::Major => self.major_active,
            Role::Minor => self.minor_active,
        }
    }

    /// Level latched by the most recent apply.
    pub fn applied_level(&self) -> f64 {
        self.applied_level
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Starts a pinch session for `role` anchored at the index fingertip.
    pub fn begin(&mut self, role: Role, tip: (f64, f64)) {
        debug!(role = role.as_str(), x = tip.0, y = tip.1, "pinch armed");
        self.start = Some(tip);
        self.confirmed_level = 0.0;
        self.applied_level = 0.0;
        self.frame_count = 0;
        self.axis = None;
        match role {
            Role::Major => self.major_active = true,
            Role::Minor => self.minor_active = true,
        }
    }

    /// Ends the session for `role`.
    pub fn end(&mut self, role: Role) {
        match role {
            Role::Major => self.major_active = false,
            Role::Minor => self.minor_active = false,
        }
        self.axis = None;
        if !self.major_active && !self.minor_active {
            self.start = None;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Feeds the current fingertip. Returns the axis to act on when a level
    /// has held long enough to be applied.
    pub fn update(&mut self, tip: (f64, f64)) -> Option<PinchAxis> {
        let (start_x, start_y) = self.start?;
        let threshold = self.config.axis_threshold;

        let lvx = round1((tip.0 - start_x) * 10.0);
        // upward motion is positive
        let lvy = round1((start_y - tip.1) * 10.0);

        let (axis, candidate) = if lvy.abs() > lvx.abs() && lvy.abs() > threshold {
            (PinchAxis::Vertical, lvy)
        } else if lvx.abs() > threshold {
            (PinchAxis::Horizontal, lvx)
        } else {
            return None;
        };
        self.axis = Some(axis);

        if (self.confirmed_level - candidate).abs() < threshold {
            self.frame_count += 1;
        } else {
            self.confirmed_level = candidate;
            self.frame_count = 0;
        }

        if self.frame_count >= self.config.apply_frames {
            self.frame_count = 0;
            self.applied_level = self.confirmed_level;
            debug!(?axis, level = self.applied_level, "pinch level applied");
            return Some(axis);
        }
        None
    }
}

impl Default for PinchControl {
    fn default() -> Self {
        Self::new(PinchConfig::default())
    }
}
