// src/cursor.rs
use serde::{Deserialize, Serialize};

/// Gain curve for pointer motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Squared pixel displacement at or below which motion is dropped.
    pub dead_zone_sq: f64,
    /// Squared displacement above which the gain saturates.
    pub saturation_sq: f64,
    /// Gain per pixel of displacement between the two limits.
    pub gain: f64,
    /// Gain used above `saturation_sq`.
    pub max_ratio: f64,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            dead_zone_sq: 25.0,
            saturation_sq: 900.0,
            gain: 0.07,
            max_ratio: 2.1,
        }
    }
}

impl CursorConfig {
    /// Gain applied to a hand displacement of squared length `dist_sq`.
    pub fn ratio(&self, dist_sq: f64) -> f64 {
        if dist_sq <= self.dead_zone_sq {
            0.0
        } else if dist_sq <= self.saturation_sq {
            self.gain * dist_sq.sqrt()
        } else {
            self.max_ratio
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CursorState {
    /// Last sampled hand position in screen pixels; `None` re-anchors.
    pub previous: Option<(i32, i32)>,
    pub screen: (u32, u32),
}

/// Converts hand motion into damped pointer motion relative to the
/// pointer's actual position.
#[derive(Debug, Clone)]
pub struct CursorMapper {
    config: CursorConfig,
    state: CursorState,
}

impl CursorMapper {
    pub fn new(config: CursorConfig, screen: (u32, u32)) -> Self {
        Self {
            config,
            state: CursorState {
                previous: None,
                screen,
            },
        }
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    pub fn set_screen(&mut self, screen: (u32, u32)) {
        self.state.screen = screen;
    }

    /// Takes the normalized palm position and the pointer's current location,
    /// returns where the pointer should go.
    pub fn update(&mut self, palm: (f64, f64), pointer: (i32, i32)) -> (i32, i32) {
        let (width, height) = self.state.screen;
        let x = (palm.0 * width as f64) as i32;
        let y = (palm.1 * height as f64) as i32;

        let (prev_x, prev_y) = self.state.previous.unwrap_or((x, y));
        self.state.previous = Some((x, y));

        let dx = (x - prev_x) as f64;
        let dy = (y - prev_y) as f64;
        let ratio = self.config.ratio(dx * dx + dy * dy);

        (
            pointer.0 + (dx * ratio).round() as i32,
            pointer.1 + (dy * ratio).round() as i32,
        )
    }

    /// Drops the motion history so the next sample anchors instead of jumping.
    pub fn clear(&mut self) {
        self.state.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gain_zones() {
        let cfg = CursorConfig::default();
        assert_eq!(cfg.ratio(10.0), 0.0);
        assert_eq!(cfg.ratio(25.0), 0.0);
        assert_relative_eq!(cfg.ratio(400.0), 1.4, epsilon = 1e-12);
        assert_relative_eq!(cfg.ratio(900.0), 2.1, epsilon = 1e-12);
        assert_eq!(cfg.ratio(2000.0), 2.1);
    }

    // exact binary fractions of a 1024 px screen
    fn px(pixels: i32) -> f64 {
        pixels as f64 / 1024.0
    }

    fn mapper() -> CursorMapper {
        CursorMapper::new(CursorConfig::default(), (1024, 1024))
    }

    #[test]
    fn first_sample_anchors() {
        let mut mapper = mapper();
        assert_eq!(mapper.update((px(512), px(512)), (300, 300)), (300, 300));
        assert_eq!(mapper.state().previous, Some((512, 512)));
    }

    #[test]
    fn small_motion_is_absorbed() {
        let mut mapper = mapper();
        mapper.update((px(512), px(512)), (300, 300));
        // dist_sq 10
        assert_eq!(mapper.update((px(515), px(513)), (300, 300)), (300, 300));
    }

    #[test]
    fn medium_motion_is_scaled() {
        let mut mapper = mapper();
        mapper.update((px(512), px(512)), (300, 300));
        // dist_sq 400, ratio 1.4
        assert_eq!(mapper.update((px(524), px(528)), (300, 300)), (317, 322));
    }

    #[test]
    fn fast_motion_saturates() {
        let mut mapper = mapper();
        mapper.update((px(512), px(512)), (0, 0));
        assert_eq!(mapper.update((px(612), px(512)), (0, 0)), (210, 0));
    }

    #[test]
    fn clear_re_anchors() {
        let mut mapper = mapper();
        mapper.update((px(100), px(100)), (0, 0));
        mapper.clear();
        assert_eq!(mapper.update((px(900), px(900)), (40, 40)), (40, 40));
    }

    #[test]
    fn empty_screen_never_moves() {
        let mut mapper = CursorMapper::new(CursorConfig::default(), (0, 0));
        mapper.update((0.1, 0.1), (5, 5));
        assert_eq!(mapper.update((0.9, 0.9), (5, 5)), (5, 5));
    }
}
