// src/debounce.rs
use crate::gesture::Gesture;

/// Per-role temporal filter. A raw gesture must repeat for `persistence`
/// consecutive frames before it replaces the stable gesture.
#[derive(Debug, Clone)]
pub struct GestureFilter {
    persistence: u32,
    last_raw: Gesture,
    frame_count: u32,
    stable: Gesture,
}

impl GestureFilter {
    pub fn new(persistence: u32) -> Self {
        Self {
            persistence: persistence.max(1),
            last_raw: Gesture::Palm,
            frame_count: 0,
            stable: Gesture::Palm,
        }
    }

    /// Feeds one raw classification and returns the stable gesture.
    pub fn update(&mut self, raw: Gesture) -> &Gesture {
        if raw == self.last_raw {
            self.frame_count = self.frame_count.saturating_add(1);
        } else {
            self.frame_count = 0;
            self.last_raw = raw;
        }

        // frame_count counts repeats after the first sighting
        if self.frame_count + 1 >= self.persistence && self.stable != self.last_raw {
            self.stable = self.last_raw.clone();
        }
        &self.stable
    }

    pub fn stable(&self) -> &Gesture {
        &self.stable
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Back to idle, as if the hand had never been seen.
    pub fn reset(&mut self) {
        self.last_raw = Gesture::Palm;
        self.frame_count = 0;
        self.stable = Gesture::Palm;
    }
}

impl Default for GestureFilter {
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_frames_do_not_flip() {
        let mut filter = GestureFilter::default();
        for _ in 0..4 {
            assert_eq!(filter.update(Gesture::Fist), &Gesture::Palm);
        }
    }

    #[test]
    fn fifth_frame_flips() {
        let mut filter = GestureFilter::default();
        let seen: Vec<Gesture> = (0..6).map(|_| filter.update(Gesture::Fist).clone()).collect();
        assert_eq!(seen[3], Gesture::Palm);
        assert_eq!(seen[4], Gesture::Fist);
        assert_eq!(seen[5], Gesture::Fist);
    }

    #[test]
    fn single_frame_glitch_is_ignored() {
        let mut filter = GestureFilter::default();
        for _ in 0..5 {
            filter.update(Gesture::Index);
        }
        assert_eq!(filter.stable(), &Gesture::Index);

        assert_eq!(filter.update(Gesture::Fist), &Gesture::Index);
        assert_eq!(filter.frame_count(), 0);
        for _ in 0..3 {
            assert_eq!(filter.update(Gesture::Index), &Gesture::Index);
        }
    }

    #[test]
    fn interrupted_run_restarts_count() {
        let mut filter = GestureFilter::default();
        for _ in 0..3 {
            filter.update(Gesture::VSign);
        }
        filter.update(Gesture::Mid);
        for _ in 0..3 {
            assert_eq!(filter.update(Gesture::VSign), &Gesture::Palm);
        }
        assert_eq!(filter.update(Gesture::VSign), &Gesture::Palm);
        assert_eq!(filter.update(Gesture::VSign), &Gesture::VSign);
    }

    #[test]
    fn reset_returns_to_palm() {
        let mut filter = GestureFilter::new(2);
        filter.update(Gesture::Fist);
        filter.update(Gesture::Fist);
        assert_eq!(filter.stable(), &Gesture::Fist);
        filter.reset();
        assert_eq!(filter.stable(), &Gesture::Palm);
        assert_eq!(filter.frame_count(), 0);
    }
}
