// src/landmarks.rs
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// Hand landmark indices (21-point hand skeleton)
pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

pub const LANDMARK_COUNT: usize = 21;

/// Landmark used as the pointer anchor (middle finger base knuckle).
pub const PALM_CENTER: usize = MIDDLE_MCP;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// One detected hand for one frame: 21 points in normalized image space
/// (x, y in [0, 1], y growing downwards) plus relative depth in z.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    pub landmarks: [Vector3<f64>; LANDMARK_COUNT],
    pub handedness: Handedness,
}

impl HandObservation {
    pub fn new(landmarks: [Vector3<f64>; LANDMARK_COUNT], handedness: Handedness) -> Self {
        Self { landmarks, handedness }
    }

    /// Builds an observation from raw `[x, y, z]` triples. Returns `None`
    /// unless exactly 21 points are supplied.
    pub fn from_points(points: &[[f64; 3]], handedness: Handedness) -> Option<Self> {
        if points.len() != LANDMARK_COUNT {
            return None;
        }
        let mut landmarks = [Vector3::zeros(); LANDMARK_COUNT];
        for (slot, p) in landmarks.iter_mut().zip(points) {
            *slot = Vector3::new(p[0], p[1], p[2]);
        }
        Some(Self { landmarks, handedness })
    }

    pub fn point(&self, index: usize) -> &Vector3<f64> {
        &self.landmarks[index]
    }

    /// Planar euclidean distance between two landmarks.
    pub fn dist(&self, a: usize, b: usize) -> f64 {
        let pa = self.point(a);
        let pb = self.point(b);
        ((pa.x - pb.x).powi(2) + (pa.y - pb.y).powi(2)).sqrt()
    }

    /// Planar distance, positive when `a` sits above `b` on screen.
    pub fn signed_dist(&self, a: usize, b: usize) -> f64 {
        let sign = if self.point(a).y < self.point(b).y { 1.0 } else { -1.0 };
        self.dist(a, b) * sign
    }

    /// Absolute depth difference between two landmarks.
    pub fn dz(&self, a: usize, b: usize) -> f64 {
        (self.point(a).z - self.point(b).z).abs()
    }

    /// Area of the planar bounding box around all landmarks.
    pub fn bounding_area(&self) -> f64 {
        let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
        let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
        for p in &self.landmarks {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        (max_x - min_x) * (max_y - min_y)
    }

    /// Landmarks relative to the wrist, flattened to x, y, z triples.
    pub fn wrist_relative_features(&self) -> Vec<f64> {
        let wrist = self.landmarks[WRIST];
        self.landmarks
            .iter()
            .flat_map(|lm| {
                let rel = lm - wrist;
                [rel.x, rel.y, rel.z]
            })
            .collect()
    }
}

/// Rounds to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    const FINGERS: [[usize; 4]; 4] = [
        [INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP],
        [MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP],
        [RING_MCP, RING_PIP, RING_DIP, RING_TIP],
        [PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP],
    ];

    /// Builds a hand whose four fingers are open or curled as requested,
    /// ordered index, middle, ring, pinky. Thumb rests away from the index tip.
    pub fn hand(open: [bool; 4], handedness: Handedness) -> HandObservation {
        let mut lm = [Vector3::zeros(); LANDMARK_COUNT];
        lm[WRIST] = Vector3::new(0.5, 0.8, 0.0);
        lm[THUMB_CMC] = Vector3::new(0.42, 0.75, 0.0);
        lm[THUMB_MCP] = Vector3::new(0.38, 0.7, 0.0);
        lm[THUMB_IP] = Vector3::new(0.35, 0.66, 0.0);
        lm[THUMB_TIP] = Vector3::new(0.32, 0.62, 0.0);
        for (i, finger) in FINGERS.iter().enumerate() {
            let x = 0.44 + 0.04 * i as f64;
            lm[finger[0]] = Vector3::new(x, 0.6, 0.0);
            if open[i] {
                lm[finger[1]] = Vector3::new(x, 0.52, 0.0);
                lm[finger[2]] = Vector3::new(x, 0.47, 0.0);
                lm[finger[3]] = Vector3::new(x, 0.42, 0.0);
            } else {
                lm[finger[1]] = Vector3::new(x, 0.55, 0.0);
                lm[finger[2]] = Vector3::new(x, 0.6, 0.0);
                lm[finger[3]] = Vector3::new(x, 0.63, 0.0);
            }
        }
        HandObservation::new(lm, handedness)
    }

    /// Moves every landmark by the same planar offset.
    pub fn shifted(mut obs: HandObservation, dx: f64, dy: f64) -> HandObservation {
        for p in obs.landmarks.iter_mut() {
            p.x += dx;
            p.y += dy;
        }
        obs
    }
}
