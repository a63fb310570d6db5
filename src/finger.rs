// src/finger.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::landmarks::{
    round1, HandObservation, INDEX_MCP, INDEX_TIP, MIDDLE_MCP, MIDDLE_TIP, PINKY_MCP, PINKY_TIP,
    RING_MCP, RING_TIP, WRIST,
};

/// Substitute denominator for zero-length reference segments.
pub(crate) const RATIO_EPSILON: f64 = 0.01;

/// Which fingers are extended, one bit per finger:
/// thumb 16, index 8, middle 4, ring 2, pinky 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerState(u8);

impl FingerState {
    pub const FIST: Self = Self(0);
    pub const PINKY: Self = Self(1);
    pub const RING: Self = Self(2);
    pub const MID: Self = Self(4);
    pub const LAST3: Self = Self(7);
    pub const INDEX: Self = Self(8);
    pub const FIRST2: Self = Self(12);
    pub const LAST4: Self = Self(15);
    pub const THUMB: Self = Self(16);
    pub const PALM: Self = Self(31);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1_1111)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: FingerState) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Display for FingerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05b}", self.0)
    }
}

/// Tip, middle knuckle and base for index, middle, ring, pinky (packing order).
const FINGER_POINTS: [[usize; 3]; 4] = [
    [INDEX_TIP, INDEX_MCP, WRIST],
    [MIDDLE_TIP, MIDDLE_MCP, WRIST],
    [RING_TIP, RING_MCP, WRIST],
    [PINKY_TIP, PINKY_MCP, WRIST],
];

/// Turns one observation into a finger-state code.
#[derive(Debug, Clone)]
pub struct FingerEncoder {
    /// A finger counts as open when its rounded ratio is strictly above this.
    pub open_ratio: f64,
}

impl Default for FingerEncoder {
    fn default() -> Self {
        Self { open_ratio: 0.5 }
    }
}

impl FingerEncoder {
    pub fn new(open_ratio: f64) -> Self {
        Self { open_ratio }
    }

    pub fn encode(&self, hand: &HandObservation) -> FingerState {
        // thumb contributes 0
        let mut bits: u8 = 0;
        for [tip, knuckle, base] in FINGER_POINTS {
            bits <<= 1;
            if finger_ratio(hand, tip, knuckle, base) > self.open_ratio {
                bits |= 1;
            }
        }
        FingerState::from_bits(bits)
    }
}

/// Signed tip-to-knuckle offset over signed knuckle-to-base offset, rounded
/// to one decimal.
pub fn finger_ratio(hand: &HandObservation, tip: usize, knuckle: usize, base: usize) -> f64 {
    let upper = hand.signed_dist(tip, knuckle);
    let mut lower = hand.signed_dist(knuckle, base);
    if lower == 0.0 {
        lower = RATIO_EPSILON;
    }
    round1(upper / lower)
}
