// src/gesture.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::finger::{FingerEncoder, FingerState, RATIO_EPSILON};
use crate::hands::Role;
use crate::landmarks::{HandObservation, INDEX_MCP, INDEX_TIP, MIDDLE_MCP, MIDDLE_TIP, THUMB_TIP};
use crate::library::GestureLibrary;

/// Opaque identifier forwarded to the command executor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(pub String);

impl CommandId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discrete gesture. Named finger combinations get their own variant; any
/// other combination is carried as `Other` with the raw code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Gesture {
    Fist,
    Pinky,
    Ring,
    Mid,
    Last3,
    Index,
    First2,
    Last4,
    Thumb,
    Palm,
    VSign,
    TwoFingerClosed,
    PinchMajor,
    PinchMinor,
    Custom(CommandId),
    Other(FingerState),
}

impl Gesture {
    pub fn from_fingers(code: FingerState) -> Self {
        match code {
            FingerState::FIST => Gesture::Fist,
            FingerState::PINKY => Gesture::Pinky,
            FingerState::RING => Gesture::Ring,
            FingerState::MID => Gesture::Mid,
            FingerState::LAST3 => Gesture::Last3,
            FingerState::INDEX => Gesture::Index,
            FingerState::FIRST2 => Gesture::First2,
            FingerState::LAST4 => Gesture::Last4,
            FingerState::THUMB => Gesture::Thumb,
            FingerState::PALM => Gesture::Palm,
            other => Gesture::Other(other),
        }
    }

    pub fn is_pinch(&self) -> bool {
        matches!(self, Gesture::PinchMajor | Gesture::PinchMinor)
    }

    pub fn name(&self) -> String {
        match self {
            Gesture::Custom(id) => format!("Custom({id})"),
            Gesture::Other(code) => format!("Other({code})"),
            other => format!("{other:?}"),
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Exact finger-code pattern mapped to a user command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPattern {
    pub fingers: FingerState,
    pub command: CommandId,
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Thumb tip to index tip distance below which Last3/Last4 read as a pinch.
    pub pinch_distance: f64,
    /// Tip spread over base spread above which two fingers read as a V.
    pub v_sign_ratio: f64,
    /// Index/middle tip depth difference below which they read as closed together.
    pub closed_depth: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            pinch_distance: 0.05,
            v_sign_ratio: 1.7,
            closed_depth: 0.1,
        }
    }
}

/// Stateless per-frame classifier: encodes the fingers, then refines the
/// code with auxiliary geometry.
pub struct GestureClassifier {
    config: ClassifierConfig,
    encoder: FingerEncoder,
    patterns: Vec<CustomPattern>,
    library: Option<GestureLibrary>,
}

impl GestureClassifier {
    pub fn new(config: ClassifierConfig, encoder: FingerEncoder) -> Self {
        Self {
            config,
            encoder,
            patterns: Vec::new(),
            library: None,
        }
    }

    pub fn with_patterns(mut self, patterns: Vec<CustomPattern>) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_library(mut self, library: GestureLibrary) -> Self {
        self.library = Some(library);
        self
    }

    pub fn encoder(&self) -> &FingerEncoder {
        &self.encoder
    }

    pub fn classify(&self, hand: &HandObservation, role: Role) -> Gesture {
        let fingers = self.encoder.encode(hand);
        self.classify_fingers(fingers, hand, role)
    }

    pub fn classify_fingers(&self, fingers: FingerState, hand: &HandObservation, role: Role) -> Gesture {
        if let Some(pattern) = self.patterns.iter().find(|p| p.fingers == fingers) {
            return Gesture::Custom(pattern.command.clone());
        }

        if (fingers == FingerState::LAST3 || fingers == FingerState::LAST4)
            && hand.dist(INDEX_TIP, THUMB_TIP) < self.config.pinch_distance
        {
            return match role {
                Role::Minor => Gesture::PinchMinor,
                Role::Major => Gesture::PinchMajor,
            };
        }

        if fingers == FingerState::FIRST2 {
            let tips = hand.dist(INDEX_TIP, MIDDLE_TIP);
            let mut bases = hand.dist(INDEX_MCP, MIDDLE_MCP);
            if bases == 0.0 {
                bases = RATIO_EPSILON;
            }
            let ratio = tips / bases;
            debug!(ratio, "two finger spread");
            return if ratio > self.config.v_sign_ratio {
                Gesture::VSign
            } else if hand.dz(INDEX_TIP, MIDDLE_TIP) < self.config.closed_depth {
                Gesture::TwoFingerClosed
            } else {
                Gesture::Mid
            };
        }

        match Gesture::from_fingers(fingers) {
            // templates only claim codes with no built-in meaning
            Gesture::Other(code) => self
                .match_template(hand)
                .map(Gesture::Custom)
                .unwrap_or(Gesture::Other(code)),
            named => named,
        }
    }

    fn match_template(&self, hand: &HandObservation) -> Option<CommandId> {
        let library = self.library.as_ref()?;
        let (name, score) = library.recognize(hand)?;
        debug!(template = %name, score, "custom template matched");
        library.command_for(&name)
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default(), FingerEncoder::default())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::landmarks::fixtures::hand;
    use crate::landmarks::{Handedness, THUMB_IP};
    use nalgebra::Vector3;

    /// Middle, ring and pinky open with thumb and index tips touching.
    pub fn pinch(handedness: Handedness) -> HandObservation {
        let mut obs = hand([false, true, true, true], handedness);
        let tip = obs.landmarks[INDEX_TIP];
        obs.landmarks[THUMB_TIP] = Vector3::new(tip.x - 0.01, tip.y, 0.0);
        obs.landmarks[THUMB_IP] = Vector3::new(tip.x - 0.04, tip.y + 0.03, 0.0);
        obs
    }

    /// Index and middle open; tips spread by `spread` horizontally.
    pub fn two_fingers(spread: f64, depth_gap: f64, handedness: Handedness) -> HandObservation {
        let mut obs = hand([true, true, false, false], handedness);
        let base_x = obs.landmarks[INDEX_MCP].x;
        obs.landmarks[INDEX_TIP].x = base_x - spread / 2.0 + 0.02;
        obs.landmarks[MIDDLE_TIP].x = base_x + spread / 2.0 + 0.02;
        obs.landmarks[MIDDLE_TIP].z = depth_gap;
        obs
    }
}
