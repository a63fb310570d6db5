// src/hands.rs
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::landmarks::{HandObservation, Handedness};

/// Dominant (major) or secondary (minor) hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Major,
    Minor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Major => "major",
            Role::Minor => "minor",
        }
    }
}

/// Hands assigned to roles for one frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleAssignment<'a> {
    pub major: Option<&'a HandObservation>,
    pub minor: Option<&'a HandObservation>,
}

impl<'a> RoleAssignment<'a> {
    pub fn get(&self, role: Role) -> Option<&'a HandObservation> {
        match role {
            Role::Major => self.major,
            Role::Minor => self.minor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.major.is_none() && self.minor.is_none()
    }
}

/// Maps left/right detections onto major/minor roles.
#[derive(Debug, Clone, Copy)]
pub struct RoleResolver {
    pub dominant: Handedness,
}

impl RoleResolver {
    pub fn new(dominant: Handedness) -> Self {
        Self { dominant }
    }

    /// Assigns up to two observations. When two observations report the same
    /// handedness the one with the larger bounding box keeps the slot and the
    /// other is dropped for this frame.
    pub fn resolve<'a>(&self, hands: &'a [HandObservation]) -> RoleAssignment<'a> {
        let mut left: Option<&HandObservation> = None;
        let mut right: Option<&HandObservation> = None;

        for hand in hands.iter().take(2) {
            let slot = match hand.handedness {
                Handedness::Left => &mut left,
                Handedness::Right => &mut right,
            };
            match *slot {
                Some(existing) if existing.bounding_area() >= hand.bounding_area() => {
                    debug!(handedness = ?hand.handedness, "duplicate handedness, keeping larger hand");
                }
                _ => *slot = Some(hand),
            }
        }

        match self.dominant {
            Handedness::Right => RoleAssignment { major: right, minor: left },
            Handedness::Left => RoleAssignment { major: left, minor: right },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::fixtures::{hand, shifted};

    #[test]
    fn dominant_hand_is_major() {
        let hands = vec![hand([true; 4], Handedness::Left), hand([false; 4], Handedness::Right)];

        let right_handed = RoleResolver::new(Handedness::Right).resolve(&hands);
        assert_eq!(right_handed.major.map(|h| h.handedness), Some(Handedness::Right));
        assert_eq!(right_handed.minor.map(|h| h.handedness), Some(Handedness::Left));

        let left_handed = RoleResolver::new(Handedness::Left).resolve(&hands);
        assert_eq!(left_handed.get(Role::Major).map(|h| h.handedness), Some(Handedness::Left));
    }

    #[test]
    fn missing_side_leaves_role_empty() {
        let hands = vec![hand([true; 4], Handedness::Left)];
        let roles = RoleResolver::new(Handedness::Right).resolve(&hands);
        assert!(roles.major.is_none());
        assert!(roles.minor.is_some());
        assert!(RoleResolver::new(Handedness::Right).resolve(&[]).is_empty());
    }

    #[test]
    fn duplicate_label_keeps_larger_hand() {
        // a fist covers less area than an open hand
        let small = shifted(hand([false; 4], Handedness::Right), 0.1, 0.0);
        let large = hand([true; 4], Handedness::Right);
        let both = [small.clone(), large.clone()];
        let roles = RoleResolver::new(Handedness::Right).resolve(&both);
        assert_eq!(roles.major, Some(&both[1]));
        assert!(roles.minor.is_none());

        let reversed = [large, small];
        let roles = RoleResolver::new(Handedness::Right).resolve(&reversed);
        assert_eq!(roles.major, Some(&reversed[0]));
    }
}
