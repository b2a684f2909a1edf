//! Coarse hand-pose checks used as gesture modifiers.
//!
//! These are deliberately rough single-frame heuristics on normalized
//! landmark coordinates; the open-palm flag is what stops an in-flight
//! scroll.

use crate::{
    constants::{INDEX_MCP, INDEX_TIP, MIDDLE_TIP, NUM_HAND_LANDMARKS, PINKY_MCP, RING_TIP},
    landmarks::Landmark,
};

/// Per-frame pose flags, all false when the hand is incomplete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoseFlags {
    /// Fingers spread wide (index MCP far from pinky MCP)
    pub open_palm: bool,
    /// Index tip clearly beyond the middle tip
    pub pointing_index: bool,
    /// Index and middle tips both raised above the ring tip
    pub two_up: bool,
}

/// Classify the hand pose from one frame's landmarks.
///
/// Image coordinates grow downward, so "above" means a smaller y.
#[must_use]
pub fn check_hand_pose(landmarks: &[Landmark]) -> PoseFlags {
    if landmarks.len() < NUM_HAND_LANDMARKS {
        return PoseFlags::default();
    }

    let index_mcp = landmarks[INDEX_MCP];
    let pinky_mcp = landmarks[PINKY_MCP];
    let index_tip = landmarks[INDEX_TIP];
    let middle_tip = landmarks[MIDDLE_TIP];
    let ring_tip = landmarks[RING_TIP];

    let spread = (index_mcp.x - pinky_mcp.x).abs();

    PoseFlags {
        open_palm: spread > 0.12,
        pointing_index: index_tip.y < middle_tip.y - 0.02,
        two_up: index_tip.y < ring_tip.y - 0.02 && middle_tip.y < ring_tip.y - 0.02,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_hand() -> Vec<Landmark> {
        let mut lms = vec![Landmark::new(0.5, 0.5); NUM_HAND_LANDMARKS];
        lms[INDEX_MCP] = Landmark::new(0.45, 0.5);
        lms[PINKY_MCP] = Landmark::new(0.55, 0.5);
        lms[INDEX_TIP] = Landmark::new(0.45, 0.45);
        lms[MIDDLE_TIP] = Landmark::new(0.50, 0.45);
        lms[RING_TIP] = Landmark::new(0.53, 0.45);
        lms
    }

    #[test]
    fn test_short_list_yields_no_flags() {
        let flags = check_hand_pose(&[Landmark::new(0.5, 0.5); 10]);
        assert_eq!(flags, PoseFlags::default());
    }

    #[test]
    fn test_open_palm_requires_wide_spread() {
        let mut lms = base_hand();
        assert!(!check_hand_pose(&lms).open_palm);

        lms[INDEX_MCP] = Landmark::new(0.40, 0.5);
        lms[PINKY_MCP] = Landmark::new(0.60, 0.5);
        assert!(check_hand_pose(&lms).open_palm);
    }

    #[test]
    fn test_pointing_index() {
        let mut lms = base_hand();
        lms[INDEX_TIP] = Landmark::new(0.45, 0.30);
        lms[MIDDLE_TIP] = Landmark::new(0.50, 0.45);
        assert!(check_hand_pose(&lms).pointing_index);

        // Tips level: margin not met
        lms[INDEX_TIP] = Landmark::new(0.45, 0.44);
        assert!(!check_hand_pose(&lms).pointing_index);
    }

    #[test]
    fn test_two_up_needs_both_tips_raised() {
        let mut lms = base_hand();
        lms[INDEX_TIP] = Landmark::new(0.45, 0.30);
        lms[MIDDLE_TIP] = Landmark::new(0.50, 0.30);
        lms[RING_TIP] = Landmark::new(0.53, 0.50);
        assert!(check_hand_pose(&lms).two_up);

        // Ring tip raised too: no longer a two-finger pose
        lms[RING_TIP] = Landmark::new(0.53, 0.30);
        assert!(!check_hand_pose(&lms).two_up);
    }
}
