//! Input types produced by the upstream hand perception collaborator.
//!
//! The core borrows landmark slices per frame and never retains them;
//! the caller owns the detection data.

use serde::{Deserialize, Serialize};

use crate::constants::NUM_HAND_LANDMARKS;

/// One normalized 2-D hand keypoint with optional confidence scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// X coordinate in normalized image space (0-1)
    pub x: f64,
    /// Y coordinate in normalized image space (0-1)
    pub y: f64,
    /// Visibility score (0-1), if the perception model provides one
    #[serde(default)]
    pub visibility: Option<f64>,
    /// Presence score (0-1), if the perception model provides one
    #[serde(default)]
    pub presence: Option<f64>,
}

impl Landmark {
    /// Create a landmark without visibility/presence scores
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            visibility: None,
            presence: None,
        }
    }

    /// Create a landmark with a visibility score
    #[must_use]
    pub const fn with_visibility(x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            visibility: Some(visibility),
            presence: None,
        }
    }
}

/// A confidence-gated single-hand detection from the perception collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandDetection {
    /// 21 landmarks in the model's fixed index convention
    pub landmarks: Vec<Landmark>,
    /// Handedness label ("Left"/"Right")
    pub handedness: String,
    /// Overall detection confidence (0-1)
    pub confidence: f64,
}

impl HandDetection {
    /// Whether the detection carries a full landmark set
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= NUM_HAND_LANDMARKS
    }
}
