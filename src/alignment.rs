//! Hand-aligned coordinate frame.
//!
//! Converts raw normalized landmarks into a palm-centered frame that is
//! rotated to cancel hand orientation and scaled by finger length, so that
//! downstream distance and angle thresholds are invariant to hand rotation
//! and camera distance.

use crate::{
    constants::{
        DISTANCE_NEAR_PX, DISTANCE_SPAN_PX, INDEX_MCP, INDEX_TIP, LOG_DISTANCE_REFERENCE_PX, MIDDLE_MCP, MIDDLE_TIP,
        MIN_ALIGNMENT_SCALE, NUM_HAND_LANDMARKS, PINKY_MCP, RING_MCP, WRIST, ZERO_VECTOR_EPSILON,
    },
    landmarks::Landmark,
    utils::safe_cast::f64_to_i32_clamp,
};

/// Alignment parameters computed from one frame's landmarks
#[derive(Debug, Clone, Copy)]
struct AlignmentState {
    palm_center: (f64, f64),
    theta_rad: f64,
    scale: f64,
    image_width: i32,
    image_height: i32,
}

/// Coordinate transforms between image space and hand-aligned space
#[derive(Debug, Default)]
pub struct HandAligner {
    state: Option<AlignmentState>,
}

impl HandAligner {
    /// Create an aligner with no alignment state yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Update alignment parameters from hand landmarks.
    ///
    /// Returns `true` on success, `false` if fewer than 21 landmarks are
    /// supplied; in that case the previous state is kept.
    pub fn update(&mut self, landmarks: &[Landmark], image_width: i32, image_height: i32) -> bool {
        if landmarks.len() < NUM_HAND_LANDMARKS {
            return false;
        }

        // Palm center: mean of wrist + four MCP knuckles
        let wrist = landmarks[WRIST];
        let palm_points = [
            wrist,
            landmarks[INDEX_MCP],
            landmarks[MIDDLE_MCP],
            landmarks[RING_MCP],
            landmarks[PINKY_MCP],
        ];
        let n = palm_points.len() as f64;
        let palm_x = palm_points.iter().map(|p| p.x).sum::<f64>() / n;
        let palm_y = palm_points.iter().map(|p| p.y).sum::<f64>() / n;

        // Hand orientation: wrist to middle MCP
        let middle_mcp = landmarks[MIDDLE_MCP];
        let theta_rad = (middle_mcp.y - wrist.y).atan2(middle_mcp.x - wrist.x);

        // Scale: index finger length, floored to avoid division by zero
        let index_tip = landmarks[INDEX_TIP];
        let index_mcp = landmarks[INDEX_MCP];
        let finger_length = (index_tip.x - index_mcp.x).hypot(index_tip.y - index_mcp.y);
        let scale = finger_length.max(MIN_ALIGNMENT_SCALE);

        self.state = Some(AlignmentState {
            palm_center: (palm_x, palm_y),
            theta_rad,
            scale,
            image_width,
            image_height,
        });

        true
    }

    /// Convert normalized coordinates (0-1) to pixel coordinates
    #[must_use]
    pub fn normalized_to_pixel(&self, x_norm: f64, y_norm: f64) -> (i32, i32) {
        let Some(state) = self.state else {
            return (0, 0);
        };

        let x_px = f64_to_i32_clamp(x_norm * f64::from(state.image_width), 0, state.image_width);
        let y_px = f64_to_i32_clamp(y_norm * f64::from(state.image_height), 0, state.image_height);
        (x_px, y_px)
    }

    /// Convert pixel coordinates to normalized coordinates (0-1)
    #[must_use]
    pub fn pixel_to_normalized(&self, x_px: i32, y_px: i32) -> (f64, f64) {
        let Some(state) = self.state else {
            return (0.0, 0.0);
        };

        (
            f64::from(x_px) / f64::from(state.image_width),
            f64::from(y_px) / f64::from(state.image_height),
        )
    }

    /// Transform normalized coordinates to hand-aligned coordinates.
    ///
    /// Origin at palm center, rotated to cancel hand orientation, scaled
    /// by finger length.
    #[must_use]
    pub fn to_hand_aligned(&self, x_norm: f64, y_norm: f64) -> (f64, f64) {
        let Some(state) = self.state else {
            return (0.0, 0.0);
        };

        let x_rel = x_norm - state.palm_center.0;
        let y_rel = y_norm - state.palm_center.1;

        let (sin_theta, cos_theta) = (-state.theta_rad).sin_cos();
        let x_aligned = cos_theta * x_rel - sin_theta * y_rel;
        let y_aligned = sin_theta * x_rel + cos_theta * y_rel;

        (x_aligned / state.scale, y_aligned / state.scale)
    }

    /// Transform hand-aligned coordinates back to normalized coordinates
    #[must_use]
    pub fn from_hand_aligned(&self, x_aligned: f64, y_aligned: f64) -> (f64, f64) {
        let Some(state) = self.state else {
            return (0.0, 0.0);
        };

        let x_rel = x_aligned * state.scale;
        let y_rel = y_aligned * state.scale;

        let (sin_theta, cos_theta) = state.theta_rad.sin_cos();
        let x_norm_rel = cos_theta * x_rel - sin_theta * y_rel;
        let y_norm_rel = sin_theta * x_rel + cos_theta * y_rel;

        (x_norm_rel + state.palm_center.0, y_norm_rel + state.palm_center.1)
    }

    /// Index and middle fingertip positions in pixel coordinates
    #[must_use]
    pub fn fingertip_pixels(&self, landmarks: &[Landmark]) -> ((i32, i32), (i32, i32)) {
        if landmarks.len() < NUM_HAND_LANDMARKS {
            return ((0, 0), (0, 0));
        }

        let index_tip = landmarks[INDEX_TIP];
        let middle_tip = landmarks[MIDDLE_TIP];

        (
            self.normalized_to_pixel(index_tip.x, index_tip.y),
            self.normalized_to_pixel(middle_tip.x, middle_tip.y),
        )
    }

    /// Inter-tip distance in hand-aligned space.
    ///
    /// 0.0 means touching; 1.0 means one finger length apart. Returns
    /// infinity when no valid alignment is available.
    #[must_use]
    pub fn normalized_distance(&self, landmarks: &[Landmark]) -> f64 {
        if landmarks.len() < NUM_HAND_LANDMARKS || self.state.is_none() {
            return f64::INFINITY;
        }

        let index_tip = landmarks[INDEX_TIP];
        let middle_tip = landmarks[MIDDLE_TIP];

        let idx_aligned = self.to_hand_aligned(index_tip.x, index_tip.y);
        let mid_aligned = self.to_hand_aligned(middle_tip.x, middle_tip.y);

        (idx_aligned.0 - mid_aligned.0).hypot(idx_aligned.1 - mid_aligned.1)
    }

    /// Log-compressed inter-tip pixel distance.
    ///
    /// Compresses large separations and expands small ones, which is more
    /// stable across camera distances than the linear variant.
    #[must_use]
    pub fn normalized_distance_log(&self, landmarks: &[Landmark]) -> f64 {
        if landmarks.len() < NUM_HAND_LANDMARKS || self.state.is_none() {
            return f64::INFINITY;
        }

        let index_tip = landmarks[INDEX_TIP];
        let middle_tip = landmarks[MIDDLE_TIP];

        let index_px = self.normalized_to_pixel(index_tip.x, index_tip.y);
        let middle_px = self.normalized_to_pixel(middle_tip.x, middle_tip.y);

        let distance_px = f64::from(index_px.0 - middle_px.0).hypot(f64::from(index_px.1 - middle_px.1));

        (1.0 + distance_px).ln() / (1.0 + LOG_DISTANCE_REFERENCE_PX).ln()
    }

    /// Angle between the index and middle fingers seen from the palm center,
    /// in degrees (0 = parallel, 90 = perpendicular)
    #[must_use]
    pub fn fingertip_angle(&self, landmarks: &[Landmark]) -> f64 {
        if landmarks.len() < NUM_HAND_LANDMARKS {
            return 0.0;
        }

        let index_tip = landmarks[INDEX_TIP];
        let middle_tip = landmarks[MIDDLE_TIP];

        let idx_aligned = self.to_hand_aligned(index_tip.x, index_tip.y);
        let mid_aligned = self.to_hand_aligned(middle_tip.x, middle_tip.y);

        let idx_len = idx_aligned.0.hypot(idx_aligned.1);
        let mid_len = mid_aligned.0.hypot(mid_aligned.1);

        if idx_len < ZERO_VECTOR_EPSILON || mid_len < ZERO_VECTOR_EPSILON {
            return 0.0;
        }

        let dot = idx_aligned.0 * mid_aligned.0 + idx_aligned.1 * mid_aligned.1;
        // Clamp for acos domain safety
        let cos_angle = (dot / (idx_len * mid_len)).clamp(-1.0, 1.0);

        cos_angle.acos().to_degrees()
    }

    /// Camera-distance proxy: 0.0 = hand very close, 1.0 = far away.
    ///
    /// Derived from the on-screen finger length in pixels; returns a
    /// neutral 0.5 when no alignment is available.
    #[must_use]
    pub fn hand_distance_factor(&self) -> f64 {
        let Some(_) = self.state else {
            return 0.5;
        };

        let finger_px = self.finger_length_pixels();
        ((DISTANCE_NEAR_PX - finger_px) / DISTANCE_SPAN_PX).clamp(0.0, 1.0)
    }

    /// Index finger length in pixels (default 100 when unaligned)
    #[must_use]
    pub fn finger_length_pixels(&self) -> f64 {
        let Some(state) = self.state else {
            return 100.0;
        };

        state.scale * f64::from(state.image_width.max(state.image_height))
    }

    /// Whether a valid alignment has been computed
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.state.is_some()
    }
}
