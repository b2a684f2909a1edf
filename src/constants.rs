//! Constants used throughout the library

/// Number of landmarks per tracked hand
pub const NUM_HAND_LANDMARKS: usize = 21;

/// Landmark indices, fixed by the upstream perception model's convention
pub const WRIST: usize = 0;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;

/// Default frames per second assumption for speed estimates
pub const DEFAULT_FPS: f64 = 30.0;

/// Reference pixel distance for log-compressed fingertip separation
pub const LOG_DISTANCE_REFERENCE_PX: f64 = 30.0;

/// Finger length in pixels when the hand is close to the camera
pub const DISTANCE_NEAR_PX: f64 = 200.0;

/// Pixel span between the near and far finger-length anchors
pub const DISTANCE_SPAN_PX: f64 = 150.0;

/// Floor for the alignment scale to avoid division by zero
pub const MIN_ALIGNMENT_SCALE: f64 = 1e-3;

/// Steepness of the sigmoid used by adaptive proximity scoring
pub const ADAPTIVE_PROXIMITY_STEEPNESS: f64 = 6.0;

/// EMA alpha for the raw inter-tip angle (faster than proximity smoothing)
pub const ANGLE_EMA_ALPHA: f64 = 0.2;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-9;

/// Epsilon below which a vector is treated as zero-length
pub const ZERO_VECTOR_EPSILON: f64 = 1e-6;
