//! Configuration for the gesture detection pipeline.
//!
//! Each detector takes its own config struct at construction and rejects
//! invalid threshold orderings there; the top-level [`Config`] only adds
//! YAML load/save on top.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Kinematics tracking configuration
    pub kinematics: KinematicsConfig,

    /// Touch detection configuration
    pub touch_proof: TouchProofConfig,

    /// Circular gesture configuration
    pub circular: CircularConfig,

    /// Velocity (scroll) mode configuration
    pub velocity: VelocityConfig,
}

/// Proximity scoring mode for the touch detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProximityMode {
    /// Fixed enter/exit thresholds in aligned space
    Fixed,
    /// Baseline-learned relative thresholds with sigmoid scoring
    Adaptive,
    /// Log-compressed pixel distance
    Logarithmic,
}

/// Kinematics tracking parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicsConfig {
    /// EMA alpha for fingertip smoothing (0-1)
    pub ema_alpha: f64,

    /// Trail buffer capacity in frames
    pub buffer_frames: usize,

    /// Frames to look back for speed queries
    pub frame_lookback: usize,
}

/// Touch detection (multi-signal fusion) parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchProofConfig {
    /// Normalized inter-tip distance to consider close
    pub proximity_enter: f64,

    /// Normalized inter-tip distance to consider far
    pub proximity_exit: f64,

    /// Auto-fail distance; beyond this no further signals are computed
    pub proximity_hard_cap: f64,

    /// Max inter-tip angle for parallel fingers (degrees)
    pub angle_enter_deg: f64,

    /// Exit angle threshold (degrees)
    pub angle_exit_deg: f64,

    /// Auto-fail angle threshold (degrees)
    pub angle_hard_cap_deg: f64,

    /// Frames in the velocity-correlation window
    pub correlation_frames: usize,

    /// Correlation at or above this scores a full 1.0
    pub correlation_min: f64,

    /// Minimum visibility asymmetry for a full occlusion score
    pub visibility_asymmetry_min: f64,

    /// Consecutive over-threshold frames required to enter touch
    pub frames_to_enter: usize,

    /// Consecutive under-threshold frames required to exit touch
    pub frames_to_exit: usize,

    /// Fused score that arms the enter counter
    pub fused_enter_threshold: f64,

    /// Fused score below which the exit counter advances
    pub fused_exit_threshold: f64,

    /// EMA alpha for the proximity score
    pub ema_alpha: f64,

    /// Apply EMA smoothing to the proximity score
    pub smooth_proximity: bool,

    /// Proximity scoring mode
    pub proximity_mode: ProximityMode,

    /// EMA learning rate for the adaptive separation baselines
    pub baseline_learning_rate: f64,

    /// Relative baseline/distance ratio treated as touch center
    pub relative_touch_threshold: f64,

    /// Proximity threshold widening per unit of distance factor
    pub k_d: f64,

    /// Angle threshold narrowing per unit of closeness (degrees)
    pub k_theta: f64,

    /// Optical-flow history window (frames)
    pub mfc_window_frames: usize,

    /// Lucas-Kanade search patch size (pixels)
    pub mfc_patch_size: i32,
}

/// Circular gesture detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircularConfig {
    /// Accumulated angle that completes a gesture (degrees)
    pub min_angle_deg: f64,

    /// Accumulated angle beyond which the gesture aborts (degrees)
    pub max_angle_deg: f64,

    /// Minimum normalized speed to begin accumulating
    pub min_speed: f64,

    /// Exit speed as a fraction of the entry minimum
    pub exit_speed_factor: f64,

    /// Abort gestures running longer than this (ms)
    pub max_duration_ms: i64,

    /// Cooldown after every completed or aborted detection (ms)
    pub cooldown_ms: i64,

    /// Tolerated counter-direction angle increment (degrees)
    pub angle_tolerance_deg: f64,
}

/// Velocity (continuous scroll) mode parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    /// Time window for velocity estimation (ms)
    pub window_ms: i64,

    /// EMA smoothing factor for the velocity vector (0-1)
    pub smoothing_factor: f64,

    /// Velocity components below this floor are zeroed (pixels)
    pub noise_threshold: f64,

    /// Minimum velocity magnitude to start scrolling
    pub min_velocity: f64,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            ema_alpha: 0.35,
            buffer_frames: 24,
            frame_lookback: 5,
        }
    }
}

impl Default for TouchProofConfig {
    fn default() -> Self {
        Self {
            proximity_enter: 0.15,
            proximity_exit: 0.25,
            proximity_hard_cap: 0.70,
            angle_enter_deg: 20.0,
            angle_exit_deg: 28.0,
            angle_hard_cap_deg: 45.0,
            correlation_frames: 5,
            correlation_min: 0.70,
            visibility_asymmetry_min: 0.12,
            frames_to_enter: 3,
            frames_to_exit: 3,
            fused_enter_threshold: 0.8,
            fused_exit_threshold: 0.6,
            ema_alpha: 0.3,
            smooth_proximity: true,
            proximity_mode: ProximityMode::Adaptive,
            baseline_learning_rate: 0.02,
            relative_touch_threshold: 0.85,
            k_d: 0.30,
            k_theta: 4.0,
            mfc_window_frames: 5,
            mfc_patch_size: 15,
        }
    }
}

impl Default for CircularConfig {
    fn default() -> Self {
        Self {
            min_angle_deg: 90.0,
            max_angle_deg: 720.0,
            min_speed: 1.5,
            exit_speed_factor: 0.5,
            max_duration_ms: 1000,
            cooldown_ms: 500,
            angle_tolerance_deg: 45.0,
        }
    }
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            window_ms: 100,
            smoothing_factor: 0.3,
            noise_threshold: 0.5,
            min_velocity: 0.001,
        }
    }
}

impl TouchProofConfig {
    /// Validate ordering invariants and parameter ranges
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first violated invariant
    pub fn validate(&self) -> Result<()> {
        if self.proximity_enter >= self.proximity_exit {
            return Err(Error::ConfigError(
                "proximity_enter must be less than proximity_exit".to_string(),
            ));
        }
        if self.proximity_exit > self.proximity_hard_cap {
            return Err(Error::ConfigError(
                "proximity_exit must not exceed proximity_hard_cap".to_string(),
            ));
        }
        if self.angle_enter_deg >= self.angle_exit_deg {
            return Err(Error::ConfigError(
                "angle_enter_deg must be less than angle_exit_deg".to_string(),
            ));
        }
        if self.angle_exit_deg > self.angle_hard_cap_deg {
            return Err(Error::ConfigError(
                "angle_exit_deg must not exceed angle_hard_cap_deg".to_string(),
            ));
        }
        if self.fused_exit_threshold >= self.fused_enter_threshold {
            return Err(Error::ConfigError(
                "fused_exit_threshold must be less than fused_enter_threshold".to_string(),
            ));
        }
        if self.frames_to_enter == 0 || self.frames_to_exit == 0 {
            return Err(Error::ConfigError(
                "frames_to_enter and frames_to_exit must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.ema_alpha) || self.ema_alpha == 0.0 {
            return Err(Error::ConfigError("ema_alpha must be in (0, 1]".to_string()));
        }
        if self.correlation_frames == 0 {
            return Err(Error::ConfigError(
                "correlation_frames must be greater than 0".to_string(),
            ));
        }
        if self.mfc_window_frames < 3 {
            return Err(Error::ConfigError(
                "mfc_window_frames must be at least 3".to_string(),
            ));
        }
        if self.mfc_patch_size <= 0 {
            return Err(Error::ConfigError("mfc_patch_size must be positive".to_string()));
        }
        Ok(())
    }
}

impl CircularConfig {
    /// Validate ordering invariants and parameter ranges
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first violated invariant
    pub fn validate(&self) -> Result<()> {
        if self.min_angle_deg <= 0.0 || self.min_angle_deg >= self.max_angle_deg {
            return Err(Error::ConfigError(
                "min_angle_deg must be positive and less than max_angle_deg".to_string(),
            ));
        }
        if self.min_speed <= 0.0 {
            return Err(Error::ConfigError("min_speed must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.exit_speed_factor) || self.exit_speed_factor == 0.0 {
            return Err(Error::ConfigError(
                "exit_speed_factor must be in (0, 1]".to_string(),
            ));
        }
        if self.max_duration_ms <= 0 || self.cooldown_ms < 0 {
            return Err(Error::ConfigError(
                "max_duration_ms must be positive and cooldown_ms non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl VelocityConfig {
    /// Validate parameter ranges
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first violated invariant
    pub fn validate(&self) -> Result<()> {
        if self.window_ms <= 0 {
            return Err(Error::ConfigError("window_ms must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.smoothing_factor) || self.smoothing_factor == 0.0 {
            return Err(Error::ConfigError(
                "smoothing_factor must be in (0, 1]".to_string(),
            ));
        }
        if self.min_velocity < 0.0 || self.noise_threshold < 0.0 {
            return Err(Error::ConfigError(
                "min_velocity and noise_threshold must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// parsed values violate an ordering invariant
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate all sub-configurations
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant across the sub-configs
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.kinematics.ema_alpha) || self.kinematics.ema_alpha == 0.0 {
            return Err(Error::ConfigError(
                "kinematics ema_alpha must be in (0, 1]".to_string(),
            ));
        }
        if self.kinematics.buffer_frames == 0 {
            return Err(Error::ConfigError(
                "kinematics buffer_frames must be greater than 0".to_string(),
            ));
        }
        self.touch_proof.validate()?;
        self.circular.validate()?;
        self.velocity.validate()?;
        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Hand Gesture Detection Configuration

# Fingertip smoothing and trails
kinematics:
  ema_alpha: 0.35
  buffer_frames: 24
  frame_lookback: 5

# Two-finger touch detection
touch_proof:
  proximity_enter: 0.15
  proximity_exit: 0.25
  proximity_hard_cap: 0.70
  angle_enter_deg: 20.0
  angle_exit_deg: 28.0
  angle_hard_cap_deg: 45.0
  correlation_frames: 5
  correlation_min: 0.70
  visibility_asymmetry_min: 0.12
  frames_to_enter: 3
  frames_to_exit: 3
  fused_enter_threshold: 0.8
  fused_exit_threshold: 0.6
  ema_alpha: 0.3
  smooth_proximity: true
  proximity_mode: "adaptive"
  baseline_learning_rate: 0.02
  relative_touch_threshold: 0.85
  k_d: 0.30
  k_theta: 4.0
  mfc_window_frames: 5
  mfc_patch_size: 15

# Circular gesture detection
circular:
  min_angle_deg: 90.0
  max_angle_deg: 720.0
  min_speed: 1.5
  exit_speed_factor: 0.5
  max_duration_ms: 1000
  cooldown_ms: 500
  angle_tolerance_deg: 45.0

# Velocity (scroll) mode
velocity:
  window_ms: 100
  smoothing_factor: 0.3
  noise_threshold: 0.5
  min_velocity: 0.001
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_config_parses_and_matches_defaults() {
        let parsed: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.touch_proof.proximity_enter, TouchProofConfig::default().proximity_enter);
        assert_eq!(parsed.circular.min_angle_deg, CircularConfig::default().min_angle_deg);
    }

    #[test]
    fn test_inverted_proximity_thresholds_rejected() {
        let config = TouchProofConfig {
            proximity_enter: 0.3,
            proximity_exit: 0.2,
            ..TouchProofConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fused_thresholds_must_be_ordered() {
        let config = TouchProofConfig {
            fused_enter_threshold: 0.5,
            fused_exit_threshold: 0.6,
            ..TouchProofConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hard_cap_must_dominate_exit() {
        let config = TouchProofConfig {
            proximity_hard_cap: 0.2,
            ..TouchProofConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TouchProofConfig {
            angle_hard_cap_deg: 25.0,
            ..TouchProofConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_circular_angle_ordering() {
        let config = CircularConfig {
            min_angle_deg: 800.0,
            ..CircularConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_velocity_window_must_be_positive() {
        let config = VelocityConfig {
            window_ms: 0,
            ..VelocityConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "touch_proof:\n  frames_to_enter: 5\n";
        let parsed: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.touch_proof.frames_to_enter, 5);
        assert_eq!(parsed.touch_proof.frames_to_exit, 3);
        assert_eq!(parsed.kinematics.buffer_frames, 24);
    }
}
