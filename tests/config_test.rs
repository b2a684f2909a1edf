//! Configuration loading, validation, and round-trip tests

use hand_gesture_detection::config::{Config, ProximityMode, EXAMPLE_CONFIG};

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_example_config_parses_and_validates() {
    let config: Config = serde_yaml::from_str(EXAMPLE_CONFIG).expect("example config should parse");
    assert!(config.validate().is_ok());
    assert_eq!(config.touch_proof.proximity_mode, ProximityMode::Adaptive);
}

#[test]
fn test_partial_yaml_fills_in_defaults() {
    let yaml = r"
touch_proof:
  proximity_enter: 0.10
circular:
  min_angle_deg: 120.0
";
    let config: Config = serde_yaml::from_str(yaml).expect("partial config should parse");
    assert_eq!(config.touch_proof.proximity_enter, 0.10);
    assert_eq!(config.circular.min_angle_deg, 120.0);

    // Untouched sections keep their defaults
    let defaults = Config::default();
    assert_eq!(config.touch_proof.proximity_exit, defaults.touch_proof.proximity_exit);
    assert_eq!(config.velocity.window_ms, defaults.velocity.window_ms);
    assert_eq!(config.kinematics.buffer_frames, defaults.kinematics.buffer_frames);
}

#[test]
fn test_file_round_trip() {
    let dir = std::env::temp_dir().join("gesture-config-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.yaml");

    let mut config = Config::default();
    config.touch_proof.proximity_enter = 0.11;
    config.circular.cooldown_ms = 750;
    config.to_file(&path).expect("write config");

    let loaded = Config::from_file(&path).expect("read config");
    assert_eq!(loaded.touch_proof.proximity_enter, 0.11);
    assert_eq!(loaded.circular.cooldown_ms, 750);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::from_file("/nonexistent/path/config.yaml").is_err());
}

#[test]
fn test_inverted_thresholds_rejected() {
    let mut config = Config::default();
    config.touch_proof.proximity_enter = 0.5;
    config.touch_proof.proximity_exit = 0.2;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.touch_proof.fused_exit_threshold = 0.9;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.circular.min_angle_deg = 1000.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.velocity.smoothing_factor = 1.5;
    assert!(config.validate().is_err());
}

#[test]
fn test_proximity_mode_lowercase_names() {
    let yaml = r"
touch_proof:
  proximity_mode: logarithmic
";
    let config: Config = serde_yaml::from_str(yaml).expect("mode name should parse");
    assert_eq!(config.touch_proof.proximity_mode, ProximityMode::Logarithmic);
}
