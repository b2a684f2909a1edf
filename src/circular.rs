//! Circular and arc gesture detection on the fingertip trail.
//!
//! Consumes the smoothed fingertip trail while two fingers are touching and
//! accumulates the signed turning angle between consecutive trail segments.
//! A gesture completes when enough angle accumulates in a consistent
//! direction fast enough; completion starts a cooldown window during which
//! the detector stays silent.

use std::collections::VecDeque;

use log::debug;
use serde::Serialize;

use crate::{config::CircularConfig, constants::DEFAULT_FPS, Result};

/// Rotation direction of a completed circular gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CircularDirection {
    #[serde(rename = "CW")]
    Clockwise,
    #[serde(rename = "CCW")]
    CounterClockwise,
}

/// A completed circular gesture
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CircularEvent {
    /// Completion timestamp, milliseconds
    pub ts_ms: i64,
    /// Rotation direction
    pub direction: CircularDirection,
    /// Total accumulated angle, degrees (always positive)
    pub total_angle_deg: f64,
    /// Gesture strength in [0, 1], from angle coverage and consistency
    pub strength: f64,
    /// Time from gesture start to completion, milliseconds
    pub duration_ms: i64,
}

/// One frame's circular detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularDetection {
    /// Completed gesture, if one finished this frame
    pub event: Option<CircularEvent>,
    /// Whether a candidate gesture is currently being tracked
    pub is_active: bool,
    /// Signed angle accumulated so far, degrees
    pub accumulated_angle: f64,
}

impl CircularDetection {
    const fn inactive() -> Self {
        Self {
            event: None,
            is_active: false,
            accumulated_angle: 0.0,
        }
    }
}

/// Detects circular and arc motions while two fingers are touching
pub struct CircularDetector {
    config: CircularConfig,
    exit_speed: f64,

    is_active: bool,
    start_time_ms: i64,
    accumulated_angle: f64,
    direction: Option<CircularDirection>,
    angle_changes: Vec<f64>,
    cooldown_until_ms: i64,
}

impl CircularDetector {
    /// Create a detector from validated configuration
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid
    pub fn new(config: CircularConfig) -> Result<Self> {
        config.validate()?;
        let exit_speed = config.min_speed * config.exit_speed_factor;
        Ok(Self {
            config,
            exit_speed,
            is_active: false,
            start_time_ms: 0,
            accumulated_angle: 0.0,
            direction: None,
            angle_changes: Vec::new(),
            cooldown_until_ms: 0,
        })
    }

    /// Feed the latest fingertip trail.
    ///
    /// `trail` holds aligned fingertip positions oldest-first;
    /// `finger_length` normalizes speeds so the gesture behaves the same at
    /// any hand distance. A lost touch resets all tracking state.
    pub fn update(
        &mut self,
        trail: &VecDeque<(f64, f64)>,
        finger_length: f64,
        is_touching: bool,
        ts_now_ms: i64,
    ) -> CircularDetection {
        if ts_now_ms < self.cooldown_until_ms {
            return CircularDetection::inactive();
        }

        if !is_touching {
            self.reset();
            return CircularDetection::inactive();
        }

        // Angle needs three points; a degenerate finger length would blow
        // up the speed normalization
        if trail.len() < 3 || finger_length <= 1e-6 {
            return CircularDetection::inactive();
        }

        let p0 = trail[trail.len() - 3];
        let p1 = trail[trail.len() - 2];
        let p2 = trail[trail.len() - 1];

        let dx = (p2.0 - p1.0) / finger_length;
        let dy = (p2.1 - p1.1) / finger_length;
        let speed = dx.hypot(dy) * DEFAULT_FPS;

        let v1 = (p1.0 - p0.0, p1.1 - p0.1);
        let v2 = (p2.0 - p1.0, p2.1 - p1.1);

        // Jittery near-zero segments carry no direction information
        if v1.0.hypot(v1.1) > 1e-6 && v2.0.hypot(v2.1) > 1e-6 {
            let cross = v1.0 * v2.1 - v1.1 * v2.0;
            let dot = v1.0 * v2.0 + v1.1 * v2.1;
            let angle_deg = cross.atan2(dot).to_degrees();

            if !self.is_active && speed >= self.config.min_speed {
                self.start(ts_now_ms, angle_deg);
            } else if self.is_active {
                if ts_now_ms - self.start_time_ms > self.config.max_duration_ms {
                    return self.abort("timeout");
                }
                if speed < self.exit_speed {
                    return self.abort("slow");
                }

                if self.is_consistent_direction(angle_deg) {
                    self.accumulated_angle += angle_deg;
                    self.angle_changes.push(angle_deg);

                    let abs_angle = self.accumulated_angle.abs();
                    if abs_angle >= self.config.min_angle_deg {
                        return self.complete(ts_now_ms);
                    }
                    if abs_angle > self.config.max_angle_deg {
                        return self.abort("too far");
                    }
                }
            }
        }

        CircularDetection {
            event: None,
            is_active: self.is_active,
            accumulated_angle: self.accumulated_angle,
        }
    }

    /// Clear all tracking state (the cooldown window is left in place)
    pub fn reset(&mut self) {
        self.is_active = false;
        self.start_time_ms = 0;
        self.accumulated_angle = 0.0;
        self.direction = None;
        self.angle_changes.clear();
    }

    fn start(&mut self, ts_ms: i64, initial_angle: f64) {
        self.is_active = true;
        self.start_time_ms = ts_ms;
        self.accumulated_angle = initial_angle;
        self.angle_changes.clear();
        self.angle_changes.push(initial_angle);
        self.direction = Some(if initial_angle > 0.0 {
            CircularDirection::Clockwise
        } else {
            CircularDirection::CounterClockwise
        });
    }

    /// Small counter-rotations up to the tolerance are forgiven; anything
    /// beyond it breaks the accumulation
    fn is_consistent_direction(&self, angle_deg: f64) -> bool {
        match self.direction {
            Some(CircularDirection::Clockwise) => angle_deg > -self.config.angle_tolerance_deg,
            _ => angle_deg < self.config.angle_tolerance_deg,
        }
    }

    fn complete(&mut self, ts_ms: i64) -> CircularDetection {
        let duration_ms = ts_ms - self.start_time_ms;
        let total_angle = self.accumulated_angle.abs();

        let angle_score = (total_angle / 180.0).min(1.0);
        let strength = 0.7 * angle_score + 0.3 * self.consistency();

        let event = CircularEvent {
            ts_ms,
            // Direction is always set while active
            direction: self.direction.unwrap_or(CircularDirection::Clockwise),
            total_angle_deg: total_angle,
            strength,
            duration_ms,
        };
        debug!(
            "circular gesture complete: {:?} {:.1} deg in {} ms",
            event.direction, event.total_angle_deg, event.duration_ms
        );

        self.reset();
        self.cooldown_until_ms = ts_ms + self.config.cooldown_ms;

        CircularDetection {
            event: Some(event),
            is_active: false,
            accumulated_angle: 0.0,
        }
    }

    fn abort(&mut self, reason: &str) -> CircularDetection {
        debug!("circular gesture aborted: {reason}");
        self.reset();
        CircularDetection::inactive()
    }

    /// Fraction of angle changes that agreed with the gesture direction
    fn consistency(&self) -> f64 {
        if self.angle_changes.is_empty() {
            return 0.0;
        }
        let consistent = match self.direction {
            Some(CircularDirection::Clockwise) => self.angle_changes.iter().filter(|a| **a > 0.0).count(),
            _ => self.angle_changes.iter().filter(|a| **a < 0.0).count(),
        };
        consistent as f64 / self.angle_changes.len() as f64
    }
}
