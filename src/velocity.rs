//! Scroll velocity from two-finger touch motion.
//!
//! `VelocityTracker` turns the fingertip midpoint into a smoothed velocity
//! over a short time window; `VelocityController` gates that velocity with
//! a minimal idle/scrolling state machine. Velocities are in normalized
//! image units per second.

use std::collections::VecDeque;

use serde::Serialize;

use crate::{config::VelocityConfig, Result};

/// 2-D velocity vector, normalized units per second
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vec2D {
    pub x: f64,
    pub y: f64,
}

impl Vec2D {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// One timestamped midpoint sample
#[derive(Debug, Clone, Copy)]
struct PositionSample {
    x: f64,
    y: f64,
    timestamp_ms: i64,
}

/// Tracks fingertip-midpoint velocity over a sliding time window
pub struct VelocityTracker {
    config: VelocityConfig,
    samples: VecDeque<PositionSample>,
    last_velocity: Option<Vec2D>,
}

impl VelocityTracker {
    /// Create a tracker from validated configuration
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid
    pub fn new(config: VelocityConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            samples: VecDeque::new(),
            last_velocity: None,
        })
    }

    /// Feed one frame's fingertip positions.
    ///
    /// Returns `None` while not touching (which also resets the tracker),
    /// while fewer than two samples span the window, or when timestamps do
    /// not advance.
    pub fn update(
        &mut self,
        index_tip: (f64, f64),
        middle_tip: (f64, f64),
        is_touching: bool,
        timestamp_ms: i64,
    ) -> Option<Vec2D> {
        if !is_touching {
            self.reset();
            return None;
        }

        let mid_x = (index_tip.0 + middle_tip.0) / 2.0;
        let mid_y = (index_tip.1 + middle_tip.1) / 2.0;
        self.samples.push_back(PositionSample {
            x: mid_x,
            y: mid_y,
            timestamp_ms,
        });

        let cutoff = timestamp_ms - self.config.window_ms;
        while self.samples.front().is_some_and(|s| s.timestamp_ms < cutoff) {
            self.samples.pop_front();
        }

        // Too few samples yet: no velocity, smoothing state untouched
        if self.samples.len() < 2 {
            return None;
        }

        // A stalled window (non-advancing timestamps) clears the smoothing
        // state, so the next velocity starts fresh
        let Some(raw) = self.window_velocity() else {
            self.last_velocity = None;
            return None;
        };

        let velocity = match self.last_velocity {
            Some(prev) => {
                let alpha = self.config.smoothing_factor;
                Vec2D {
                    x: alpha * raw.x + (1.0 - alpha) * prev.x,
                    y: alpha * raw.y + (1.0 - alpha) * prev.y,
                }
            }
            None => raw,
        };

        self.last_velocity = Some(velocity);
        Some(velocity)
    }

    /// Clear samples and smoothing state
    pub fn reset(&mut self) {
        self.samples.clear();
        self.last_velocity = None;
    }

    /// End-to-end velocity across the sample window, with a small noise
    /// floor applied per axis
    fn window_velocity(&self) -> Option<Vec2D> {
        let first = self.samples.front()?;
        let last = self.samples.back()?;
        if self.samples.len() < 2 {
            return None;
        }

        let dt_ms = last.timestamp_ms - first.timestamp_ms;
        if dt_ms <= 0 {
            return None;
        }

        let mut vx = (last.x - first.x) * 1000.0 / dt_ms as f64;
        let mut vy = (last.y - first.y) * 1000.0 / dt_ms as f64;

        // Noise floor is expressed per millisecond of normalized motion
        let floor = self.config.noise_threshold / 1000.0;
        if vx.abs() < floor {
            vx = 0.0;
        }
        if vy.abs() < floor {
            vy = 0.0;
        }

        Some(Vec2D { x: vx, y: vy })
    }
}

/// Scroll gesture state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureState {
    Idle,
    Scrolling,
}

/// One frame's controller output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityUpdate {
    /// Velocity to apply (zero when none is available)
    pub velocity: Vec2D,
    /// Current gesture state
    pub state: GestureState,
    /// Whether scrolling should act this frame
    pub is_active: bool,
}

/// Minimal state machine gating tracked velocity into scroll activity.
///
/// Scrolling starts when touching fingers move faster than the minimum
/// velocity and ends when the touch lifts; an open-palm pose overrides
/// everything and forces idle.
pub struct VelocityController {
    min_velocity: f64,
    state: GestureState,
    was_touching: bool,
}

impl VelocityController {
    #[must_use]
    pub const fn new(min_velocity: f64) -> Self {
        Self {
            min_velocity,
            state: GestureState::Idle,
            was_touching: false,
        }
    }

    /// Current gesture state
    #[must_use]
    pub const fn state(&self) -> GestureState {
        self.state
    }

    pub fn update(&mut self, velocity: Option<Vec2D>, is_touching: bool, is_open_palm: bool) -> VelocityUpdate {
        if is_open_palm {
            self.state = GestureState::Idle;
            self.was_touching = is_touching;
            return VelocityUpdate {
                velocity: Vec2D::ZERO,
                state: self.state,
                is_active: false,
            };
        }

        match self.state {
            GestureState::Idle => {
                if is_touching && velocity.is_some_and(|v| v.magnitude() > self.min_velocity) {
                    self.state = GestureState::Scrolling;
                }
            }
            GestureState::Scrolling => {
                // Momentum after release is the host platform's concern
                if !is_touching && self.was_touching {
                    self.state = GestureState::Idle;
                }
            }
        }

        self.was_touching = is_touching;

        VelocityUpdate {
            velocity: velocity.unwrap_or(Vec2D::ZERO),
            state: self.state,
            is_active: self.state == GestureState::Scrolling && is_touching,
        }
    }
}
