//! Hand gesture detection from 21-point hand landmarks.
//!
//! This library turns per-frame hand landmarks (MediaPipe topology) and the
//! camera frame into three gesture outputs:
//!
//! - **Two-finger touch** ([`touch_proof::TouchProofDetector`]): fuses
//!   fingertip proximity, inter-tip angle, motion correlation, visibility
//!   asymmetry and optical-flow cohesion into a hysteresis-gated touch
//!   decision.
//! - **Circular gestures** ([`circular::CircularDetector`]): accumulates
//!   the signed turning angle of the fingertip trail while touching and
//!   emits [`circular::CircularEvent`]s.
//! - **Scroll velocity** ([`velocity::VelocityTracker`] and
//!   [`velocity::VelocityController`]): smoothed fingertip-midpoint
//!   velocity gated by an idle/scrolling state machine.
//!
//! A typical per-frame pipeline:
//!
//! ```no_run
//! use hand_gesture_detection::{
//!     circular::CircularDetector,
//!     config::Config,
//!     kinematics::KinematicsTracker,
//!     landmarks::Landmark,
//!     poses::check_hand_pose,
//!     touch_proof::TouchProofDetector,
//!     velocity::{VelocityController, VelocityTracker},
//! };
//! use opencv::core::Mat;
//!
//! # fn main() -> hand_gesture_detection::Result<()> {
//! let config = Config::default();
//! let mut kinematics = KinematicsTracker::new(config.kinematics.ema_alpha, config.kinematics.buffer_frames);
//! let mut touch = TouchProofDetector::new(config.touch_proof.clone())?;
//! let mut circular = CircularDetector::new(config.circular.clone())?;
//! let mut velocity = VelocityTracker::new(config.velocity.clone())?;
//! let mut controller = VelocityController::new(config.velocity.min_velocity);
//!
//! # let (landmarks, frame, ts_ms): (Vec<Landmark>, Mat, i64) = unimplemented!();
//! // For each camera frame:
//! let signals = touch.update(&landmarks, &frame, 640, 480)?;
//! let poses = check_hand_pose(&landmarks);
//!
//! if let Some(kin) = kinematics.compute(&landmarks) {
//!     let detection = circular.update(kinematics.trail(), kin.mean_finger_length(), signals.is_touching, ts_ms);
//!     if let Some(event) = detection.event {
//!         println!("circular gesture: {event:?}");
//!     }
//!
//!     let idx = landmarks[8];
//!     let mid = landmarks[12];
//!     let v = velocity.update((idx.x, idx.y), (mid.x, mid.y), signals.is_touching, ts_ms);
//!     let update = controller.update(v, signals.is_touching, poses.open_palm);
//!     if update.is_active {
//!         println!("scroll at {:?}", update.velocity);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! All detectors are plain state machines driven by explicit timestamps;
//! nothing reads the wall clock, so recorded sessions replay exactly.

pub mod alignment;
pub mod circular;
pub mod config;
pub mod constants;
pub mod error;
pub mod event_sink;
pub mod kinematics;
pub mod landmarks;
pub mod micro_flow;
pub mod poses;
pub mod smoothing;
pub mod touch_proof;
pub mod utils;
pub mod velocity;

pub use error::{Error, Result};
