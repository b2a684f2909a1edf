//! Multi-signal fusion for robust two-finger contact detection.
//!
//! Six per-frame signals (proximity, inter-tip angle, motion correlation,
//! visibility asymmetry, micro-flow cohesion, hand distance) are fused into
//! one confidence score, which drives a hysteresis-gated touch state. Every
//! missing-data condition fails closed to "not touching".

use std::collections::VecDeque;

use log::debug;
use opencv::core::Mat;

use crate::{
    alignment::HandAligner,
    config::{ProximityMode, TouchProofConfig},
    constants::{ADAPTIVE_PROXIMITY_STEEPNESS, ANGLE_EMA_ALPHA, INDEX_TIP, MIDDLE_TIP},
    landmarks::Landmark,
    micro_flow::{MicroFlowTracker, NEUTRAL_SCORE},
    smoothing::Ema,
    utils::{pearson_correlation, to_grayscale},
    Result,
};

/// Hysteresis gate state: the two states transitions actually drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Not touching
    Unarmed,
    /// Touching
    Ready,
}

/// All signals used for one frame's touch decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchProofSignals {
    /// Fingertip proximity score, 0-1 (closer = higher)
    pub proximity_score: f64,
    /// Inter-tip angle score, 0-1 (more parallel = higher)
    pub angle_score: f64,
    /// Velocity correlation score, 0-1 (moving together = higher)
    pub correlation_score: f64,
    /// Visibility asymmetry score, 0-1 (occlusion = higher)
    pub visibility_score: f64,
    /// Micro-flow cohesion score, 0-1 (coherent motion = higher)
    pub mfc_score: f64,
    /// Hand distance factor, 0-1 (0 = close, 1 = far)
    pub distance_factor: f64,
    /// Fused confidence, 0-1
    pub fused_score: f64,
    /// Final hysteresis-gated decision
    pub is_touching: bool,
}

/// Fusion weights for the four fused signals
#[derive(Debug, Clone, Copy)]
struct FusionWeights {
    proximity: f64,
    angle: f64,
    mfc: f64,
    occlusion: f64,
}

const FAR_WEIGHTS: FusionWeights = FusionWeights {
    proximity: 0.45,
    angle: 0.20,
    mfc: 0.30,
    occlusion: 0.05,
};

const NEAR_WEIGHTS: FusionWeights = FusionWeights {
    proximity: 0.40,
    angle: 0.30,
    mfc: 0.25,
    occlusion: 0.05,
};

impl FusionWeights {
    /// Interpolate component-wise between near and far weight sets
    fn for_distance(distance_factor: f64) -> Self {
        if distance_factor > 0.7 {
            return FAR_WEIGHTS;
        }
        if distance_factor < 0.3 {
            return NEAR_WEIGHTS;
        }
        // Map [0.3, 0.7] to [0, 1]
        let t = (distance_factor - 0.3) / 0.4;
        let lerp = |near: f64, far: f64| near * (1.0 - t) + far * t;
        Self {
            proximity: lerp(NEAR_WEIGHTS.proximity, FAR_WEIGHTS.proximity),
            angle: lerp(NEAR_WEIGHTS.angle, FAR_WEIGHTS.angle),
            mfc: lerp(NEAR_WEIGHTS.mfc, FAR_WEIGHTS.mfc),
            occlusion: lerp(NEAR_WEIGHTS.occlusion, FAR_WEIGHTS.occlusion),
        }
    }
}

/// Fused touch detector with hysteresis gating
pub struct TouchProofDetector {
    config: TouchProofConfig,
    aligner: HandAligner,

    state: GateState,
    enter_counter: usize,
    exit_counter: usize,

    // Rolling aligned tip positions for velocity correlation
    idx_positions: VecDeque<(f64, f64)>,
    mid_positions: VecDeque<(f64, f64)>,

    proximity_ema: Ema,
    angle_ema: Ema,

    // Typical inter-tip separation learned while unarmed, per distance band
    baseline_close: Option<f64>,
    baseline_far: Option<f64>,

    flow_tracker: MicroFlowTracker,
    // Valid for one frame only: the detector's own previous MFC output,
    // reused when the gating condition says flow is not worth computing.
    cached_mfc: f64,
}

impl TouchProofDetector {
    /// Create a detector, rejecting configurations that violate the
    /// threshold ordering invariants
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid
    pub fn new(config: TouchProofConfig) -> Result<Self> {
        config.validate()?;

        let correlation_capacity = config.correlation_frames + 1;
        let flow_tracker = MicroFlowTracker::new(config.mfc_window_frames, config.mfc_patch_size);
        let proximity_ema = Ema::new(config.ema_alpha);

        Ok(Self {
            config,
            aligner: HandAligner::new(),
            state: GateState::Unarmed,
            enter_counter: 0,
            exit_counter: 0,
            idx_positions: VecDeque::with_capacity(correlation_capacity),
            mid_positions: VecDeque::with_capacity(correlation_capacity),
            proximity_ema,
            angle_ema: Ema::new(ANGLE_EMA_ALPHA),
            baseline_close: None,
            baseline_far: None,
            flow_tracker,
            cached_mfc: NEUTRAL_SCORE,
        })
    }

    /// Current gate state
    #[must_use]
    pub const fn state(&self) -> GateState {
        self.state
    }

    /// Update touch detection with one frame's data.
    ///
    /// Fails closed (all-zero signals, not touching) when fewer than 21
    /// landmarks are supplied.
    ///
    /// # Errors
    ///
    /// Returns an error only if an `OpenCV` operation on the camera frame
    /// fails; missing or degenerate landmark data never errors.
    pub fn update(
        &mut self,
        landmarks: &[Landmark],
        frame_bgr: &Mat,
        image_width: i32,
        image_height: i32,
    ) -> Result<TouchProofSignals> {
        if !self.aligner.update(landmarks, image_width, image_height) {
            return Ok(Self::empty_signals());
        }

        let index_tip = landmarks[INDEX_TIP];
        let middle_tip = landmarks[MIDDLE_TIP];

        // 1. Proximity signal
        let proximity_norm = match self.config.proximity_mode {
            ProximityMode::Logarithmic => self.aligner.normalized_distance_log(landmarks),
            _ => self.aligner.normalized_distance(landmarks),
        };

        // Hard cap: grossly separated fingers short-circuit the frame as
        // not touching; the gate state is left where it was
        if proximity_norm > self.config.proximity_hard_cap {
            return Ok(TouchProofSignals {
                proximity_score: 0.0,
                angle_score: 0.0,
                correlation_score: 0.0,
                visibility_score: 0.0,
                mfc_score: 0.0,
                distance_factor: self.aligner.hand_distance_factor(),
                fused_score: 0.0,
                is_touching: false,
            });
        }

        let proximity_score_raw = self.score_proximity(proximity_norm);
        let proximity_score = if self.config.smooth_proximity {
            self.proximity_ema.update(proximity_score_raw)
        } else {
            proximity_score_raw
        };

        // 2. Angle signal
        let angle_deg = self.aligner.fingertip_angle(landmarks);

        // Hard cap: fingers pointing in clearly different directions are
        // never touching, no matter what the gate thought before
        if angle_deg > self.config.angle_hard_cap_deg {
            return Ok(TouchProofSignals {
                proximity_score,
                angle_score: 0.0,
                correlation_score: 0.0,
                visibility_score: 0.0,
                mfc_score: 0.0,
                distance_factor: self.aligner.hand_distance_factor(),
                fused_score: 0.0,
                is_touching: false,
            });
        }

        // Smooth the raw angle faster than proximity before scoring
        let angle_smoothed = self.angle_ema.update(angle_deg);
        let angle_score = self.score_angle(angle_smoothed);

        // 3. Motion correlation signal
        let idx_aligned = self.aligner.to_hand_aligned(index_tip.x, index_tip.y);
        let mid_aligned = self.aligner.to_hand_aligned(middle_tip.x, middle_tip.y);
        push_bounded(&mut self.idx_positions, idx_aligned, self.config.correlation_frames + 1);
        push_bounded(&mut self.mid_positions, mid_aligned, self.config.correlation_frames + 1);
        let correlation_score = self.compute_correlation();

        // 4. Visibility/occlusion asymmetry signal
        let visibility_score = self.score_visibility(index_tip, middle_tip);

        // 5. Fingertip pixels for optical flow
        let (index_px, middle_px) = self.aligner.fingertip_pixels(landmarks);

        // 6. Distance factor and baseline learning
        let distance_factor = self.aligner.hand_distance_factor();
        self.update_baseline(proximity_norm, distance_factor);

        // 7. Coarse fused score, only to decide whether flow is worth running
        let initial_fused = 0.7 * proximity_score + 0.3 * angle_score;

        // 8. Micro-flow cohesion. The cached value is the detector's own
        // previous output and is never older than one frame.
        let mfc_score = if self.state == GateState::Ready
            || (0.40..=0.70).contains(&initial_fused)
            || distance_factor < 0.3
        {
            let gray = to_grayscale(frame_bgr)?;
            let score = self.flow_tracker.update(&gray, index_px, middle_px)?;
            self.cached_mfc = score;
            score
        } else {
            self.cached_mfc
        };

        // 9. Distance-aware fusion
        let weights = FusionWeights::for_distance(distance_factor);
        let proximity_score_adj = self.score_proximity_adjusted(proximity_norm, distance_factor);
        let angle_score_adj = self.score_angle_adjusted(angle_deg, distance_factor);

        let fused_score = weights.proximity * proximity_score_adj
            + weights.angle * angle_score_adj
            + weights.mfc * mfc_score
            + weights.occlusion * visibility_score;

        let is_touching = self.update_state(fused_score);

        Ok(TouchProofSignals {
            proximity_score: proximity_score_adj,
            angle_score: angle_score_adj,
            correlation_score,
            visibility_score,
            mfc_score,
            distance_factor,
            fused_score,
            is_touching,
        })
    }

    /// Reset all detection state, including hysteresis counters, learned
    /// baselines, signal smoothing and the cached optical-flow frame
    pub fn reset(&mut self) {
        self.state = GateState::Unarmed;
        self.enter_counter = 0;
        self.exit_counter = 0;
        self.idx_positions.clear();
        self.mid_positions.clear();
        self.proximity_ema.reset();
        self.angle_ema.reset();
        self.baseline_close = None;
        self.baseline_far = None;
        self.flow_tracker.reset();
        self.cached_mfc = NEUTRAL_SCORE;
    }

    /// Linear falloff from 1.0 at/below enter to 0.0 at/above exit
    fn score_proximity(&self, distance_norm: f64) -> f64 {
        score_falloff(distance_norm, self.config.proximity_enter, self.config.proximity_exit)
    }

    /// Same falloff shape applied to the inter-tip angle
    fn score_angle(&self, angle_deg: f64) -> f64 {
        score_falloff(angle_deg, self.config.angle_enter_deg, self.config.angle_exit_deg)
    }

    /// Velocity correlation between the two tips over the rolling window
    fn compute_correlation(&self) -> f64 {
        if self.idx_positions.len() < self.config.correlation_frames {
            return NEUTRAL_SCORE;
        }

        let velocities = |positions: &VecDeque<(f64, f64)>| -> (Vec<f64>, Vec<f64>) {
            let mut vx = Vec::with_capacity(positions.len().saturating_sub(1));
            let mut vy = Vec::with_capacity(positions.len().saturating_sub(1));
            for i in 1..positions.len() {
                vx.push(positions[i].0 - positions[i - 1].0);
                vy.push(positions[i].1 - positions[i - 1].1);
            }
            (vx, vy)
        };

        let (idx_vx, idx_vy) = velocities(&self.idx_positions);
        let (mid_vx, mid_vy) = velocities(&self.mid_positions);

        let corr_x = pearson_correlation(&idx_vx, &mid_vx);
        let corr_y = pearson_correlation(&idx_vy, &mid_vy);

        let avg_corr = match (corr_x, corr_y) {
            (Some(x), Some(y)) => (x + y) / 2.0,
            (Some(x), None) => x,
            (None, Some(y)) => y,
            (None, None) => NEUTRAL_SCORE,
        };

        if avg_corr >= self.config.correlation_min {
            1.0
        } else {
            avg_corr.max(0.0)
        }
    }

    /// Occlusion evidence: when fingers overlap, one tip typically loses
    /// visibility relative to the other
    fn score_visibility(&self, index_tip: Landmark, middle_tip: Landmark) -> f64 {
        let (Some(vis_idx), Some(vis_mid)) = (index_tip.visibility, middle_tip.visibility) else {
            return NEUTRAL_SCORE;
        };

        let asymmetry = (vis_idx - vis_mid).abs();
        if asymmetry >= self.config.visibility_asymmetry_min {
            1.0
        } else {
            asymmetry / self.config.visibility_asymmetry_min
        }
    }

    /// Proximity scored with distance-aware thresholds.
    ///
    /// Adaptive mode scores against the learned separation baseline with a
    /// sigmoid; until baselines exist (and in the other modes) thresholds
    /// widen proportionally to the distance factor instead.
    fn score_proximity_adjusted(&self, distance_norm: f64, distance_factor: f64) -> f64 {
        if self.config.proximity_mode == ProximityMode::Adaptive {
            if let Some(baseline) = self.baseline_distance(distance_factor) {
                // How much closer than the usual resting separation?
                let relative_proximity = baseline / (distance_norm + 0.001);
                let center = self.config.relative_touch_threshold;
                return 1.0 / (1.0 + (-ADAPTIVE_PROXIMITY_STEEPNESS * (relative_proximity - center)).exp());
            }
        }

        let enter_adjusted = self.config.proximity_enter * (1.0 + self.config.k_d * distance_factor);
        let exit_adjusted = self.config.proximity_exit * (1.0 + self.config.k_d * distance_factor);
        score_falloff(distance_norm, enter_adjusted, exit_adjusted)
    }

    /// Angle scored with thresholds narrowed as the hand gets closer
    fn score_angle_adjusted(&self, angle_deg: f64, distance_factor: f64) -> f64 {
        let enter_adjusted = self.config.angle_enter_deg - self.config.k_theta * (1.0 - distance_factor);
        let exit_adjusted = self.config.angle_exit_deg - self.config.k_theta * (1.0 - distance_factor);
        score_falloff(angle_deg, enter_adjusted, exit_adjusted)
    }

    /// Learn typical resting separation per distance band.
    ///
    /// Only updated while unarmed so that touch frames never contaminate
    /// the baselines.
    fn update_baseline(&mut self, distance_norm: f64, distance_factor: f64) {
        if self.state != GateState::Unarmed {
            return;
        }

        let alpha = self.config.baseline_learning_rate;
        let blend = |baseline: &mut Option<f64>| match baseline {
            Some(prev) => *baseline = Some(alpha * distance_norm + (1.0 - alpha) * *prev),
            None => *baseline = Some(distance_norm),
        };

        if distance_factor < 0.3 {
            blend(&mut self.baseline_close);
        } else if distance_factor > 0.7 {
            blend(&mut self.baseline_far);
        }
    }

    /// Expected resting separation for the current hand distance
    fn baseline_distance(&self, distance_factor: f64) -> Option<f64> {
        let close = self.baseline_close?;
        let far = self.baseline_far?;

        if distance_factor < 0.3 {
            return Some(close);
        }
        if distance_factor > 0.7 {
            return Some(far);
        }
        let t = (distance_factor - 0.3) / 0.4;
        Some(close * (1.0 - t) + far * t)
    }

    /// Advance the hysteresis state machine and report the touch decision
    fn update_state(&mut self, fused_score: f64) -> bool {
        match self.state {
            GateState::Unarmed => {
                if fused_score > self.config.fused_enter_threshold {
                    self.enter_counter += 1;
                    if self.enter_counter >= self.config.frames_to_enter {
                        debug!("touch enter at fused score {fused_score:.3}");
                        self.state = GateState::Ready;
                        self.enter_counter = 0;
                        return true;
                    }
                } else {
                    self.enter_counter = 0;
                }
                false
            }
            GateState::Ready => {
                if fused_score < self.config.fused_exit_threshold {
                    self.exit_counter += 1;
                    if self.exit_counter >= self.config.frames_to_exit {
                        debug!("touch exit at fused score {fused_score:.3}");
                        self.state = GateState::Unarmed;
                        self.exit_counter = 0;
                        return false;
                    }
                } else {
                    self.exit_counter = 0;
                }
                true
            }
        }
    }

    /// All-zero signals used when detection fails closed
    fn empty_signals() -> TouchProofSignals {
        TouchProofSignals {
            proximity_score: 0.0,
            angle_score: 0.0,
            correlation_score: 0.0,
            visibility_score: 0.0,
            mfc_score: 0.0,
            distance_factor: 0.5,
            fused_score: 0.0,
            is_touching: false,
        }
    }
}

/// Linear falloff: 1.0 at/below `enter`, 0.0 at/above `exit`, linear and
/// strictly decreasing in between
fn score_falloff(value: f64, enter: f64, exit: f64) -> f64 {
    if value <= enter {
        return 1.0;
    }
    if value >= exit {
        return 0.0;
    }
    1.0 - (value - enter) / (exit - enter)
}

fn push_bounded(buf: &mut VecDeque<(f64, f64)>, point: (f64, f64), cap: usize) {
    if buf.len() >= cap {
        buf.pop_front();
    }
    buf.push_back(point);
}
