//! Micro-flow cohesion: optical-flow evidence that two fingertips move
//! as one rigid pair.
//!
//! Tracks sparse pyramidal Lucas-Kanade flow for the two tip points across
//! consecutive grayscale frames and scores how coherent their motion is
//! over a short sliding window. A score of 1.0 means the points move
//! together; 0.5 is neutral (not enough evidence either way).

use std::collections::VecDeque;

use opencv::{
    core::{Mat, Point2f, Size, TermCriteria, TermCriteria_COUNT, TermCriteria_EPS, Vector},
    prelude::*,
    video,
};

use crate::{constants::ZERO_VECTOR_EPSILON, utils::pearson_correlation_or_zero, Result};

/// Neutral score returned when there is not enough flow evidence
pub const NEUTRAL_SCORE: f64 = 0.5;

/// One frame's flow vectors for the two tracked points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSample {
    /// Flow of the first point (index tip), pixels
    pub a: (f64, f64),
    /// Flow of the second point (middle tip), pixels
    pub b: (f64, f64),
}

/// Sparse optical-flow tracker over two fingertip points
pub struct MicroFlowTracker {
    window_frames: usize,
    patch_size: i32,
    prev_gray: Option<Mat>,
    flow_history: VecDeque<FlowSample>,
}

impl MicroFlowTracker {
    /// Create a tracker with the given sliding-window depth and
    /// Lucas-Kanade search patch size
    #[must_use]
    pub fn new(window_frames: usize, patch_size: i32) -> Self {
        assert!(window_frames >= 3, "Flow window must hold at least 3 samples");
        assert!(patch_size > 0, "Patch size must be greater than 0");
        Self {
            window_frames,
            patch_size,
            prev_gray: None,
            flow_history: VecDeque::with_capacity(window_frames),
        }
    }

    /// Update flow tracking with the current grayscale frame and the two
    /// fingertip pixel positions, returning the cohesion score in [0, 1].
    ///
    /// The first call caches the frame and returns the neutral 0.5; a lost
    /// track on either point also returns 0.5 while still caching the
    /// frame for the next call.
    ///
    /// # Errors
    ///
    /// Returns an error if the `OpenCV` flow computation itself fails.
    pub fn update(&mut self, frame_gray: &Mat, tip_a: (i32, i32), tip_b: (i32, i32)) -> Result<f64> {
        let Some(prev_gray) = self.prev_gray.take() else {
            self.prev_gray = Some(frame_gray.try_clone()?);
            return Ok(NEUTRAL_SCORE);
        };

        #[allow(clippy::cast_precision_loss)] // Pixel coordinates fit in f32
        let mut prev_pts: Vector<Point2f> = Vector::new();
        prev_pts.push(Point2f::new(tip_a.0 as f32, tip_a.1 as f32));
        prev_pts.push(Point2f::new(tip_b.0 as f32, tip_b.1 as f32));

        let mut next_pts: Vector<Point2f> = Vector::new();
        let mut status: Vector<u8> = Vector::new();
        let mut err: Vector<f32> = Vector::new();

        video::calc_optical_flow_pyr_lk(
            &prev_gray,
            frame_gray,
            &prev_pts,
            &mut next_pts,
            &mut status,
            &mut err,
            Size::new(self.patch_size, self.patch_size),
            2,
            TermCriteria::new(TermCriteria_COUNT + TermCriteria_EPS, 10, 0.03)?,
            0,
            1e-4,
        )?;

        self.prev_gray = Some(frame_gray.try_clone()?);

        // Flow failed on either point: uncertain
        if status.get(0)? == 0 || status.get(1)? == 0 {
            return Ok(NEUTRAL_SCORE);
        }

        let flow_of = |i: usize| -> Result<(f64, f64)> {
            let next = next_pts.get(i)?;
            let prev = prev_pts.get(i)?;
            Ok((f64::from(next.x - prev.x), f64::from(next.y - prev.y)))
        };

        if self.flow_history.len() >= self.window_frames {
            self.flow_history.pop_front();
        }
        self.flow_history.push_back(FlowSample {
            a: flow_of(0)?,
            b: flow_of(1)?,
        });

        Ok(cohesion_score(self.flow_history.make_contiguous()))
    }

    /// Drop the cached previous frame and flow history
    pub fn reset(&mut self) {
        self.prev_gray = None;
        self.flow_history.clear();
    }
}

/// Score the coherence of a window of flow-vector pairs.
///
/// Returns 0.5 below 3 samples. A stationary pair must not inflate
/// coherence: if both points are essentially motionless the score is 0.0,
/// and if exactly one is motionless the magnitude-agreement term is 0.0.
/// The magnitude agreement is deliberately a hard 0/1 step on the ratio
/// falling in [0.6, 1.0].
#[must_use]
pub fn cohesion_score(flows: &[FlowSample]) -> f64 {
    if flows.len() < 3 {
        return NEUTRAL_SCORE;
    }

    let ax: Vec<f64> = flows.iter().map(|f| f.a.0).collect();
    let ay: Vec<f64> = flows.iter().map(|f| f.a.1).collect();
    let bx: Vec<f64> = flows.iter().map(|f| f.b.0).collect();
    let by: Vec<f64> = flows.iter().map(|f| f.b.1).collect();

    let corr_x = pearson_correlation_or_zero(&ax, &bx);
    let corr_y = pearson_correlation_or_zero(&ay, &by);
    let avg_corr = (corr_x + corr_y) / 2.0;

    let n = flows.len() as f64;
    let mag_a = flows.iter().map(|f| f.a.0.hypot(f.a.1)).sum::<f64>() / n;
    let mag_b = flows.iter().map(|f| f.b.0.hypot(f.b.1)).sum::<f64>() / n;

    if mag_a < ZERO_VECTOR_EPSILON && mag_b < ZERO_VECTOR_EPSILON {
        return 0.0;
    }

    let mag_ratio_score = if mag_a < ZERO_VECTOR_EPSILON || mag_b < ZERO_VECTOR_EPSILON {
        0.0
    } else {
        let mag_ratio = mag_a.min(mag_b) / mag_a.max(mag_b);
        if (0.6..=1.0).contains(&mag_ratio) {
            1.0
        } else {
            0.0
        }
    };

    (0.7 * avg_corr.max(0.0) + 0.3 * mag_ratio_score).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(ax: f64, ay: f64, bx: f64, by: f64) -> FlowSample {
        FlowSample {
            a: (ax, ay),
            b: (bx, by),
        }
    }

    #[test]
    fn test_too_few_samples_is_neutral() {
        assert_eq!(cohesion_score(&[]), NEUTRAL_SCORE);
        assert_eq!(cohesion_score(&[pair(1.0, 0.0, 1.0, 0.0); 2]), NEUTRAL_SCORE);
    }

    #[test]
    fn test_identical_motion_scores_high() {
        let flows = vec![
            pair(1.0, 0.5, 1.0, 0.5),
            pair(2.0, 1.0, 2.0, 1.0),
            pair(3.0, 1.5, 3.0, 1.5),
            pair(2.5, 1.2, 2.5, 1.2),
        ];
        assert!(cohesion_score(&flows) >= 0.9);
    }

    #[test]
    fn test_stationary_pair_scores_zero() {
        let flows = vec![pair(0.0, 0.0, 0.0, 0.0); 5];
        assert_eq!(cohesion_score(&flows), 0.0);
    }

    #[test]
    fn test_one_stationary_point_loses_magnitude_term() {
        // Point a moves, point b holds still: no correlation (b constant)
        // and no magnitude agreement.
        let flows = vec![
            pair(1.0, 0.5, 0.0, 0.0),
            pair(2.0, 1.0, 0.0, 0.0),
            pair(3.0, 1.5, 0.0, 0.0),
        ];
        assert_eq!(cohesion_score(&flows), 0.0);
    }

    #[test]
    fn test_opposite_motion_scores_low() {
        let flows = vec![
            pair(1.0, 0.0, -1.0, 0.0),
            pair(2.0, 0.0, -2.0, 0.0),
            pair(3.0, 0.0, -3.0, 0.0),
        ];
        // Perfect anticorrelation is clamped to 0 in the correlation term,
        // but magnitudes agree exactly.
        let score = cohesion_score(&flows);
        assert!((score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_magnitude_ratio_is_hard_step() {
        // Correlated direction, but b only moves at half of a's magnitude:
        // ratio 0.5 falls outside [0.6, 1.0] so the step contributes 0.
        let flows = vec![
            pair(1.0, 1.0, 0.5, 0.5),
            pair(2.0, 2.0, 1.0, 1.0),
            pair(3.0, 3.0, 1.5, 1.5),
        ];
        let score = cohesion_score(&flows);
        assert!((score - 0.7).abs() < 1e-9);

        // Ratio 0.8 is inside the band: full magnitude credit
        let flows = vec![
            pair(1.0, 1.0, 0.8, 0.8),
            pair(2.0, 2.0, 1.6, 1.6),
            pair(3.0, 3.0, 2.4, 2.4),
        ];
        let score = cohesion_score(&flows);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_always_in_unit_interval() {
        let flows = vec![
            pair(10.0, -3.0, -2.0, 8.0),
            pair(-1.0, 4.0, 6.0, -9.0),
            pair(0.5, 0.5, -0.5, 2.0),
            pair(3.0, -7.0, 1.0, 1.0),
        ];
        let score = cohesion_score(&flows);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    #[should_panic(expected = "Flow window must hold at least 3 samples")]
    fn test_window_too_small_rejected() {
        let _ = MicroFlowTracker::new(2, 15);
    }
}
