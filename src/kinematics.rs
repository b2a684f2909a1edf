//! Per-frame hand kinematics: smoothed fingertip positions and trails.
//!
//! The tracker recomputes palm geometry from scratch every frame; the only
//! state carried forward is the fingertip EMA and the bounded trail buffers.

use std::collections::VecDeque;

use crate::{
    constants::{INDEX_MCP, INDEX_TIP, MIDDLE_MCP, MIDDLE_TIP, NUM_HAND_LANDMARKS, PINKY_MCP, RING_MCP, WRIST},
    landmarks::Landmark,
    smoothing::Ema2,
};

/// Derived per-frame hand geometry
#[derive(Debug, Clone, Copy)]
pub struct HandKinematics {
    /// Palm center x in normalized image space
    pub palm_x: f64,
    /// Palm center y in normalized image space
    pub palm_y: f64,
    /// Hand orientation angle (wrist to middle MCP), radians
    pub theta_rad: f64,
    /// EMA-smoothed index tip in palm-relative, rotation-aligned coordinates
    pub index_tip_rel: (f64, f64),
    /// EMA-smoothed middle tip in palm-relative, rotation-aligned coordinates
    pub middle_tip_rel: (f64, f64),
    /// Raw index finger length (tip to MCP), normalized units
    pub finger_length_idx: f64,
    /// Raw middle finger length (tip to MCP), normalized units
    pub finger_length_mid: f64,
}

impl HandKinematics {
    /// Mean of the two raw finger lengths, used as a normalization scale
    #[must_use]
    pub fn mean_finger_length(&self) -> f64 {
        (self.finger_length_idx + self.finger_length_mid) / 2.0
    }
}

/// Tracks smoothed fingertip positions and fixed-length trails
pub struct KinematicsTracker {
    buffer_frames: usize,
    idx_tip_ema: Ema2,
    mid_tip_ema: Ema2,
    trail: VecDeque<(f64, f64)>,
    trail_mid: VecDeque<(f64, f64)>,
    trail_mean: VecDeque<(f64, f64)>,
}

impl KinematicsTracker {
    /// Create a tracker with the given EMA alpha and trail capacity
    #[must_use]
    pub fn new(ema_alpha: f64, buffer_frames: usize) -> Self {
        assert!(buffer_frames > 0, "Buffer size must be greater than 0");
        Self {
            buffer_frames,
            idx_tip_ema: Ema2::new(ema_alpha),
            mid_tip_ema: Ema2::new(ema_alpha),
            trail: VecDeque::with_capacity(buffer_frames),
            trail_mid: VecDeque::with_capacity(buffer_frames),
            trail_mean: VecDeque::with_capacity(buffer_frames),
        }
    }

    /// Consume one frame's landmarks.
    ///
    /// Returns `None` when fewer than 21 landmarks are supplied; EMA state
    /// and trails are left untouched in that case.
    pub fn compute(&mut self, landmarks: &[Landmark]) -> Option<HandKinematics> {
        if landmarks.len() < NUM_HAND_LANDMARKS {
            return None;
        }

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

        let mid_mcp = landmarks[MIDDLE_MCP];
        let theta = (mid_mcp.y - wrist.y).atan2(mid_mcp.x - wrist.x);

        let idx_tip = landmarks[INDEX_TIP];
        let mid_tip = landmarks[MIDDLE_TIP];
        let idx_mcp = landmarks[INDEX_MCP];

        // Palm-relative, rotation-aligned tip coordinates
        let idx_rel_aligned = rotate(idx_tip.x - palm_x, idx_tip.y - palm_y, -theta);
        let mid_rel_aligned = rotate(mid_tip.x - palm_x, mid_tip.y - palm_y, -theta);

        let idx_smoothed = self.idx_tip_ema.update(idx_rel_aligned);
        let mid_smoothed = self.mid_tip_ema.update(mid_rel_aligned);

        // Raw finger lengths as normalization scale
        let finger_len_idx = (idx_tip.x - idx_mcp.x).hypot(idx_tip.y - idx_mcp.y);
        let finger_len_mid = (mid_tip.x - mid_mcp.x).hypot(mid_tip.y - mid_mcp.y);

        push_bounded(&mut self.trail, idx_smoothed, self.buffer_frames);
        push_bounded(&mut self.trail_mid, mid_smoothed, self.buffer_frames);

        let mean_point = (
            (idx_smoothed.0 + mid_smoothed.0) / 2.0,
            (idx_smoothed.1 + mid_smoothed.1) / 2.0,
        );
        push_bounded(&mut self.trail_mean, mean_point, self.buffer_frames);

        Some(HandKinematics {
            palm_x,
            palm_y,
            theta_rad: theta,
            index_tip_rel: idx_smoothed,
            middle_tip_rel: mid_smoothed,
            finger_length_idx: finger_len_idx,
            finger_length_mid: finger_len_mid,
        })
    }

    /// Smoothed index-tip trail in aligned coordinates
    #[must_use]
    pub const fn trail(&self) -> &VecDeque<(f64, f64)> {
        &self.trail
    }

    /// Smoothed middle-tip trail in aligned coordinates
    #[must_use]
    pub const fn trail_mid(&self) -> &VecDeque<(f64, f64)> {
        &self.trail_mid
    }

    /// Trail of the midpoint between the two smoothed tips
    #[must_use]
    pub const fn trail_mean(&self) -> &VecDeque<(f64, f64)> {
        &self.trail_mean
    }

    /// Mean of the two smoothed fingertip positions, if both are seeded
    #[must_use]
    pub fn mean_fingertip(&self) -> Option<(f64, f64)> {
        let idx = self.idx_tip_ema.value()?;
        let mid = self.mid_tip_ema.value()?;
        Some(((idx.0 + mid.0) / 2.0, (idx.1 + mid.1) / 2.0))
    }

    /// Per-finger speed over a lookback of trail frames.
    ///
    /// Computed on demand from the trails; returns `None` for a finger
    /// whose trail does not yet span the lookback.
    #[must_use]
    pub fn finger_speeds(&self, lookback: usize) -> (Option<f64>, Option<f64>) {
        (trail_speed(&self.trail, lookback), trail_speed(&self.trail_mid, lookback))
    }
}

fn rotate(px: f64, py: f64, theta: f64) -> (f64, f64) {
    let (s, c) = theta.sin_cos();
    (c * px - s * py, s * px + c * py)
}

fn push_bounded(buf: &mut VecDeque<(f64, f64)>, point: (f64, f64), cap: usize) {
    if buf.len() >= cap {
        buf.pop_front();
    }
    buf.push_back(point);
}

fn trail_speed(trail: &VecDeque<(f64, f64)>, lookback: usize) -> Option<f64> {
    if trail.len() <= lookback {
        return None;
    }
    let last = trail[trail.len() - 1];
    let past = trail[trail.len() - 1 - lookback];
    Some((last.0 - past.0).hypot(last.1 - past.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{INDEX_MCP, INDEX_TIP, MIDDLE_MCP, MIDDLE_TIP, PINKY_MCP, RING_MCP, WRIST};

    fn hand_with_index_tip(x: f64, y: f64) -> Vec<Landmark> {
        let mut lms = vec![Landmark::new(0.5, 0.6); 21];
        lms[WRIST] = Landmark::new(0.5, 0.8);
        lms[INDEX_MCP] = Landmark::new(0.45, 0.5);
        lms[MIDDLE_MCP] = Landmark::new(0.5, 0.5);
        lms[RING_MCP] = Landmark::new(0.55, 0.5);
        lms[PINKY_MCP] = Landmark::new(0.6, 0.5);
        lms[INDEX_TIP] = Landmark::new(x, y);
        lms[MIDDLE_TIP] = Landmark::new(x + 0.02, y);
        lms
    }

    #[test]
    fn test_rejects_short_landmark_list() {
        let mut tracker = KinematicsTracker::new(0.35, 24);
        assert!(tracker.compute(&[Landmark::new(0.0, 0.0); 10]).is_none());
        assert!(tracker.trail().is_empty());
    }

    #[test]
    fn test_trails_grow_and_stay_bounded() {
        let mut tracker = KinematicsTracker::new(0.35, 4);
        for i in 0..10 {
            let t = f64::from(i) * 0.01;
            tracker.compute(&hand_with_index_tip(0.4 + t, 0.3)).unwrap();
        }
        assert_eq!(tracker.trail().len(), 4);
        assert_eq!(tracker.trail_mid().len(), 4);
        assert_eq!(tracker.trail_mean().len(), 4);
    }

    #[test]
    fn test_oldest_entries_are_evicted() {
        let mut tracker = KinematicsTracker::new(1.0, 3);
        for i in 0..5 {
            let t = f64::from(i) * 0.05;
            tracker.compute(&hand_with_index_tip(0.3 + t, 0.3)).unwrap();
        }
        // With alpha=1 (no smoothing), the front of the trail corresponds
        // to the third frame's tip, not the first.
        let front = tracker.trail()[0];
        let mut reference = KinematicsTracker::new(1.0, 3);
        for i in 0..3 {
            let t = f64::from(i + 2) * 0.05;
            reference.compute(&hand_with_index_tip(0.3 + t, 0.3)).unwrap();
        }
        assert!((front.0 - reference.trail()[0].0).abs() < 1e-9);
    }

    #[test]
    fn test_ema_smoothing_lags_jump() {
        let mut tracker = KinematicsTracker::new(0.35, 24);
        let first = tracker.compute(&hand_with_index_tip(0.40, 0.30)).unwrap();
        let second = tracker.compute(&hand_with_index_tip(0.60, 0.30)).unwrap();

        // Smoothed position moves toward the new tip but not all the way
        let moved = (second.index_tip_rel.0 - first.index_tip_rel.0).hypot(second.index_tip_rel.1 - first.index_tip_rel.1);
        assert!(moved > 0.0);

        let mut unsmoothed = KinematicsTracker::new(1.0, 24);
        let first_raw = unsmoothed.compute(&hand_with_index_tip(0.40, 0.30)).unwrap();
        let second_raw = unsmoothed.compute(&hand_with_index_tip(0.60, 0.30)).unwrap();
        let moved_raw =
            (second_raw.index_tip_rel.0 - first_raw.index_tip_rel.0).hypot(second_raw.index_tip_rel.1 - first_raw.index_tip_rel.1);

        assert!(moved < moved_raw);
    }

    #[test]
    fn test_finger_lengths_are_raw() {
        let mut tracker = KinematicsTracker::new(0.35, 24);
        let kin = tracker.compute(&hand_with_index_tip(0.45, 0.3)).unwrap();
        // Index tip (0.45, 0.3), index MCP (0.45, 0.5)
        assert!((kin.finger_length_idx - 0.2).abs() < 1e-9);
        assert!(kin.mean_finger_length() > 0.0);
    }

    #[test]
    fn test_finger_speeds_lookback() {
        let mut tracker = KinematicsTracker::new(1.0, 24);
        assert_eq!(tracker.finger_speeds(1), (None, None));

        tracker.compute(&hand_with_index_tip(0.40, 0.30)).unwrap();
        assert_eq!(tracker.finger_speeds(1), (None, None));

        tracker.compute(&hand_with_index_tip(0.43, 0.30)).unwrap();
        let (idx_speed, mid_speed) = tracker.finger_speeds(1);
        assert!(idx_speed.unwrap() > 0.0);
        assert!(mid_speed.unwrap() > 0.0);
    }
}
