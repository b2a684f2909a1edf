//! Utility functions: correlation math and image conversion.

pub mod safe_cast;

use opencv::{core::Mat, imgproc};

use crate::{constants::EPSILON, Result};

/// Convert a BGR camera frame to grayscale for optical flow
///
/// # Errors
///
/// Returns an error if the `OpenCV` color conversion fails
pub fn to_grayscale(frame_bgr: &Mat) -> Result<Mat> {
    let mut gray = Mat::default();
    imgproc::cvt_color(frame_bgr, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;
    Ok(gray)
}

/// Pearson correlation with the constant-series convention used by the
/// touch detector's motion-correlation signal.
///
/// Returns `None` with fewer than 2 samples. Two constant series correlate
/// at 1.0 (both fingers holding still together); exactly one constant
/// series correlates at 0.0.
#[must_use]
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let mean_a = a[..n].iter().sum::<f64>() / n_f;
    let mean_b = b[..n].iter().sum::<f64>() / n_f;

    let var_a: f64 = a[..n].iter().map(|x| (x - mean_a).powi(2)).sum();
    let var_b: f64 = b[..n].iter().map(|x| (x - mean_b).powi(2)).sum();

    if var_a < EPSILON || var_b < EPSILON {
        return Some(if var_a < EPSILON && var_b < EPSILON { 1.0 } else { 0.0 });
    }

    let cov: f64 = (0..n).map(|i| (a[i] - mean_a) * (b[i] - mean_b)).sum();
    Some(cov / (var_a * var_b).sqrt())
}

/// Pearson correlation with zero-variance coerced to 0.0.
///
/// This is the convention the micro-flow cohesion score uses: an undefined
/// correlation must never inflate the fused touch confidence.
#[must_use]
pub fn pearson_correlation_or_zero(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let mean_a = a[..n].iter().sum::<f64>() / n_f;
    let mean_b = b[..n].iter().sum::<f64>() / n_f;

    let var_a: f64 = a[..n].iter().map(|x| (x - mean_a).powi(2)).sum();
    let var_b: f64 = b[..n].iter().map(|x| (x - mean_b).powi(2)).sum();

    if var_a < EPSILON || var_b < EPSILON {
        return 0.0;
    }

    let cov: f64 = (0..n).map(|i| (a[i] - mean_a) * (b[i] - mean_b)).sum();
    cov / (var_a * var_b).sqrt()
}
