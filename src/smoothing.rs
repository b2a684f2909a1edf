//! Exponential moving average helpers.
//!
//! Every smoothed signal in the library owns its EMA state explicitly
//! through these types; there is no ambient or static smoothing state.

/// Scalar EMA seeded by the first sample
#[derive(Debug, Clone, Copy, Default)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    /// Create a new EMA. Alpha must be in (0, 1].
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, value: None }
    }

    /// Feed a sample and return the smoothed value.
    ///
    /// The first sample seeds the state and passes through unchanged.
    pub fn update(&mut self, sample: f64) -> f64 {
        let smoothed = match self.value {
            Some(prev) => self.alpha * sample + (1.0 - self.alpha) * prev,
            None => sample,
        };
        self.value = Some(smoothed);
        smoothed
    }

    /// Current smoothed value, if seeded
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        self.value
    }

    /// Clear the state; the next sample re-seeds
    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// 2-D EMA smoothing both components with the same alpha
#[derive(Debug, Clone, Copy, Default)]
pub struct Ema2 {
    alpha: f64,
    value: Option<(f64, f64)>,
}

impl Ema2 {
    /// Create a new 2-D EMA. Alpha must be in (0, 1].
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, value: None }
    }

    /// Feed a point and return the smoothed point
    pub fn update(&mut self, sample: (f64, f64)) -> (f64, f64) {
        let smoothed = match self.value {
            Some(prev) => (
                self.alpha * sample.0 + (1.0 - self.alpha) * prev.0,
                self.alpha * sample.1 + (1.0 - self.alpha) * prev.1,
            ),
            None => sample,
        };
        self.value = Some(smoothed);
        smoothed
    }

    /// Current smoothed point, if seeded
    #[must_use]
    pub const fn value(&self) -> Option<(f64, f64)> {
        self.value
    }

    /// Clear the state; the next sample re-seeds
    pub fn reset(&mut self) {
        self.value = None;
    }
}
