//! Online statistics
//!
//! Single-pass accumulator for count, sum, sum of squared deviations and
//! running maximum. Used by the spectral feature engine to summarize values
//! over frames and over frequency bins without keeping them around.

/// Running sample statistics, updated one value at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OnlineStats {
    n: usize,
    sum: f64,
    sum_squared_deviation: f64,
    max: Option<(usize, f64)>,
}

impl OnlineStats {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation.
    ///
    /// The maximum is replaced only by a strictly greater value, so the first
    /// occurrence of a repeated maximum keeps its index. The index is the
    /// zero-based position of the observation in insertion order.
    pub fn add(&mut self, x: f64) {
        let mean_before = self.mean().unwrap_or(0.0);
        self.n += 1;
        self.sum += x;
        if self.n > 1 {
            let mean_after = self.sum / self.n as f64;
            self.sum_squared_deviation += (x - mean_before) * (x - mean_after);
        }
        match self.max {
            Some((_, max)) if x <= max || x.is_nan() => {}
            _ => self.max = Some((self.n - 1, x)),
        }
    }

    /// Number of observations.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Sum of observations.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Arithmetic mean, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }

    /// Unbiased sample variance, `None` with fewer than two observations.
    pub fn variance(&self) -> Option<f64> {
        (self.n > 1).then(|| self.sum_squared_deviation / (self.n - 1) as f64)
    }

    /// Sample standard deviation.
    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }

    /// Mean divided by standard deviation.
    ///
    /// Follows IEEE arithmetic when the deviation is zero: a zero mean gives
    /// NaN, any other mean gives an infinity.
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        Some(self.mean()? / self.std_dev()?)
    }

    /// Index and value of the first largest observation.
    pub fn max(&self) -> Option<(usize, f64)> {
        self.max
    }
}

impl Extend<f64> for OnlineStats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.add(x);
        }
    }
}

impl FromIterator<f64> for OnlineStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = OnlineStats::new();
        stats.extend(iter);
        stats
    }
}
