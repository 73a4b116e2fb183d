//! Streaming feature statistics
//!
//! Welford's online algorithm: one pass, no stored samples, numerically
//! stable for the long feature streams an index build sees.

/// A streaming mean/variance accumulator
#[derive(Debug, Default, Clone, Copy)]
pub struct RunningStat {
    n: u64,
    mean: f64,
    m2: f64,
}

impl RunningStat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.n += 1;
        let delta = value - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Number of values pushed so far
    #[must_use]
    pub fn count(&self) -> u64 {
        self.n
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.n > 0 {
            self.mean
        } else {
            0.0
        }
    }

    /// Sample variance, zero until at least two values are pushed
    #[must_use]
    pub fn variance(&self) -> f64 {
        if self.n > 1 {
            self.m2 / (self.n - 1) as f64
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
