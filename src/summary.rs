//! Posterior summaries
//!
//! Percentiles use linear interpolation between closest ranks. NaN trials
//! are left out of the ranking and counted in `excluded`; infinities are
//! ranked like any other value.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{HfError, Result};

/// Percentile `p` (0-100) of `values`. NaN for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentile_sorted(&sorted, p)
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let w = rank - lower as f64;
        sorted[lower] * (1.0 - w) + sorted[upper] * w
    }
}

/// Lower and upper bounds of the reported interval, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub low: f64,
    pub high: f64,
}

impl Default for Percentiles {
    fn default() -> Self {
        Self {
            low: 2.5,
            high: 97.5,
        }
    }
}

impl Percentiles {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |p: f64| (0.0..=100.0).contains(&p);
        if !in_range(self.low) || !in_range(self.high) {
            return Err(HfError::config(
                "percentiles",
                format!("({}, {}) must lie in [0, 100]", self.low, self.high),
            ));
        }
        if self.low > self.high {
            return Err(HfError::config(
                "percentiles",
                format!("low ({}) must not exceed high ({})", self.low, self.high),
            ));
        }
        Ok(())
    }
}

/// Median and interval of one posterior quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSummary {
    pub median: f64,
    pub low: f64,
    pub high: f64,
    /// NaN trials left out of the ranking
    pub excluded: usize,
}

impl PosteriorSummary {
    pub fn from_values(values: &[f64], percentiles: &Percentiles) -> Self {
        let mut ranked: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let excluded = values.len() - ranked.len();
        if excluded > 0 {
            warn!(
                excluded,
                total = values.len(),
                "non-numeric trials left out of percentile ranking"
            );
        }
        ranked.sort_by(|a, b| a.total_cmp(b));

        Self {
            median: percentile_sorted(&ranked, 50.0),
            low: percentile_sorted(&ranked, percentiles.low),
            high: percentile_sorted(&ranked, percentiles.high),
            excluded,
        }
    }

    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.median, self.low, self.high)
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Model-age and ε_Hf(t) summaries of one bootstrap run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posterior {
    pub age: PosteriorSummary,
    pub epsilon: PosteriorSummary,
}
