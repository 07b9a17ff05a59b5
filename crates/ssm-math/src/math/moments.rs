//! Sample moments, covariance and correlation.
//!
//! All variance-type quantities use the unbiased `n - 1` denominator, matching
//! what the posterior summaries report for parameter standard deviations.

use serde::{Deserialize, Serialize};

/// First two sample moments of a sequence of draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub n: usize,
    pub mean: f64,
    pub variance: f64,
}

impl Moments {
    /// Compute moments with Welford's online update.
    ///
    /// Empty input yields NaN mean and variance; one value yields variance 0.
    pub fn of(values: &[f64]) -> Self {
        let mut mean = 0.0;
        let mut m2 = 0.0;
        for (i, &v) in values.iter().enumerate() {
            let delta = v - mean;
            mean += delta / (i + 1) as f64;
            m2 += delta * (v - mean);
        }
        let n = values.len();
        match n {
            0 => Moments {
                n,
                mean: f64::NAN,
                variance: f64::NAN,
            },
            1 => Moments {
                n,
                mean,
                variance: 0.0,
            },
            _ => Moments {
                n,
                mean,
                variance: m2 / (n - 1) as f64,
            },
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Arithmetic mean. NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    Moments::of(values).mean
}

/// Unbiased sample variance. NaN for empty input.
pub fn variance(values: &[f64]) -> f64 {
    Moments::of(values).variance
}

/// Unbiased sample standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Unbiased sample covariance of two equally long sequences.
///
/// NaN when the lengths differ or fewer than two pairs are available.
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return f64::NAN;
    }
    let mean_a = mean(a);
    let mean_b = mean(b);
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| (x - mean_a) * (y - mean_b))
        .sum();
    sum / (a.len() - 1) as f64
}

/// Pearson correlation coefficient, clamped to `[-1, 1]`.
///
/// NaN when either sequence has zero variance.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let cov = covariance(a, b);
    let denom = (variance(a) * variance(b)).sqrt();
    if !cov.is_finite() || !denom.is_finite() || denom <= 0.0 {
        return f64::NAN;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Successive differences `x[i+1] - x[i]`.
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}
