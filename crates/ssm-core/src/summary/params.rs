//! Summaries of scalar parameters (precisions, regression coefficients).

use serde::Serialize;
use ssm_math::{correlation, quantile_sorted, sort_sample, Moments};

use super::band::BandProbs;
use super::transform::Transform;
use super::SummaryError;
use crate::samples::PosteriorSamples;

/// Posterior moments and quantiles of one scalar column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarSummary {
    pub name: String,
    pub transform: Transform,
    pub n_draws: usize,
    pub mean: f64,
    pub sd: f64,
    pub lower: f64,
    pub median: f64,
    pub upper: f64,
}

/// Summarize a scalar column under a transform.
pub fn summarize_scalar(
    samples: &PosteriorSamples,
    name: &str,
    probs: (f64, f64),
    transform: Transform,
) -> Result<ScalarSummary, SummaryError> {
    let probs = BandProbs::new(probs.0, probs.1)?;
    let draws = samples
        .column(name)
        .ok_or_else(|| SummaryError::NoMatchingColumns {
            prefix: name.to_string(),
        })?;
    let position = samples.position(name).unwrap_or(0);
    if draws.is_empty() {
        return Err(SummaryError::InsufficientDraws { column: position });
    }

    let mut values: Vec<f64> = draws.iter().map(|&x| transform.apply(x)).collect();
    if values.iter().any(|x| x.is_nan()) {
        return Err(SummaryError::NanDraw { column: position });
    }
    let moments = Moments::of(&values);
    sort_sample(&mut values);

    Ok(ScalarSummary {
        name: name.to_string(),
        transform,
        n_draws: values.len(),
        mean: moments.mean,
        sd: moments.std_dev(),
        lower: quantile_sorted(&values, probs.lower()),
        median: quantile_sorted(&values, BandProbs::MEDIAN),
        upper: quantile_sorted(&values, probs.upper()),
    })
}

/// Pearson correlations between posterior draws of several columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    /// Row-major, `values[i][j]` is the correlation of `names[i]` and `names[j]`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[i][j])
    }
}

/// Correlation matrix of the named columns. A constant column correlates as NaN
/// with everything except itself.
pub fn correlation_matrix<S: AsRef<str>>(
    samples: &PosteriorSamples,
    names: &[S],
) -> Result<CorrelationMatrix, SummaryError> {
    let columns = names
        .iter()
        .map(|n| {
            samples
                .column(n.as_ref())
                .ok_or_else(|| SummaryError::NoMatchingColumns {
                    prefix: n.as_ref().to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let k = columns.len();
    let mut values = vec![vec![0.0; k]; k];
    for i in 0..k {
        values[i][i] = 1.0;
        for j in (i + 1)..k {
            let r = correlation(columns[i], columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        names: names.iter().map(|n| n.as_ref().to_string()).collect(),
        values,
    })
}
