//! Held-out comparison of bands against withheld observations.
//!
//! In a state-space model nearly every fitted point has its observation in the
//! likelihood, so error metrics over the whole series measure smoothing, not
//! forecasting. Every metric here is computed over held-out positions only.

use serde::Serialize;

use super::band::CredibleBand;
use super::SummaryError;
use crate::data::{HeldOutMask, HeldOutTruth};

/// One held-out time step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeldOutRow {
    /// 0-based position in the series.
    pub position: usize,
    pub time: String,
    pub observed: f64,
    pub lower: f64,
    pub median: f64,
    pub upper: f64,
    /// `observed - median`.
    pub residual: f64,
    pub within: bool,
}

/// Per-point table and aggregates over the held-out positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeldOutReport {
    pub n_points: usize,
    /// Fraction of held-out observations inside `[lower, upper]`.
    pub coverage: f64,
    pub mae: f64,
    pub rmse: f64,
    pub mean_width: f64,
    pub rows: Vec<HeldOutRow>,
    /// Held-out positions whose true value was itself missing.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<usize>,
}

/// Compare a band with the withheld truth at the held-out positions.
///
/// Positions past the end of the band are a [`SummaryError::LengthMismatch`].
/// Positions without a recorded true value are listed in `skipped`. If no
/// position can be compared the result is [`SummaryError::NoHeldOutPoints`].
pub fn compare_bands(
    band: &CredibleBand,
    truth: &HeldOutTruth,
    held_out: &HeldOutMask,
) -> Result<HeldOutReport, SummaryError> {
    let mut rows = Vec::with_capacity(held_out.len());
    let mut skipped = Vec::new();

    for position in held_out.positions() {
        let Some(point) = band.point(position) else {
            return Err(SummaryError::LengthMismatch {
                expected: band.len(),
                actual: position + 1,
            });
        };
        let Some((time, observed)) = truth
            .get(position)
            .and_then(|t| t.value.map(|v| (t.time.clone(), v)))
        else {
            skipped.push(position);
            continue;
        };

        rows.push(HeldOutRow {
            position,
            time,
            observed,
            lower: point.lower,
            median: point.median,
            upper: point.upper,
            residual: observed - point.median,
            within: point.contains(observed),
        });
    }

    if rows.is_empty() {
        return Err(SummaryError::NoHeldOutPoints);
    }

    let n = rows.len() as f64;
    let within = rows.iter().filter(|r| r.within).count() as f64;
    let abs_sum: f64 = rows.iter().map(|r| r.residual.abs()).sum();
    let sq_sum: f64 = rows.iter().map(|r| r.residual * r.residual).sum();
    let width_sum: f64 = rows.iter().map(|r| r.upper - r.lower).sum();

    Ok(HeldOutReport {
        n_points: rows.len(),
        coverage: within / n,
        mae: abs_sum / n,
        rmse: (sq_sum / n).sqrt(),
        mean_width: width_sum / n,
        rows,
        skipped,
    })
}

/// A named fit's held-out report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub model: String,
    pub report: HeldOutReport,
}

/// Held-out reports of several fits over the same truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelComparison {
    pub models: Vec<ModelReport>,
}

impl ModelComparison {
    /// Model names ordered by held-out RMSE, best first.
    pub fn ranked_by_rmse(&self) -> Vec<&str> {
        let mut ranked: Vec<&ModelReport> = self.models.iter().collect();
        ranked.sort_by(|a, b| a.report.rmse.total_cmp(&b.report.rmse));
        ranked.into_iter().map(|m| m.model.as_str()).collect()
    }
}

/// Run [`compare_bands`] for each named band against the same held-out truth.
pub fn compare_models(
    fits: &[(&str, &CredibleBand)],
    truth: &HeldOutTruth,
    held_out: &HeldOutMask,
) -> Result<ModelComparison, SummaryError> {
    let models = fits
        .iter()
        .map(|(name, band)| {
            compare_bands(band, truth, held_out).map(|report| ModelReport {
                model: name.to_string(),
                report,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ModelComparison { models })
}
