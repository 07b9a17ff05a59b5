//! Variable group extraction and credible bands.

use serde::Serialize;
use ssm_math::{is_probability, quantile_sorted, sort_sample};

use super::transform::Transform;
use super::SummaryError;
use crate::samples::PosteriorSamples;

/// Tail probabilities of a two-sided band. The median (0.5) is implied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandProbs {
    lower: f64,
    upper: f64,
}

impl BandProbs {
    pub const MEDIAN: f64 = 0.5;

    /// Validate a `(lower, upper)` pair: both in `[0, 1]` and the median
    /// between them.
    pub fn new(lower: f64, upper: f64) -> Result<Self, SummaryError> {
        for p in [lower, upper] {
            if !is_probability(p) {
                return Err(SummaryError::InvalidProbability {
                    value: p,
                    reason: "must be a finite value in [0, 1]",
                });
            }
        }
        if lower > Self::MEDIAN {
            return Err(SummaryError::InvalidProbability {
                value: lower,
                reason: "lower tail must not exceed 0.5",
            });
        }
        if upper < Self::MEDIAN {
            return Err(SummaryError::InvalidProbability {
                value: upper,
                reason: "upper tail must not be below 0.5",
            });
        }
        Ok(BandProbs { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Probability mass inside the band.
    pub fn mass(&self) -> f64 {
        self.upper - self.lower
    }
}

impl Default for BandProbs {
    fn default() -> Self {
        BandProbs {
            lower: 0.025,
            upper: 0.975,
        }
    }
}

/// The columns of one variable group, ordered by index.
#[derive(Debug, Clone)]
pub struct VariableGroup<'a> {
    name: String,
    indices: Vec<usize>,
    columns: Vec<&'a [f64]>,
}

impl<'a> VariableGroup<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed indices, strictly ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn columns(&self) -> &[&'a [f64]] {
        &self.columns
    }

    /// First index absent between the lowest and highest member, if any.
    pub fn missing_index(&self) -> Option<usize> {
        self.indices
            .windows(2)
            .find(|w| w[1] != w[0] + 1)
            .map(|w| w[0] + 1)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Select the columns `prefix[i]` of a sample matrix, ordered by `i`.
///
/// Uses the group index built at ingest, so matching is exact on the base
/// name: `x` never picks up `tau_x[1]`, `xf[1]` or `x_ic`.
pub fn extract_group<'a>(
    samples: &'a PosteriorSamples,
    prefix: &str,
) -> Result<VariableGroup<'a>, SummaryError> {
    let members = samples
        .group(prefix)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| SummaryError::NoMatchingColumns {
            prefix: prefix.to_string(),
        })?;

    let mut indices = Vec::with_capacity(members.len());
    let mut columns = Vec::with_capacity(members.len());
    for member in members {
        indices.push(member.index);
        columns.push(samples.column_at(member.column).unwrap_or(&[]));
    }

    Ok(VariableGroup {
        name: prefix.to_string(),
        indices,
        columns,
    })
}

/// One time step of a band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandPoint {
    pub lower: f64,
    pub median: f64,
    pub upper: f64,
}

impl BandPoint {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Lower bound, median and upper bound per column, on the transformed scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredibleBand {
    pub probs: BandProbs,
    pub transform: Transform,
    pub lower: Vec<f64>,
    pub median: Vec<f64>,
    pub upper: Vec<f64>,
}

impl CredibleBand {
    pub fn len(&self) -> usize {
        self.median.len()
    }

    pub fn is_empty(&self) -> bool {
        self.median.is_empty()
    }

    pub fn point(&self, i: usize) -> Option<BandPoint> {
        Some(BandPoint {
            lower: *self.lower.get(i)?,
            median: *self.median.get(i)?,
            upper: *self.upper.get(i)?,
        })
    }

    pub fn points(&self) -> impl Iterator<Item = BandPoint> + '_ {
        (0..self.len()).filter_map(move |i| self.point(i))
    }
}

/// Compute a credible band over ordered columns of draws.
///
/// For each column: apply `transform` to every draw, sort, and take the
/// type-7 quantiles at `probs.0`, 0.5 and `probs.1`. A column with a single
/// draw yields a zero-width band at that draw. An empty column is an error,
/// as is a NaN after transforming.
pub fn credible_band<C: AsRef<[f64]>>(
    columns: &[C],
    probs: (f64, f64),
    transform: Transform,
) -> Result<CredibleBand, SummaryError> {
    let probs = BandProbs::new(probs.0, probs.1)?;

    let mut lower = Vec::with_capacity(columns.len());
    let mut median = Vec::with_capacity(columns.len());
    let mut upper = Vec::with_capacity(columns.len());
    let mut scratch: Vec<f64> = Vec::new();

    for (i, column) in columns.iter().enumerate() {
        let draws = column.as_ref();
        if draws.is_empty() {
            return Err(SummaryError::InsufficientDraws { column: i });
        }

        scratch.clear();
        scratch.extend(draws.iter().map(|&x| transform.apply(x)));
        if scratch.iter().any(|x| x.is_nan()) {
            return Err(SummaryError::NanDraw { column: i });
        }
        sort_sample(&mut scratch);

        lower.push(quantile_sorted(&scratch, probs.lower()));
        median.push(quantile_sorted(&scratch, BandProbs::MEDIAN));
        upper.push(quantile_sorted(&scratch, probs.upper()));
    }

    Ok(CredibleBand {
        probs,
        transform,
        lower,
        median,
        upper,
    })
}

/// A band point paired with its time label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedBandPoint {
    pub time: String,
    pub lower: f64,
    pub median: f64,
    pub upper: f64,
}

/// Pair each band point with a time label. The lengths must agree exactly.
pub fn align_to_time<L: AsRef<str>>(
    band: &CredibleBand,
    time_index: &[L],
) -> Result<Vec<TimedBandPoint>, SummaryError> {
    if band.len() != time_index.len() {
        return Err(SummaryError::LengthMismatch {
            expected: time_index.len(),
            actual: band.len(),
        });
    }
    Ok(time_index
        .iter()
        .zip(band.points())
        .map(|(label, p)| TimedBandPoint {
            time: label.as_ref().to_string(),
            lower: p.lower,
            median: p.median,
            upper: p.upper,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(names: &[&str], columns: Vec<Vec<f64>>) -> PosteriorSamples {
        PosteriorSamples::from_columns(names.iter().map(|s| s.to_string()).collect(), columns)
            .unwrap()
    }

    #[test]
    fn extract_group_orders_by_index() {
        let s = samples(
            &["x[2]", "x_ic", "x[1]", "tau_x[1]", "x[3]"],
            vec![vec![2.0], vec![9.0], vec![1.0], vec![7.0], vec![3.0]],
        );
        let g = extract_group(&s, "x").unwrap();
        assert_eq!(g.name(), "x");
        assert_eq!(g.indices(), &[1, 2, 3]);
        let firsts: Vec<f64> = g.columns().iter().map(|c| c[0]).collect();
        assert_eq!(firsts, vec![1.0, 2.0, 3.0]);
        assert_eq!(g.missing_index(), None);
    }

    #[test]
    fn extract_group_with_gap() {
        let s = samples(
            &["x[4]", "x[1]", "x[2]"],
            vec![vec![4.0], vec![1.0], vec![2.0]],
        );
        let g = extract_group(&s, "x").unwrap();
        assert_eq!(g.indices(), &[1, 2, 4]);
        assert_eq!(g.missing_index(), Some(3));
    }

    #[test]
    fn extract_group_no_match() {
        let s = samples(&["tau_obs", "x_ic"], vec![vec![1.0], vec![2.0]]);
        let err = extract_group(&s, "x").unwrap_err();
        assert_eq!(
            err,
            SummaryError::NoMatchingColumns {
                prefix: "x".to_string()
            }
        );
    }

    #[test]
    fn type7_baseline() {
        let col = vec![5.0, 3.0, 1.0, 4.0, 2.0];
        let band = credible_band(&[col], (0.025, 0.975), Transform::Identity).unwrap();
        assert!((band.lower[0] - 1.1).abs() < 1e-12);
        assert_eq!(band.median[0], 3.0);
        assert!((band.upper[0] - 4.9).abs() < 1e-12);
    }

    #[test]
    fn single_draw_is_degenerate() {
        let band = credible_band(&[vec![0.5]], (0.025, 0.975), Transform::Exp).unwrap();
        let v = 0.5f64.exp();
        assert_eq!(band.point(0), Some(BandPoint { lower: v, median: v, upper: v }));
    }

    #[test]
    fn empty_column_is_insufficient() {
        let cols: Vec<Vec<f64>> = vec![vec![1.0], vec![]];
        let err = credible_band(&cols, (0.025, 0.975), Transform::Identity).unwrap_err();
        assert_eq!(err, SummaryError::InsufficientDraws { column: 1 });
    }

    #[test]
    fn invalid_probabilities_rejected() {
        let cols = vec![vec![1.0, 2.0]];
        for probs in [(-0.1, 0.9), (0.1, 1.1), (f64::NAN, 0.9), (0.6, 0.9), (0.1, 0.4)] {
            let err = credible_band(&cols, probs, Transform::Identity).unwrap_err();
            assert!(
                matches!(err, SummaryError::InvalidProbability { .. }),
                "{probs:?} gave {err:?}"
            );
        }
        assert!(credible_band(&cols, (0.5, 0.5), Transform::Identity).is_ok());
        assert!(credible_band(&cols, (0.0, 1.0), Transform::Identity).is_ok());
    }

    #[test]
    fn nan_after_transform_rejected() {
        let cols = vec![vec![1.0, -4.0]];
        let err = credible_band(&cols, (0.1, 0.9), Transform::PrecisionToSd).unwrap_err();
        assert_eq!(err, SummaryError::NanDraw { column: 0 });
    }

    #[test]
    fn decreasing_transform_keeps_order() {
        let cols = vec![vec![1.0, 4.0, 16.0, 64.0]];
        let band = credible_band(&cols, (0.05, 0.95), Transform::PrecisionToSd).unwrap();
        assert!(band.lower[0] <= band.median[0]);
        assert!(band.median[0] <= band.upper[0]);
        assert!(band.upper[0] <= 1.0);
    }

    #[test]
    fn align_requires_equal_length() {
        let band = credible_band(&[vec![1.0], vec![2.0]], (0.025, 0.975), Transform::Identity)
            .unwrap();
        let aligned = align_to_time(&band, &["2003-09-28", "2003-10-05"]).unwrap();
        assert_eq!(aligned[1].time, "2003-10-05");
        assert_eq!(aligned[1].median, 2.0);

        let err = align_to_time(&band, &["2003-09-28"]).unwrap_err();
        assert_eq!(
            err,
            SummaryError::LengthMismatch {
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn band_point_helpers() {
        let p = BandPoint {
            lower: 1.0,
            median: 2.0,
            upper: 4.0,
        };
        assert_eq!(p.width(), 3.0);
        assert!(p.contains(1.0));
        assert!(p.contains(4.0));
        assert!(!p.contains(4.5));
    }
}
