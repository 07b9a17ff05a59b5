//! Posterior summaries: credible bands, held-out comparison, scalar parameters.
//!
//! The pipeline is
//!
//! ```text
//! PosteriorSamples --extract_group--> VariableGroup --credible_band--> CredibleBand
//!                                                                          |
//!                         HeldOutTruth + HeldOutMask --compare_bands--> HeldOutReport
//! ```
//!
//! Every function here is a pure computation over borrowed inputs. Failures
//! are returned before any result is produced; nothing is partially filled.

pub mod band;
pub mod compare;
pub mod params;
pub mod transform;

pub use band::{
    align_to_time, credible_band, extract_group, BandPoint, BandProbs, CredibleBand, TimedBandPoint,
    VariableGroup,
};
pub use compare::{
    compare_bands, compare_models, HeldOutReport, HeldOutRow, ModelComparison, ModelReport,
};
pub use params::{correlation_matrix, summarize_scalar, CorrelationMatrix, ScalarSummary};
pub use transform::Transform;

use thiserror::Error;

/// Errors from summarizing a sample matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SummaryError {
    #[error("no columns match variable group '{prefix}'")]
    NoMatchingColumns { prefix: String },

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("column {column} has no draws")]
    InsufficientDraws { column: usize },

    #[error("invalid probability {value}: {reason}")]
    InvalidProbability { value: f64, reason: &'static str },

    #[error("column {column} contains NaN draws")]
    NanDraw { column: usize },

    #[error("no held-out points with observed values to compare")]
    NoHeldOutPoints,
}

impl From<SummaryError> for ssm_common::Error {
    fn from(err: SummaryError) -> Self {
        match err {
            SummaryError::NoMatchingColumns { prefix } => {
                ssm_common::Error::NoMatchingColumns { prefix }
            }
            SummaryError::LengthMismatch { expected, actual } => {
                ssm_common::Error::LengthMismatch { expected, actual }
            }
            SummaryError::InsufficientDraws { .. } => {
                ssm_common::Error::InsufficientDraws(err.to_string())
            }
            SummaryError::InvalidProbability { value, reason } => {
                ssm_common::Error::InvalidProbability {
                    value,
                    reason: reason.to_string(),
                }
            }
            SummaryError::NanDraw { .. } | SummaryError::NoHeldOutPoints => {
                ssm_common::Error::Summary(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_common_error_codes() {
        let e: ssm_common::Error = SummaryError::NoMatchingColumns { prefix: "x".into() }.into();
        assert_eq!(e.code(), 50);
        let e: ssm_common::Error = SummaryError::LengthMismatch {
            expected: 5,
            actual: 4,
        }
        .into();
        assert_eq!(e.code(), 51);
        let e: ssm_common::Error = SummaryError::InsufficientDraws { column: 0 }.into();
        assert_eq!(e.code(), 52);
        let e: ssm_common::Error = SummaryError::InvalidProbability {
            value: 1.5,
            reason: "outside [0, 1]",
        }
        .into();
        assert_eq!(e.code(), 53);
        let e: ssm_common::Error = SummaryError::NoHeldOutPoints.into();
        assert_eq!(e.code(), 54);
    }

    #[test]
    fn summaries_can_cross_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<crate::samples::PosteriorSamples>();
        assert_send_sync::<CredibleBand>();
        assert_send_sync::<HeldOutReport>();
        assert_send_sync::<Transform>();
        assert_send_sync::<SummaryError>();
    }
}
