//! Time series ingest, hold-out masks and sampler input assembly.

pub mod fit_data;
pub mod holdout;
pub mod rdump;
pub mod series;

pub use fit_data::{CovariateMatrix, FitData};
pub use holdout::{HeldOutMask, HeldOutTruth, TruthPoint};
pub use rdump::RDump;
pub use series::{load_table, DataColumn, DataTable, TimeSeries};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading and preparing observations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("column '{column}' not found")]
    MissingColumn { column: String },

    #[error("{labels} time labels but {values} values")]
    LengthMismatch { labels: usize, values: usize },

    #[error("cannot take log of {value} at '{time}'")]
    NonPositive { time: String, value: f64 },

    #[error("held-out index {index} outside series of length {len}")]
    HeldOutOutOfRange { index: usize, len: usize },

    #[error("need at least {needed} observed values, found {found}")]
    TooFewObservations { needed: usize, found: usize },

    #[error("bootstrap resample had zero variance after {attempts} attempts")]
    DegenerateBootstrap { attempts: usize },

    #[error("invalid JSON time series: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<DataError> for ssm_common::Error {
    fn from(err: DataError) -> Self {
        match err {
            DataError::MissingColumn { column } => ssm_common::Error::MissingColumn { column },
            DataError::HeldOutOutOfRange { index, len } => {
                ssm_common::Error::HeldOutOutOfRange { index, len }
            }
            DataError::Io { source, .. } => ssm_common::Error::Io(source),
            other => ssm_common::Error::Data(other.to_string()),
        }
    }
}
