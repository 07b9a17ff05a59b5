//! Posterior sample matrices.
//!
//! A [`PosteriorSamples`] holds every retained draw of every monitored scalar,
//! column-major, with the row range of each chain. Columns named like `x[3]`
//! are indexed into variable groups once, at construction, so summaries never
//! re-parse column names.

pub mod coda;
pub mod column;
pub mod group;
pub mod matrix;

pub use coda::{read_coda, write_coda, CodaFiles, CodaIndexEntry};
pub use column::ColumnName;
pub use group::{GroupIndex, GroupMember};
pub use matrix::PosteriorSamples;

use thiserror::Error;

/// Errors raised while building or reading a sample matrix.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("sample matrix has no columns")]
    NoColumns,

    #[error("duplicate column name '{name}'")]
    DuplicateColumn { name: String },

    #[error("column '{name}' has {actual} draws in chain {chain}, expected {expected}")]
    RaggedColumn {
        name: String,
        chain: usize,
        expected: usize,
        actual: usize,
    },

    #[error("chain {chain} has {actual} columns, expected {expected}")]
    ChainWidth {
        chain: usize,
        expected: usize,
        actual: usize,
    },

    #[error("chain {chain} has no draws")]
    EmptyChain { chain: usize },

    #[error("group '{group}' has duplicate index {index}")]
    DuplicateIndex { group: String, index: usize },

    #[error("group '{group}' is not contiguous: index {missing} is missing")]
    NonContiguousGroup { group: String, missing: usize },

    #[error("cannot discard {requested} draws per chain; chain {chain} has {available}")]
    BurnInTooLong {
        requested: usize,
        chain: usize,
        available: usize,
    },

    #[error("thinning interval must be at least 1")]
    InvalidThin,

    #[error("{file}:{line}: {message}")]
    Coda {
        file: String,
        line: usize,
        message: String,
    },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SampleError {
    pub(crate) fn coda(file: &str, line: usize, message: impl Into<String>) -> Self {
        SampleError::Coda {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }
}

impl From<SampleError> for ssm_common::Error {
    fn from(err: SampleError) -> Self {
        match err {
            SampleError::Io { source, .. } => ssm_common::Error::Io(source),
            SampleError::Coda { .. } => ssm_common::Error::SamplerOutput(err.to_string()),
            SampleError::BurnInTooLong { .. } | SampleError::EmptyChain { .. } => {
                ssm_common::Error::InsufficientDraws(err.to_string())
            }
            other => ssm_common::Error::Summary(other.to_string()),
        }
    }
}
