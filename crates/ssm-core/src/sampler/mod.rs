//! The external MCMC sampler boundary.
//!
//! Sampling itself is done by another program. A [`Sampler`] takes a typed
//! request (model, data, initial values, run lengths) and hands back a
//! [`PosteriorSamples`] matrix, or an error explaining why it could not.

pub mod jags;
pub mod replay;

pub use jags::JagsSampler;
pub use replay::CodaReplay;

use std::path::PathBuf;
use thiserror::Error;

use crate::data::FitData;
use crate::inits::ChainInits;
use crate::model::ModelSpec;
use crate::samples::{PosteriorSamples, SampleError};

/// Everything a sampler needs for one fit.
#[derive(Debug, Clone)]
pub struct SampleRequest<'a> {
    pub model: &'a ModelSpec,
    pub data: &'a FitData,
    /// One entry per chain.
    pub inits: &'a [ChainInits],
    pub n_adapt: u64,
    pub burn_in: u64,
    pub n_iter: u64,
    pub thin: u64,
}

impl SampleRequest<'_> {
    pub fn n_chains(&self) -> usize {
        self.inits.len()
    }

    pub fn monitor(&self) -> &[String] {
        self.model.monitored()
    }
}

/// Produces posterior draws for a request.
pub trait Sampler {
    /// Short name for logs.
    fn name(&self) -> &str;

    fn run(&self, request: &SampleRequest<'_>) -> Result<PosteriorSamples, SamplerError>;
}

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("sampler executable '{path}' not found")]
    ExecutableNotFound { path: String },

    #[error("sampler exited with status {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("sampler did not finish within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("sampler finished but wrote no output ({path}): {stderr}")]
    MissingOutput { path: PathBuf, stderr: String },

    #[error("request needs at least one chain")]
    NoChains,

    #[error("sampler I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Output(#[from] SampleError),
}

impl SamplerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SamplerError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<SamplerError> for ssm_common::Error {
    fn from(err: SamplerError) -> Self {
        match err {
            SamplerError::ExecutableNotFound { path } => ssm_common::Error::SamplerMissing { path },
            SamplerError::Timeout { seconds } => ssm_common::Error::SamplerTimeout { seconds },
            SamplerError::Io { source, .. } => ssm_common::Error::Io(source),
            SamplerError::Output(e) => e.into(),
            SamplerError::MissingOutput { .. } => {
                ssm_common::Error::SamplerOutput(err.to_string())
            }
            SamplerError::Failed { .. } | SamplerError::NoChains => {
                ssm_common::Error::SamplerFailed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_common_codes() {
        let e: ssm_common::Error = SamplerError::ExecutableNotFound {
            path: "jags".into(),
        }
        .into();
        assert_eq!(e.code(), 40);
        let e: ssm_common::Error = SamplerError::Timeout { seconds: 5 }.into();
        assert_eq!(e.code(), 42);
        let e: ssm_common::Error = SamplerError::Failed {
            status: "1".into(),
            stderr: "Unable to resolve node".into(),
        }
        .into();
        assert_eq!(e.code(), 41);
        let e: ssm_common::Error = SamplerError::Output(SampleError::coda("CODAindex.txt", 2, "bad"))
            .into();
        assert_eq!(e.code(), 43);
    }
}
