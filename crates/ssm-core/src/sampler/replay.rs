//! Replay of CODA output from an earlier sampler run.

use std::path::Path;

use super::{SampleRequest, Sampler, SamplerError};
use crate::samples::{read_coda, CodaFiles, PosteriorSamples};

/// A [`Sampler`] that ignores the request and reads existing CODA files.
#[derive(Debug, Clone)]
pub struct CodaReplay {
    files: CodaFiles,
}

impl CodaReplay {
    pub fn new(files: CodaFiles) -> Self {
        CodaReplay { files }
    }

    /// Replay `<stem>index.txt` and every `<stem>chain<k>.txt` in `dir`.
    pub fn discover(dir: &Path, stem: &str) -> Result<Self, SamplerError> {
        Ok(CodaReplay {
            files: CodaFiles::discover(dir, stem)?,
        })
    }

    pub fn files(&self) -> &CodaFiles {
        &self.files
    }

    pub fn load(&self) -> Result<PosteriorSamples, SamplerError> {
        Ok(read_coda(&self.files)?)
    }
}

impl Sampler for CodaReplay {
    fn name(&self) -> &str {
        "replay"
    }

    fn run(&self, request: &SampleRequest<'_>) -> Result<PosteriorSamples, SamplerError> {
        let samples = self.load()?;
        if samples.n_chains() != request.n_chains() {
            tracing::warn!(
                replayed = samples.n_chains(),
                requested = request.n_chains(),
                "replayed chain count differs from request"
            );
        }
        Ok(samples)
    }
}
