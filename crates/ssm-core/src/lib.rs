//! State-space posterior bands.
//!
//! This library provides:
//! - Posterior sample matrices with a typed variable-group index, read from
//!   CODA files
//! - Credible bands, scalar parameter summaries and held-out comparison
//! - Convergence diagnostics (split R-hat, effective sample size)
//! - Typed model descriptions rendered to the JAGS language
//! - Time series ingest, hold-out masks and bootstrap initial values
//! - The external sampler boundary and its JAGS adapter
//! - Configuration loading, exit codes and structured logging for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod data;
pub mod diagnostics;
pub mod exit_codes;
pub mod inits;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod sampler;
pub mod samples;
pub mod summary;

pub use pipeline::{prepare, run_fit, summarize, FitSummary, PreparedFit, SummaryOptions};
pub use samples::PosteriorSamples;
pub use summary::{align_to_time, compare_bands, credible_band, extract_group, Transform};
