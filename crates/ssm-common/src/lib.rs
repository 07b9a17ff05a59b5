//! Shared types for the state-space band workspace.
//!
//! This crate provides foundational types used by `ssm-config` and `ssm-core`:
//! - Run and fit identifiers
//! - The workspace-wide error type with stable codes
//! - Output format selection for CLI payloads

pub mod error;
pub mod id;
pub mod output;

pub use error::{Error, ErrorCategory, Result, StructuredError, SuggestedAction};
pub use id::{FitId, RunId};
pub use output::OutputFormat;

/// Schema version stamped on every JSON payload the CLI emits.
pub const SCHEMA_VERSION: &str = "1.0.0";
