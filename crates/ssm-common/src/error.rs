//! Error types shared across the workspace.
//!
//! Every error carries:
//! - A stable numeric code for machine parsing
//! - A category for grouping
//! - A recoverability hint and a suggested action for automation
//! - A remediation sentence for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ No Matching Columns
//!   Reason: no columns match variable group 'x'
//!   Fix: Check the monitored variables ...
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 50,
//!   "category": "summary",
//!   "message": "no columns match variable group 'x'",
//!   "recoverable": false,
//!   "suggested_action": "fix_input",
//!   "context": { "prefix": "x" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for workspace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors (priors, sampler settings, schema).
    Config,
    /// Time series ingest and hold-out errors.
    Data,
    /// Model description errors.
    Model,
    /// External sampler invocation and output errors.
    Sampler,
    /// Posterior summarization errors.
    Summary,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Sampler => write!(f, "sampler"),
            ErrorCategory::Summary => write!(f, "summary"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for automation in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation unchanged.
    Retry,
    /// Retry with more iterations or a longer timeout.
    RetryLonger,
    /// Reset configuration to defaults.
    ResetConfig,
    /// Run the validation command.
    RunCheck,
    /// Correct the input (prefix, time index, probabilities).
    FixInput,
    /// Install or point at the sampler executable.
    InstallSampler,
    /// Abort the operation.
    Abort,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::RetryLonger => write!(f, "retry_longer"),
            SuggestedAction::ResetConfig => write!(f, "reset_config"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::InstallSampler => write!(f, "install_sampler"),
            SuggestedAction::Abort => write!(f, "abort"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for the workspace.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid priors: {0}")]
    InvalidPriors(String),

    #[error("invalid sampler settings: {0}")]
    InvalidSampler(String),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    // Data errors (20-29)
    #[error("data error: {0}")]
    Data(String),

    #[error("column '{column}' not found in time series")]
    MissingColumn { column: String },

    #[error("held-out index {index} outside series of length {len}")]
    HeldOutOutOfRange { index: usize, len: usize },

    // Model errors (30-39)
    #[error("model error: {0}")]
    Model(String),

    // Sampler errors (40-49)
    #[error("sampler executable not found: {path}")]
    SamplerMissing { path: String },

    #[error("sampler failed: {0}")]
    SamplerFailed(String),

    #[error("sampler timed out after {seconds}s")]
    SamplerTimeout { seconds: u64 },

    #[error("malformed sampler output: {0}")]
    SamplerOutput(String),

    // Summary errors (50-59)
    #[error("no columns match variable group '{prefix}'")]
    NoMatchingColumns { prefix: String },

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("insufficient draws: {0}")]
    InsufficientDraws(String),

    #[error("invalid probability {value}: {reason}")]
    InvalidProbability { value: f64, reason: String },

    #[error("summary failed: {0}")]
    Summary(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Data errors
    /// - 30-39: Model errors
    /// - 40-49: Sampler errors
    /// - 50-59: Summary errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidPriors(_) => 11,
            Error::InvalidSampler(_) => 12,
            Error::SchemaValidation(_) => 13,
            Error::Data(_) => 20,
            Error::MissingColumn { .. } => 21,
            Error::HeldOutOutOfRange { .. } => 22,
            Error::Model(_) => 30,
            Error::SamplerMissing { .. } => 40,
            Error::SamplerFailed(_) => 41,
            Error::SamplerTimeout { .. } => 42,
            Error::SamplerOutput(_) => 43,
            Error::NoMatchingColumns { .. } => 50,
            Error::LengthMismatch { .. } => 51,
            Error::InsufficientDraws(_) => 52,
            Error::InvalidProbability { .. } => 53,
            Error::Summary(_) => 54,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_)
            | Error::InvalidPriors(_)
            | Error::InvalidSampler(_)
            | Error::SchemaValidation(_) => ErrorCategory::Config,

            Error::Data(_) | Error::MissingColumn { .. } | Error::HeldOutOutOfRange { .. } => {
                ErrorCategory::Data
            }

            Error::Model(_) => ErrorCategory::Model,

            Error::SamplerMissing { .. }
            | Error::SamplerFailed(_)
            | Error::SamplerTimeout { .. }
            | Error::SamplerOutput(_) => ErrorCategory::Sampler,

            Error::NoMatchingColumns { .. }
            | Error::LengthMismatch { .. }
            | Error::InsufficientDraws(_)
            | Error::InvalidProbability { .. }
            | Error::Summary(_) => ErrorCategory::Summary,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Summary errors are deterministic functions of their input: retrying
    /// without changing the input cannot succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidPriors(_) => true,
            Error::InvalidSampler(_) => true,
            Error::SchemaValidation(_) => true,

            Error::Data(_) => false,
            Error::MissingColumn { .. } => false,
            Error::HeldOutOutOfRange { .. } => false,

            Error::Model(_) => false,

            Error::SamplerMissing { .. } => true, // Can install
            Error::SamplerFailed(_) => true,      // Different seed may help
            Error::SamplerTimeout { .. } => true, // Longer timeout
            Error::SamplerOutput(_) => false,

            Error::NoMatchingColumns { .. } => false,
            Error::LengthMismatch { .. } => false,
            Error::InsufficientDraws(_) => false,
            Error::InvalidProbability { .. } => false,
            Error::Summary(_) => false,

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns the suggested action for automation.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidPriors(_) => SuggestedAction::ResetConfig,
            Error::InvalidSampler(_) => SuggestedAction::ResetConfig,
            Error::SchemaValidation(_) => SuggestedAction::RunCheck,

            Error::Data(_) => SuggestedAction::FixInput,
            Error::MissingColumn { .. } => SuggestedAction::FixInput,
            Error::HeldOutOutOfRange { .. } => SuggestedAction::FixInput,

            Error::Model(_) => SuggestedAction::FixInput,

            Error::SamplerMissing { .. } => SuggestedAction::InstallSampler,
            Error::SamplerFailed(_) => SuggestedAction::Retry,
            Error::SamplerTimeout { .. } => SuggestedAction::RetryLonger,
            Error::SamplerOutput(_) => SuggestedAction::ManualIntervention,

            Error::NoMatchingColumns { .. } => SuggestedAction::FixInput,
            Error::LengthMismatch { .. } => SuggestedAction::FixInput,
            Error::InsufficientDraws(_) => SuggestedAction::RetryLonger,
            Error::InvalidProbability { .. } => SuggestedAction::FixInput,
            Error::Summary(_) => SuggestedAction::Abort,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'ssm-core check' to validate configuration, or check syntax in the config file."
            }
            Error::InvalidPriors(_) => {
                "Gamma shapes and rates must be positive; reset with 'ssm-core config default'."
            }
            Error::InvalidSampler(_) => {
                "Chains, iterations and thinning must be positive, and burn-in shorter than the run."
            }
            Error::SchemaValidation(_) => {
                "Ensure the configuration file matches 'ssm-core config schema'."
            }

            Error::Data(_) => "Check the time series file: one header line, then label,value rows.",
            Error::MissingColumn { .. } => {
                "Pass '--column' with a header name present in the time series file."
            }
            Error::HeldOutOutOfRange { .. } => {
                "Held-out positions are 0-based and must be smaller than the series length."
            }

            Error::Model(_) => "Covariate names must be identifiers and unique within the model.",

            Error::SamplerMissing { .. } => {
                "Install JAGS or point '--jags' / sampler.executable at the jags binary."
            }
            Error::SamplerFailed(_) => {
                "Inspect the sampler stderr above. Initial values far from the data are a common cause."
            }
            Error::SamplerTimeout { .. } => {
                "Increase sampler.timeout_secs or reduce the number of iterations."
            }
            Error::SamplerOutput(_) => {
                "The CODA files are truncated or malformed. Re-run the sampler."
            }

            Error::NoMatchingColumns { .. } => {
                "Check the monitored variables; groups are named like x[1], x[2], ..."
            }
            Error::LengthMismatch { .. } => {
                "The time index and the variable group must have the same length."
            }
            Error::InsufficientDraws(_) => {
                "The sample matrix has no draws left; reduce burn-in or increase iterations."
            }
            Error::InvalidProbability { .. } => {
                "Band probabilities must lie in [0, 1], with lower <= 0.5 <= upper."
            }
            Error::Summary(_) => "Report as a bug with the CODA files attached.",

            Error::Io(_) => "Check that the path exists and is readable, then retry.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq .' or regenerate the file.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidPriors(_) => "Invalid Priors",
            Error::InvalidSampler(_) => "Invalid Sampler Settings",
            Error::SchemaValidation(_) => "Schema Validation Failed",

            Error::Data(_) => "Data Error",
            Error::MissingColumn { .. } => "Missing Column",
            Error::HeldOutOutOfRange { .. } => "Held-Out Index Out Of Range",

            Error::Model(_) => "Model Error",

            Error::SamplerMissing { .. } => "Sampler Not Found",
            Error::SamplerFailed(_) => "Sampler Failed",
            Error::SamplerTimeout { .. } => "Sampler Timeout",
            Error::SamplerOutput(_) => "Malformed Sampler Output",

            Error::NoMatchingColumns { .. } => "No Matching Columns",
            Error::LengthMismatch { .. } => "Length Mismatch",
            Error::InsufficientDraws(_) => "Insufficient Draws",
            Error::InvalidProbability { .. } => "Invalid Probability",
            Error::Summary(_) => "Summary Error",

            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }

    /// Format the error for a terminal: headline, reason, fix.
    pub fn to_human(&self) -> String {
        format!(
            "✗ {}\n  Reason: {}\n  Fix: {}",
            self.headline(),
            self,
            self.remediation()
        )
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for automation.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (e.g., prefix, lengths).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::MissingColumn { column } => {
                context.insert("column".to_string(), serde_json::json!(column));
            }
            Error::HeldOutOutOfRange { index, len } => {
                context.insert("index".to_string(), serde_json::json!(index));
                context.insert("len".to_string(), serde_json::json!(len));
            }
            Error::SamplerMissing { path } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::SamplerTimeout { seconds } => {
                context.insert("timeout_seconds".to_string(), serde_json::json!(seconds));
            }
            Error::NoMatchingColumns { prefix } => {
                context.insert("prefix".to_string(), serde_json::json!(prefix));
            }
            Error::LengthMismatch { expected, actual } => {
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            Error::InvalidProbability { value, .. } => {
                context.insert("value".to_string(), serde_json::json!(value));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}
