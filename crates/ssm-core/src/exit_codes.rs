//! Exit codes for the ssm-core CLI.
//!
//! Ranges:
//! - 0-2: the command ran; the code carries the diagnostics verdict
//! - 10-19: user or environment errors (fixable by changing input)
//! - 20-29: runtime failures

use crate::diagnostics::QualityStatus;

/// Stable process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success; diagnostics passed or were not computed.
    Ok = 0,
    /// Success, but convergence diagnostics raised warnings.
    DiagnosticsWarn = 1,
    /// Success, but convergence diagnostics failed.
    DiagnosticsFail = 2,

    /// Invalid arguments.
    ArgsError = 10,
    /// Configuration could not be loaded or failed validation.
    ConfigError = 11,
    /// Time series or hold-out problem.
    DataError = 12,
    /// The sampler executable could not be found.
    SamplerMissing = 13,
    /// Invalid model description.
    ModelError = 14,
    /// The posterior could not be summarized as requested.
    SummaryError = 15,

    /// Internal error (bug).
    InternalError = 20,
    IoError = 21,
    /// The sampler ran and failed, or wrote unreadable output.
    SamplerError = 22,
    TimeoutError = 23,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// The command completed (codes 0-2).
    pub fn is_success(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Name used in JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Ok => "OK",
            ExitCode::DiagnosticsWarn => "OK_DIAGNOSTICS_WARN",
            ExitCode::DiagnosticsFail => "OK_DIAGNOSTICS_FAIL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::DataError => "ERR_DATA",
            ExitCode::SamplerMissing => "ERR_SAMPLER_MISSING",
            ExitCode::ModelError => "ERR_MODEL",
            ExitCode::SummaryError => "ERR_SUMMARY",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::SamplerError => "ERR_SAMPLER",
            ExitCode::TimeoutError => "ERR_TIMEOUT",
        }
    }

    /// Exit code for a completed run with the given diagnostics verdict.
    pub fn from_quality(status: QualityStatus) -> Self {
        match status {
            QualityStatus::Ok => ExitCode::Ok,
            QualityStatus::Warn => ExitCode::DiagnosticsWarn,
            QualityStatus::Fail => ExitCode::DiagnosticsFail,
        }
    }
}

impl From<&ssm_common::Error> for ExitCode {
    fn from(err: &ssm_common::Error) -> Self {
        use ssm_common::{Error, ErrorCategory};
        match err {
            Error::SamplerMissing { .. } => ExitCode::SamplerMissing,
            Error::SamplerTimeout { .. } => ExitCode::TimeoutError,
            Error::Json(_) => ExitCode::InternalError,
            _ => match err.category() {
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::Data => ExitCode::DataError,
                ErrorCategory::Model => ExitCode::ModelError,
                ErrorCategory::Sampler => ExitCode::SamplerError,
                ErrorCategory::Summary => ExitCode::SummaryError,
                ErrorCategory::Io => ExitCode::IoError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssm_common::Error;

    #[test]
    fn test_ranges() {
        assert!(ExitCode::DiagnosticsFail.is_success());
        assert!(!ExitCode::DiagnosticsFail.is_error());
        assert!(ExitCode::SamplerMissing.is_user_error());
        assert!(ExitCode::TimeoutError.is_error());
        assert!(!ExitCode::TimeoutError.is_user_error());
    }

    #[test]
    fn test_quality_mapping() {
        assert_eq!(ExitCode::from_quality(QualityStatus::Ok), ExitCode::Ok);
        assert_eq!(ExitCode::from_quality(QualityStatus::Warn).as_i32(), 1);
        assert_eq!(ExitCode::from_quality(QualityStatus::Fail).as_i32(), 2);
    }

    #[test]
    fn test_error_mapping() {
        let cases = [
            (Error::Config("bad".into()), ExitCode::ConfigError),
            (
                Error::MissingColumn {
                    column: "Ohio".into(),
                },
                ExitCode::DataError,
            ),
            (Error::Model("dup".into()), ExitCode::ModelError),
            (
                Error::SamplerMissing {
                    path: "jags".into(),
                },
                ExitCode::SamplerMissing,
            ),
            (Error::SamplerFailed("exit 1".into()), ExitCode::SamplerError),
            (Error::SamplerTimeout { seconds: 3 }, ExitCode::TimeoutError),
            (
                Error::NoMatchingColumns { prefix: "x".into() },
                ExitCode::SummaryError,
            ),
            (Error::Io(std::io::Error::other("disk")), ExitCode::IoError),
        ];
        for (err, expected) in cases {
            assert_eq!(ExitCode::from(&err), expected, "{err}");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::SummaryError.to_string(), "ERR_SUMMARY (15)");
    }
}
