//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::fit::{BandSettings, BandTransform, FitConfig, ModelKind, SamplerSettings, StatePriors};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 13,
            ValidationError::InvalidValue { .. } => 10,
            ValidationError::VersionMismatch { .. } => 13,
        }
    }

    /// Dotted path of the offending field, when known.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Validate a fit configuration semantically.
pub fn validate_fit_config(config: &FitConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_priors(&config.priors)?;
    validate_sampler(&config.sampler)?;
    validate_bands(&config.bands)?;

    // Exp undoes the log taken before fitting; on a raw-scale fit it would
    // exponentiate counts.
    if !config.data.log_transform && config.bands.transform == BandTransform::Exp {
        return Err(ValidationError::InvalidValue {
            field: "bands.transform".to_string(),
            message: "exp needs data.log_transform = true; use \"identity\" for a raw-scale fit"
                .to_string(),
        });
    }

    if config.model.kind == ModelKind::RandomWalk && !config.model.covariates.is_empty() {
        return Err(ValidationError::SemanticError(format!(
            "covariates {:?} require model.kind = dynamic_linear",
            config.model.covariates
        )));
    }
    for (i, name) in config.model.covariates.iter().enumerate() {
        if !is_identifier(name) {
            return Err(ValidationError::InvalidValue {
                field: format!("model.covariates[{}]", i),
                message: format!("'{}' is not an identifier", name),
            });
        }
        if config.model.covariates[..i].contains(name) {
            return Err(ValidationError::InvalidValue {
                field: format!("model.covariates[{}]", i),
                message: format!("duplicate covariate '{}'", name),
            });
        }
    }

    if config.bands.state_group.is_empty() || !is_identifier(&config.bands.state_group) {
        return Err(ValidationError::InvalidValue {
            field: "bands.state_group".to_string(),
            message: format!("'{}' is not an identifier", config.bands.state_group),
        });
    }

    Ok(())
}

fn validate_priors(priors: &StatePriors) -> ValidationResult<()> {
    require_finite("priors.x_ic", priors.x_ic)?;
    require_positive("priors.tau_ic", priors.tau_ic)?;
    require_positive("priors.a_obs", priors.a_obs)?;
    require_positive("priors.r_obs", priors.r_obs)?;
    require_positive("priors.a_add", priors.a_add)?;
    require_positive("priors.r_add", priors.r_add)?;
    require_positive("priors.beta_precision", priors.beta_precision)?;
    Ok(())
}

fn validate_sampler(sampler: &SamplerSettings) -> ValidationResult<()> {
    if sampler.executable.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "sampler.executable".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if sampler.n_chains == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sampler.n_chains".to_string(),
            message: "at least one chain is required".to_string(),
        });
    }
    if sampler.thin == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sampler.thin".to_string(),
            message: "must be >= 1".to_string(),
        });
    }
    if sampler.n_iter == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sampler.n_iter".to_string(),
            message: "must be >= 1".to_string(),
        });
    }
    if sampler.retained_per_chain() == 0 {
        return Err(ValidationError::SemanticError(format!(
            "thin={} retains no draws from n_iter={}",
            sampler.thin, sampler.n_iter
        )));
    }
    if sampler.timeout_secs == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: "sampler.timeout_secs".to_string(),
            message: "must be positive when set".to_string(),
        });
    }

    let d = &sampler.diagnostics;
    if !(d.max_rhat_warn >= 1.0 && d.max_rhat_warn <= d.max_rhat_fail) {
        return Err(ValidationError::InvalidValue {
            field: "sampler.diagnostics.max_rhat_warn".to_string(),
            message: format!(
                "need 1 <= warn <= fail, got warn={} fail={}",
                d.max_rhat_warn, d.max_rhat_fail
            ),
        });
    }
    if !(d.min_ess_fail >= 0.0 && d.min_ess_fail <= d.min_ess_warn) {
        return Err(ValidationError::InvalidValue {
            field: "sampler.diagnostics.min_ess_fail".to_string(),
            message: format!(
                "need 0 <= fail <= warn, got fail={} warn={}",
                d.min_ess_fail, d.min_ess_warn
            ),
        });
    }
    Ok(())
}

fn validate_bands(bands: &BandSettings) -> ValidationResult<()> {
    if !(bands.lower.is_finite() && (0.0..=0.5).contains(&bands.lower)) {
        return Err(ValidationError::InvalidValue {
            field: "bands.lower".to_string(),
            message: format!("must be in [0, 0.5], got {}", bands.lower),
        });
    }
    if !(bands.upper.is_finite() && (0.5..=1.0).contains(&bands.upper)) {
        return Err(ValidationError::InvalidValue {
            field: "bands.upper".to_string(),
            message: format!("must be in [0.5, 1], got {}", bands.upper),
        });
    }
    Ok(())
}

fn require_finite(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("must be finite, got {}", value),
        });
    }
    Ok(())
}

fn require_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("must be > 0, got {}", value),
        });
    }
    Ok(())
}

/// Whether `name` can be used as a node name in the sampler grammar.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::ModelConfig;

    #[test]
    fn default_config_is_valid() {
        validate_fit_config(&FitConfig::default()).unwrap();
    }

    #[test]
    fn version_mismatch_is_reported() {
        let config = FitConfig {
            schema_version: "0.9.0".to_string(),
            ..FitConfig::default()
        };
        match validate_fit_config(&config).unwrap_err() {
            ValidationError::VersionMismatch { actual, .. } => assert_eq!(actual, "0.9.0"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_positive_gamma_rate_names_field() {
        let mut config = FitConfig::default();
        config.priors.r_add = 0.0;
        let err = validate_fit_config(&config).unwrap_err();
        assert_eq!(err.field(), Some("priors.r_add"));
    }

    #[test]
    fn band_tails_must_bracket_median() {
        let mut config = FitConfig::default();
        config.bands.lower = 0.6;
        assert_eq!(
            validate_fit_config(&config).unwrap_err().field(),
            Some("bands.lower")
        );

        let mut config = FitConfig::default();
        config.bands.upper = 1.2;
        assert_eq!(
            validate_fit_config(&config).unwrap_err().field(),
            Some("bands.upper")
        );
    }

    #[test]
    fn raw_scale_fit_rejects_exp_band() {
        let mut config = FitConfig::default();
        config.data.log_transform = false;
        assert_eq!(
            validate_fit_config(&config).unwrap_err().field(),
            Some("bands.transform")
        );

        config.bands.transform = BandTransform::Identity;
        validate_fit_config(&config).unwrap();
    }

    #[test]
    fn thinning_past_iterations_is_rejected() {
        let mut config = FitConfig::default();
        config.sampler.n_iter = 10;
        config.sampler.thin = 20;
        assert!(matches!(
            validate_fit_config(&config),
            Err(ValidationError::SemanticError(_))
        ));
    }

    #[test]
    fn covariates_need_dynamic_linear_model() {
        let config = FitConfig {
            model: ModelConfig {
                covariates: vec!["Tmin".to_string()],
                ..ModelConfig::default()
            },
            ..FitConfig::default()
        };
        assert!(matches!(
            validate_fit_config(&config),
            Err(ValidationError::SemanticError(_))
        ));
    }

    #[test]
    fn covariate_names_must_be_unique_identifiers() {
        let mut config = FitConfig::default();
        config.model.kind = ModelKind::DynamicLinear;
        config.model.covariates = vec!["Tmin".to_string(), "2bad".to_string()];
        assert_eq!(
            validate_fit_config(&config).unwrap_err().field(),
            Some("model.covariates[1]")
        );

        config.model.covariates = vec!["Tmin".to_string(), "Tmin".to_string()];
        assert_eq!(
            validate_fit_config(&config).unwrap_err().field(),
            Some("model.covariates[1]")
        );
    }

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("tau_obs"));
        assert!(is_identifier("Tmin"));
        assert!(is_identifier("x.ic"));
        assert!(!is_identifier("_x"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("x[1]"));
        assert!(!is_identifier(""));
    }
}
