//! Configuration loading for ssm-core.
//!
//! Wraps `ssm-config` with the CLI's resolution rules:
//! - an explicit `--config` path must exist
//! - otherwise `SSM_CONFIG`, `SSM_CONFIG_DIR`, XDG and `/etc/ssm-bands` are
//!   searched in that order
//! - `--preset` replaces the file entirely
//! - nothing found means built-in defaults

pub use ssm_config::{
    get_preset, BandSettings, ConfigPath, ConfigSnapshot, ConfigSource, FitConfig, ModelKind,
    PresetName, SamplerSettings, ValidationError,
};

use ssm_config::{load_fit_config, resolve_config, validate_fit_config};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("{0}")]
    UnknownPreset(String),

    #[error("invalid configuration{}: {source}", location(.path))]
    Invalid {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

impl From<ConfigError> for ssm_common::Error {
    fn from(err: ConfigError) -> Self {
        use ssm_common::Error;
        let message = err.to_string();
        match err {
            ConfigError::NotFound { .. } | ConfigError::UnknownPreset(_) => Error::Config(message),
            ConfigError::Invalid { source, .. } => match source.field() {
                Some(field) if field.starts_with("priors") => Error::InvalidPriors(message),
                Some(field) if field.starts_with("sampler") => Error::InvalidSampler(message),
                _ => match &source {
                    ValidationError::VersionMismatch { .. } | ValidationError::SemanticError(_) => {
                        Error::SchemaValidation(message)
                    }
                    _ => Error::Config(message),
                },
            },
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit config file (highest priority).
    pub config_path: Option<PathBuf>,
    /// Named preset; bypasses file lookup.
    pub preset: Option<String>,
}

/// Effective configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: FitConfig,
    pub path: ConfigPath,
    /// Raw file content, when a file was read.
    pub raw: Option<String>,
}

impl ResolvedConfig {
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(&self.config, &self.path, self.raw.as_deref())
    }

    pub fn source(&self) -> &ConfigSource {
        &self.path.source
    }
}

/// Load and validate the effective configuration.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    if let Some(name) = &options.preset {
        let preset: PresetName = name
            .parse()
            .map_err(|e: ssm_config::PresetError| ConfigError::UnknownPreset(e.to_string()))?;
        let config = get_preset(preset);
        validate_fit_config(&config).map_err(|source| ConfigError::Invalid { path: None, source })?;
        return Ok(ResolvedConfig {
            config,
            path: ConfigPath {
                path: None,
                source: ConfigSource::Preset,
            },
            raw: None,
        });
    }

    if let Some(path) = &options.config_path {
        if !path.exists() {
            return Err(ConfigError::NotFound { path: path.clone() });
        }
    }

    let resolved = resolve_config(options.config_path.as_deref());
    let Some(path) = resolved.path.clone() else {
        tracing::debug!("no config file found, using built-in defaults");
        return Ok(ResolvedConfig {
            config: FitConfig::default(),
            path: resolved,
            raw: None,
        });
    };

    let (config, raw) = load_fit_config(&path).map_err(|source| ConfigError::Invalid {
        path: Some(path.clone()),
        source,
    })?;
    tracing::debug!(path = %path.display(), source = %resolved.source, "config loaded");
    Ok(ResolvedConfig {
        config,
        path: resolved,
        raw: Some(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_path_is_not_found() {
        let options = ConfigOptions {
            config_path: Some(PathBuf::from("/nonexistent/fit.json")),
            preset: None,
        };
        let err = load_config(&options).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        let common: ssm_common::Error = err.into();
        assert_eq!(common.code(), 10);
    }

    #[test]
    fn explicit_path_is_loaded_with_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.toml");
        std::fs::write(
            &path,
            "schema_version = \"1.0.0\"\n[sampler]\nn_chains = 2\nburn_in = 10\nn_iter = 100\nseed = 3\n",
        )
        .unwrap();
        let resolved = load_config(&ConfigOptions {
            config_path: Some(path),
            preset: None,
        })
        .unwrap();
        assert_eq!(resolved.config.sampler.n_chains, 2);
        assert_eq!(*resolved.source(), ConfigSource::CliArgument);
        assert!(resolved.snapshot().file_hash.is_some());
    }

    #[test]
    fn invalid_priors_map_to_priors_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");
        let mut config = FitConfig::default();
        config.priors.a_obs = -1.0;
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
        let err = load_config(&ConfigOptions {
            config_path: Some(path),
            preset: None,
        })
        .unwrap_err();
        let common: ssm_common::Error = err.into();
        assert_eq!(common.code(), 11);
    }

    #[test]
    fn preset_bypasses_files() {
        let resolved = load_config(&ConfigOptions {
            config_path: None,
            preset: Some("quick".into()),
        })
        .unwrap();
        assert_eq!(resolved.config.sampler.n_chains, 2);
        assert_eq!(*resolved.source(), ConfigSource::Preset);
        assert!(resolved.raw.is_none());
    }

    #[test]
    fn unknown_preset() {
        let err = load_config(&ConfigOptions {
            config_path: None,
            preset: Some("gibbs".into()),
        })
        .unwrap_err();
        assert!(err.to_string().contains("teaching"));
    }
}
