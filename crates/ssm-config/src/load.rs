//! Reading fit configuration files (JSON or TOML).

use std::path::Path;

use crate::fit::FitConfig;
use crate::validate::{validate_fit_config, ValidationError, ValidationResult};

/// On-disk configuration syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Parse and validate configuration text.
pub fn parse_fit_config(content: &str, format: ConfigFormat) -> ValidationResult<FitConfig> {
    let config: FitConfig = match format {
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))?
        }
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))?
        }
    };
    validate_fit_config(&config)?;
    Ok(config)
}

/// Read, parse and validate a configuration file.
pub fn load_fit_config(path: &Path) -> ValidationResult<(FitConfig, String)> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
    let config = parse_fit_config(&content, ConfigFormat::from_path(path))?;
    Ok((config, content))
}
