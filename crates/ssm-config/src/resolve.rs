//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths → system → defaults.

use std::path::{Path, PathBuf};

/// Where a configuration file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/ssm-bands/.
    SystemConfig,

    /// Built from a named preset.
    Preset,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::Preset => write!(f, "preset"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A discovered configuration file and where it came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigPath {
    /// Path to the fit config (or None if not found).
    pub path: Option<PathBuf>,

    /// Source of the config (for diagnostics).
    pub source: ConfigSource,
}

/// Environment variable names.
const ENV_CONFIG_PATH: &str = "SSM_CONFIG";
const ENV_CONFIG_DIR: &str = "SSM_CONFIG_DIR";

/// Standard config file names, in lookup order.
const CONFIG_FILENAMES: &[&str] = &["fit.json", "fit.toml"];

/// Application name for XDG directories.
const APP_NAME: &str = "ssm-bands";

/// Resolve the fit configuration path using the standard resolution order.
///
/// 1. Explicit CLI path (if it exists)
/// 2. `SSM_CONFIG` environment variable
/// 3. `SSM_CONFIG_DIR` environment variable + filename
/// 4. XDG config directory (`~/.config/ssm-bands/`)
/// 5. System config (`/etc/ssm-bands/`)
/// 6. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPath {
    if let Some(path) = cli_path {
        if path.exists() {
            return found(path.to_path_buf(), ConfigSource::CliArgument);
        }
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        if let Some(path) = first_existing(&PathBuf::from(config_dir)) {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        if let Some(path) = first_existing(&dir) {
            return found(path, ConfigSource::XdgConfig);
        }
    }

    if let Some(path) = first_existing(&system_config_dir()) {
        return found(path, ConfigSource::SystemConfig);
    }

    ConfigPath::default()
}

fn found(path: PathBuf, source: ConfigSource) -> ConfigPath {
    ConfigPath {
        path: Some(path),
        source,
    }
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Get the XDG config directory for ssm-bands.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::Preset), "preset");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn cli_path_wins_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, "{}").unwrap();

        let resolved = resolve_config(Some(&path));
        assert_eq!(resolved.path.as_deref(), Some(path.as_path()));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
    }

    #[test]
    fn first_existing_prefers_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fit.toml"), "").unwrap();
        assert_eq!(first_existing(dir.path()), Some(dir.path().join("fit.toml")));

        std::fs::write(dir.path().join("fit.json"), "{}").unwrap();
        assert_eq!(first_existing(dir.path()), Some(dir.path().join("fit.json")));
    }

    #[test]
    fn test_system_config_dir() {
        assert_eq!(system_config_dir(), PathBuf::from("/etc/ssm-bands"));
    }
}
