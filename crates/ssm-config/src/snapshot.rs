//! Configuration snapshots for fit reproducibility.
//!
//! A snapshot captures the effective configuration at the start of a fit so
//! that bands and held-out tables can be traced back to the exact priors,
//! sampler settings and seed that produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::fit::FitConfig;
use crate::resolve::{ConfigPath, ConfigSource};

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Hostname where snapshot was taken.
    #[serde(default)]
    pub hostname: Option<String>,

    pub schema_version: String,

    /// Path the config was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    pub config_source: String,

    /// SHA-256 of the raw file content, when a file was read.
    #[serde(default)]
    pub file_hash: Option<String>,

    /// SHA-256 of the effective configuration serialized as JSON.
    pub effective_hash: String,

    pub summary: ConfigSummary,
}

/// Key configuration values for quick reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub model: String,
    pub covariates: usize,
    pub n_chains: u32,
    pub burn_in: u64,
    pub n_iter: u64,
    pub thin: u64,
    pub seed: u64,
    pub band: (f64, f64),
}

impl ConfigSummary {
    fn of(config: &FitConfig) -> Self {
        ConfigSummary {
            model: config.model.kind.to_string(),
            covariates: config.model.covariates.len(),
            n_chains: config.sampler.n_chains,
            burn_in: config.sampler.burn_in,
            n_iter: config.sampler.n_iter,
            thin: config.sampler.thin,
            seed: config.sampler.seed,
            band: (config.bands.lower, config.bands.upper),
        }
    }
}

impl ConfigSnapshot {
    /// Create a snapshot from the effective configuration.
    pub fn new(config: &FitConfig, path: &ConfigPath, raw: Option<&str>) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            hostname: std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()),
            schema_version: config.schema_version.clone(),
            config_path: path.path.as_ref().map(|p| p.display().to_string()),
            config_source: path.source.to_string(),
            file_hash: raw.map(hash_content),
            effective_hash: effective_hash(config),
            summary: ConfigSummary::of(config),
        }
    }

    /// Create a snapshot of the built-in defaults.
    pub fn defaults_only() -> Self {
        let config = FitConfig::default();
        let path = ConfigPath {
            path: None,
            source: ConfigSource::BuiltinDefault,
        };
        Self::new(&config, &path, None)
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot describes the same effective configuration.
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.effective_hash == other.effective_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.effective_hash[..12.min(self.effective_hash.len())]
    }
}

fn effective_hash(config: &FitConfig) -> String {
    // serde_json serializes struct fields in declaration order, so equal
    // configs hash equally regardless of how the file was written.
    let canonical = serde_json::to_string(config).unwrap_or_default();
    hash_content(&canonical)
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::{parse_fit_config, ConfigFormat};

    #[test]
    fn test_defaults_snapshot() {
        let snapshot = ConfigSnapshot::defaults_only();
        assert_eq!(snapshot.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert!(snapshot.file_hash.is_none());
        assert_eq!(snapshot.config_source, "builtin default");
        assert_eq!(snapshot.summary.n_chains, 3);
        assert_eq!(snapshot.summary.band, (0.025, 0.975));
    }

    #[test]
    fn test_snapshot_short_id() {
        let snapshot = ConfigSnapshot::defaults_only();
        assert_eq!(snapshot.short_id().len(), 12);
    }

    #[test]
    fn equivalent_files_share_effective_hash() {
        let json = parse_fit_config(r#"{"schema_version":"1.0.0"}"#, ConfigFormat::Json).unwrap();
        let toml = parse_fit_config("schema_version = \"1.0.0\"\n", ConfigFormat::Toml).unwrap();
        let path = ConfigPath::default();
        let a = ConfigSnapshot::new(&json, &path, Some(r#"{"schema_version":"1.0.0"}"#));
        let b = ConfigSnapshot::new(&toml, &path, Some("schema_version = \"1.0.0\"\n"));
        assert!(a.matches(&b));
        assert_ne!(a.file_hash, b.file_hash);
    }

    #[test]
    fn seed_changes_hash() {
        let mut config = FitConfig::default();
        let before = ConfigSnapshot::new(&config, &ConfigPath::default(), None);
        config.sampler.seed += 1;
        let after = ConfigSnapshot::new(&config, &ConfigPath::default(), None);
        assert!(!before.matches(&after));
    }

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test");
        let hash2 = hash_content("test");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let snapshot = ConfigSnapshot::defaults_only();
        let json = snapshot.to_json().unwrap();
        let restored = ConfigSnapshot::from_json(&json).unwrap();
        assert!(snapshot.matches(&restored));
        assert_eq!(snapshot.summary, restored.summary);
    }
}
