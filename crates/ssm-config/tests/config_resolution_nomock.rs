//! No-mock configuration loading + resolution tests.
//!
//! Covers:
//! - JSON and TOML files written to a real temp directory
//! - Resolution order (CLI > SSM_CONFIG > SSM_CONFIG_DIR)
//! - Validation failures surfacing the offending field
//! - Preset determinism

use ssm_config::preset::{get_preset, PresetName};
use ssm_config::resolve::{resolve_config, ConfigSource};
use ssm_config::validate::ValidationError;
use ssm_config::{load_fit_config, ConfigSnapshot, ModelKind};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const VALID_JSON: &str = r#"{
  "schema_version": "1.0.0",
  "description": "flu random walk",
  "sampler": { "n_chains": 3, "burn_in": 1000, "n_iter": 5000, "seed": 2026 },
  "hold_out": { "last": 4 }
}"#;

const VALID_TOML: &str = r#"
schema_version = "1.0.0"

[model]
kind = "dlm"
covariates = ["Tmin"]
"#;

const BAD_PRIORS_JSON: &str = r#"{
  "schema_version": "1.0.0",
  "priors": { "x_ic": 6.9, "tau_ic": 100, "a_obs": 1, "r_obs": -1, "a_add": 1, "r_add": 1 }
}"#;

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let saved = keys.iter().map(|k| env::var(k).ok()).collect();
        for key in keys {
            env::remove_var(key);
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned");
    f()
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn test_load_json_fixture_ok() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "fit.json", VALID_JSON);
    let (config, raw) = load_fit_config(&path).expect("valid config");
    assert_eq!(config.sampler.seed, 2026);
    assert_eq!(config.hold_out.last, Some(4));
    assert_eq!(config.model.kind, ModelKind::RandomWalk);
    assert_eq!(raw, VALID_JSON);
}

#[test]
fn test_load_toml_fixture_ok() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "fit.toml", VALID_TOML);
    let (config, _) = load_fit_config(&path).expect("valid toml config");
    assert_eq!(config.model.kind, ModelKind::DynamicLinear);
    assert_eq!(config.model.covariates, vec!["Tmin".to_string()]);
}

#[test]
fn test_load_rejects_negative_rate() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "fit.json", BAD_PRIORS_JSON);
    let err = load_fit_config(&path).expect_err("negative rate should fail");
    match err {
        ValidationError::InvalidValue { field, .. } => assert_eq!(field, "priors.r_obs"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_resolve_cli_over_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&["SSM_CONFIG", "SSM_CONFIG_DIR"]);
        let dir = TempDir::new().unwrap();
        let cli = write(dir.path(), "cli.json", VALID_JSON);
        let from_env = write(dir.path(), "env.json", VALID_JSON);
        env::set_var("SSM_CONFIG", &from_env);

        let resolved = resolve_config(Some(&cli));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path.as_deref(), Some(cli.as_path()));
    });
}

#[test]
fn test_resolve_env_when_cli_missing() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&["SSM_CONFIG", "SSM_CONFIG_DIR"]);
        let dir = TempDir::new().unwrap();
        let from_env = write(dir.path(), "env.json", VALID_JSON);
        env::set_var("SSM_CONFIG", &from_env);

        let resolved = resolve_config(Some(Path::new("/nonexistent/cli.json")));
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.path.as_deref(), Some(from_env.as_path()));
    });
}

#[test]
fn test_resolve_config_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&["SSM_CONFIG", "SSM_CONFIG_DIR"]);
        let dir = TempDir::new().unwrap();
        let toml = write(dir.path(), "fit.toml", VALID_TOML);
        env::set_var("SSM_CONFIG_DIR", dir.path());

        let resolved = resolve_config(None);
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.path.as_deref(), Some(toml.as_path()));
    });
}

#[test]
fn test_presets_are_deterministic() {
    for name in PresetName::ALL {
        let a = ConfigSnapshot::new(&get_preset(*name), &Default::default(), None);
        let b = ConfigSnapshot::new(&get_preset(*name), &Default::default(), None);
        assert!(a.matches(&b), "preset {name} should hash stably");
    }
}
