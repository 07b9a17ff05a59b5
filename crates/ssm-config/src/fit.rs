//! Fit configuration types.
//!
//! A fit configuration describes one model fit end to end: which model family,
//! the prior hyperparameters handed to the sampler as data, how long to run the
//! sampler, how to summarize, and which observations to withhold.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Complete fit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FitConfig {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub priors: StatePriors,

    #[serde(default)]
    pub sampler: SamplerSettings,

    #[serde(default)]
    pub bands: BandSettings,

    #[serde(default)]
    pub hold_out: HoldOutSettings,

    #[serde(default)]
    pub data: DataSettings,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            model: ModelConfig::default(),
            priors: StatePriors::default(),
            sampler: SamplerSettings::default(),
            bands: BandSettings::default(),
            hold_out: HoldOutSettings::default(),
            data: DataSettings::default(),
        }
    }
}

/// Model family to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Latent random walk observed with Gaussian noise.
    #[default]
    #[serde(alias = "rw")]
    RandomWalk,
    /// Random walk plus intercept, density dependence and covariates.
    #[serde(alias = "dlm")]
    DynamicLinear,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomWalk => "random_walk",
            ModelKind::DynamicLinear => "dynamic_linear",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "random_walk" | "rw" => Ok(ModelKind::RandomWalk),
            "dynamic_linear" | "dlm" => Ok(ModelKind::DynamicLinear),
            _ => Err(format!("unknown model kind: {}", s)),
        }
    }
}

/// Model structure settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelConfig {
    #[serde(default)]
    pub kind: ModelKind,

    /// Covariate names (dynamic linear model only).
    #[serde(default)]
    pub covariates: Vec<String>,

    /// Include the `beta_X * x[t-1]` density-dependence term.
    #[serde(default = "default_true")]
    pub autoregressive: bool,

    /// Include the `beta_IC` intercept term.
    #[serde(default = "default_true")]
    pub intercept: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            kind: ModelKind::RandomWalk,
            covariates: Vec::new(),
            autoregressive: true,
            intercept: true,
        }
    }
}

/// Prior hyperparameters passed to the sampler as data.
///
/// `x[1] ~ dnorm(x_ic, tau_ic)`, `tau_obs ~ dgamma(a_obs, r_obs)`,
/// `tau_add ~ dgamma(a_add, r_add)`, `beta_* ~ dnorm(0, beta_precision)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatePriors {
    /// Initial-condition mean, on the fitting (log) scale.
    pub x_ic: f64,
    /// Initial-condition precision.
    pub tau_ic: f64,
    pub a_obs: f64,
    pub r_obs: f64,
    pub a_add: f64,
    pub r_add: f64,
    #[serde(default = "default_beta_precision")]
    pub beta_precision: f64,
}

impl Default for StatePriors {
    fn default() -> Self {
        StatePriors {
            x_ic: 1000f64.ln(),
            tau_ic: 100.0,
            a_obs: 1.0,
            r_obs: 1.0,
            a_add: 1.0,
            r_add: 1.0,
            beta_precision: default_beta_precision(),
        }
    }
}

/// External sampler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SamplerSettings {
    /// Path or name of the JAGS executable.
    #[serde(default = "default_executable")]
    pub executable: String,

    pub n_chains: u32,

    /// Adaptation iterations (discarded by the sampler itself).
    #[serde(default = "default_n_adapt")]
    pub n_adapt: u64,

    /// Iterations discarded after adaptation, before monitoring starts.
    pub burn_in: u64,

    /// Monitored iterations per chain (before thinning).
    pub n_iter: u64,

    #[serde(default = "default_thin")]
    pub thin: u64,

    /// Seed for bootstrap initial values and per-chain sampler seeds.
    pub seed: u64,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Keep the sampler working directory after the run.
    #[serde(default)]
    pub keep_workdir: bool,

    #[serde(default)]
    pub diagnostics: DiagnosticThresholds,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        SamplerSettings {
            executable: default_executable(),
            n_chains: 3,
            n_adapt: default_n_adapt(),
            burn_in: 1000,
            n_iter: 10_000,
            thin: default_thin(),
            seed: 42,
            timeout_secs: None,
            keep_workdir: false,
            diagnostics: DiagnosticThresholds::default(),
        }
    }
}

impl SamplerSettings {
    /// Retained draws per chain after thinning.
    pub fn retained_per_chain(&self) -> u64 {
        if self.thin == 0 {
            return 0;
        }
        self.n_iter / self.thin
    }
}

/// Convergence verdict thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosticThresholds {
    pub max_rhat_warn: f64,
    pub max_rhat_fail: f64,
    /// Minimum effective sample size per monitored scalar.
    pub min_ess_warn: f64,
    pub min_ess_fail: f64,
}

impl Default for DiagnosticThresholds {
    fn default() -> Self {
        DiagnosticThresholds {
            max_rhat_warn: 1.1,
            max_rhat_fail: 1.2,
            min_ess_warn: 400.0,
            min_ess_fail: 100.0,
        }
    }
}

/// Scale transform applied to latent-state draws before quantiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BandTransform {
    Identity,
    /// Inverse of the log transform applied before fitting.
    #[default]
    Exp,
}

/// Credible band settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BandSettings {
    pub lower: f64,
    pub upper: f64,
    #[serde(default)]
    pub transform: BandTransform,
    /// Variable group summarized as the latent state.
    #[serde(default = "default_state_group")]
    pub state_group: String,
}

impl Default for BandSettings {
    fn default() -> Self {
        BandSettings {
            lower: 0.025,
            upper: 0.975,
            transform: BandTransform::Exp,
            state_group: default_state_group(),
        }
    }
}

/// Observations withheld from fitting for forecast evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HoldOutSettings {
    /// Withhold the last N observations.
    #[serde(default)]
    pub last: Option<usize>,

    /// Withhold these 0-based positions.
    #[serde(default)]
    pub indices: Vec<usize>,
}

impl HoldOutSettings {
    pub fn is_empty(&self) -> bool {
        self.last.unwrap_or(0) == 0 && self.indices.is_empty()
    }
}

/// Time series ingest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataSettings {
    /// Value column by header name (default: the second column).
    #[serde(default)]
    pub column: Option<String>,

    /// Fit on the log scale.
    #[serde(default = "default_true")]
    pub log_transform: bool,
}

impl Default for DataSettings {
    fn default() -> Self {
        DataSettings {
            column: None,
            log_transform: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_beta_precision() -> f64 {
    0.001
}

fn default_executable() -> String {
    "jags".to_string()
}

fn default_n_adapt() -> u64 {
    1000
}

fn default_thin() -> u64 {
    1
}

fn default_state_group() -> String {
    "x".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_priors_match_flu_setup() {
        let priors = StatePriors::default();
        assert!((priors.x_ic - 6.907_755_278_982_137).abs() < 1e-12);
        assert_eq!(priors.tau_ic, 100.0);
        assert_eq!(priors.a_obs, 1.0);
        assert_eq!(priors.beta_precision, 0.001);
    }

    #[test]
    fn minimal_json_fills_defaults() {
        let json = r#"{ "schema_version": "1.0.0" }"#;
        let config: FitConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config, FitConfig::default());
    }

    #[test]
    fn model_kind_parses_aliases() {
        assert_eq!("rw".parse::<ModelKind>().unwrap(), ModelKind::RandomWalk);
        assert_eq!("dlm".parse::<ModelKind>().unwrap(), ModelKind::DynamicLinear);
        assert_eq!(
            "dynamic-linear".parse::<ModelKind>().unwrap(),
            ModelKind::DynamicLinear
        );
        assert!("arima".parse::<ModelKind>().is_err());
    }

    #[test]
    fn config_files_accept_cli_spellings() {
        let json = r#"{ "schema_version": "1.0.0", "model": { "kind": "dlm" } }"#;
        let config: FitConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.model.kind, ModelKind::DynamicLinear);

        let toml_text = "schema_version = \"1.0.0\"\n[model]\nkind = \"rw\"\n";
        let config: FitConfig = toml::from_str(toml_text).unwrap();
        assert_eq!(config.model.kind, ModelKind::RandomWalk);

        // Serialized form stays canonical.
        let out = serde_json::to_value(ModelKind::DynamicLinear).unwrap();
        assert_eq!(out, "dynamic_linear");
    }

    #[test]
    fn retained_draws_account_for_thinning() {
        let settings = SamplerSettings {
            n_iter: 10_000,
            thin: 4,
            ..SamplerSettings::default()
        };
        assert_eq!(settings.retained_per_chain(), 2500);
    }

    #[test]
    fn hold_out_emptiness() {
        assert!(HoldOutSettings::default().is_empty());
        assert!(HoldOutSettings {
            last: Some(0),
            indices: vec![]
        }
        .is_empty());
        assert!(!HoldOutSettings {
            last: Some(4),
            indices: vec![]
        }
        .is_empty());
    }
}
