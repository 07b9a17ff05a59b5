//! Configuration presets for common run lengths.
//!
//! Provides pre-built configurations for:
//! - Teaching: the notebook's 3 chains, 1000 burn-in, 10000 monitored iterations
//! - Quick: short smoke-test runs, 2 chains
//! - Thorough: long runs with thinning for publication-quality bands

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fit::{DiagnosticThresholds, FitConfig, SamplerSettings};

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Teaching,
    Quick,
    Thorough,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] =
        &[PresetName::Teaching, PresetName::Quick, PresetName::Thorough];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Teaching => "teaching",
            PresetName::Quick => "quick",
            PresetName::Thorough => "thorough",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "teaching" | "default" | "notebook" => Some(PresetName::Teaching),
            "quick" | "smoke" | "fast" => Some(PresetName::Quick),
            "thorough" | "long" | "publication" => Some(PresetName::Thorough),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Teaching => "3 chains, 1000 burn-in, 10000 monitored iterations",
            PresetName::Quick => "2 chains, 500 burn-in, 2000 monitored iterations; loose gates",
            PresetName::Thorough => "4 chains, 5000 burn-in, 50000 iterations thinned by 5",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone)]
pub enum PresetError {
    /// Unknown preset name.
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => {
                write!(
                    f,
                    "Unknown preset '{}'. Available: {}",
                    name,
                    PresetName::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

impl std::error::Error for PresetError {}

/// Build the configuration for a preset.
pub fn get_preset(name: PresetName) -> FitConfig {
    let mut config = FitConfig {
        description: Some(format!("{} preset: {}", name, name.description())),
        ..FitConfig::default()
    };

    match name {
        PresetName::Teaching => {}
        PresetName::Quick => {
            config.sampler = SamplerSettings {
                n_chains: 2,
                n_adapt: 500,
                burn_in: 500,
                n_iter: 2000,
                diagnostics: DiagnosticThresholds {
                    max_rhat_warn: 1.2,
                    max_rhat_fail: 1.5,
                    min_ess_warn: 100.0,
                    min_ess_fail: 20.0,
                },
                ..SamplerSettings::default()
            };
        }
        PresetName::Thorough => {
            config.sampler = SamplerSettings {
                n_chains: 4,
                n_adapt: 2000,
                burn_in: 5000,
                n_iter: 50_000,
                thin: 5,
                diagnostics: DiagnosticThresholds {
                    max_rhat_warn: 1.05,
                    max_rhat_fail: 1.1,
                    min_ess_warn: 1000.0,
                    min_ess_fail: 400.0,
                },
                ..SamplerSettings::default()
            };
        }
    }

    config
}
