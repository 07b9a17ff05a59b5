//! Fit configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the fit configuration (priors, sampler, bands, hold-out)
//! - Named presets for common run lengths
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation with field paths
//! - Config snapshots for fit reproducibility

pub mod fit;
pub mod load;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use fit::{
    BandSettings, BandTransform, DataSettings, DiagnosticThresholds, FitConfig, HoldOutSettings,
    ModelConfig, ModelKind, SamplerSettings, StatePriors,
};
pub use load::{load_fit_config, parse_fit_config, ConfigFormat};
pub use preset::{get_preset, PresetError, PresetName};
pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_fit_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
