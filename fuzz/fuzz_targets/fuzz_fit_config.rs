//! Fuzz target for fit configuration parsing.
//!
//! Both file formats must fail with a validation error on bad input, never
//! panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ssm_config::{parse_fit_config, ConfigFormat};

fuzz_target!(|data: &str| {
    let _ = parse_fit_config(data, ConfigFormat::Json);
    let _ = parse_fit_config(data, ConfigFormat::Toml);
});
