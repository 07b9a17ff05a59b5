//! Fuzz target for assembling a sample matrix from CODA text.
//!
//! An index and up to three chains are generated independently, so line
//! ranges, chain lengths and column names disagree in every possible way.
//! Whatever is accepted must summarize without panicking.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ssm_core::samples::from_coda_text;
use ssm_core::summary::{credible_band, extract_group, Transform};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    index: &'a str,
    chains: Vec<&'a str>,
}

fuzz_target!(|input: Input<'_>| {
    let chains: Vec<&str> = input.chains.into_iter().take(3).collect();
    let Ok(samples) = from_coda_text(input.index, &chains) else {
        return;
    };
    for group in samples.groups().names() {
        if let Ok(g) = extract_group(&samples, group) {
            let _ = credible_band(g.columns(), (0.025, 0.975), Transform::Identity);
        }
    }
});
