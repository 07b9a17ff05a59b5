//! Fuzz target for CODA chain file parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ssm_core::samples::coda::parse_chain;

fuzz_target!(|data: &str| {
    let _ = parse_chain(data, "CODAchain1.txt");
});
