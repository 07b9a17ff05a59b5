//! Fuzz target for CODA index parsing.
//!
//! `parse_index` must reject malformed lines with an error, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ssm_core::samples::coda::parse_index;

fuzz_target!(|data: &str| {
    if let Ok(entries) = parse_index(data, "CODAindex.txt") {
        for entry in entries {
            assert!(entry.first >= 1 && entry.last >= entry.first);
        }
    }
});
