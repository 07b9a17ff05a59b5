//! Fuzz target for sampler column names and the group index built from them.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ssm_core::samples::{ColumnName, GroupIndex};

fuzz_target!(|names: Vec<String>| {
    for name in &names {
        let parsed = ColumnName::parse(name);
        let _ = parsed.vector_index();
    }
    // Duplicate indices must come back as errors, never a panic.
    let _ = GroupIndex::build(&names);
});
