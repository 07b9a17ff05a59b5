//! Fuzz target for delimited time series parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ssm_core::data::DataTable;

fuzz_target!(|data: &str| {
    if let Ok(table) = DataTable::parse_delimited(data) {
        if let Ok(series) = table.series(None) {
            assert_eq!(series.labels.len(), series.values.len());
            let _ = series.log();
        }
    }
});
