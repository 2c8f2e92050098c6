//! Fuzz target for config.json parsing.
//!
//! Tests that analysis configuration parsing and validation handle
//! arbitrary input without panicking.

#![no_main]

use ft_config::{validate_config, AnalysisConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<AnalysisConfig>(data) {
        let _ = validate_config(&config);
        let _ = config.log_link("beaver", "2025-03-01 00:00:00");
    }
});
