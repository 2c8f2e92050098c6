//! Fuzz target for JSON-lines event parsing.
//!
//! Arbitrary bytes must either parse into events or produce a line-numbered
//! error; bucketing whatever parses must never panic.

#![no_main]

use ft_common::Period;
use ft_core::analysis::bucketize;
use ft_core::source::{parse_jsonl, EventFilter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(events) = parse_jsonl(data, &EventFilter::default()) else {
        return;
    };
    for granularity in Period::ALL {
        for agg in bucketize(&events, *granularity, 0) {
            assert!(agg.failure_count <= agg.total_count);
        }
    }
});
