//! Fuzz target for build-log chunking.
//!
//! Chunks must be sub-slices of the input and tails must stay on UTF-8
//! boundaries.

#![no_main]

use arbitrary::Arbitrary;
use ft_core::logchunk::{chunk_log, tail_chars};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    log: &'a str,
    tail: u16,
}

fuzz_target!(|input: Input<'_>| {
    let chunks = chunk_log(input.log);
    assert!(!chunks.is_empty());
    let total: usize = chunks.iter().map(|c| c.text.len() + c.name.len()).sum();
    assert!(total <= input.log.len());
    for chunk in chunks {
        let tail = tail_chars(chunk.text, input.tail as usize);
        assert!(chunk.text.ends_with(tail));
        assert!(tail.chars().count() <= input.tail as usize);
    }
});
