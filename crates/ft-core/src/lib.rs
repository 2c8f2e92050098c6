//! Flake Triage Core Library
//!
//! This library provides the core functionality for flake triage:
//! - Event sources (in-memory, JSON lines)
//! - Bucketing, chi-square homogeneity analysis, ranking
//! - Per-cell binomial significance grid
//! - Bucket drill-down and build-log chunking
//! - Exit codes, logging, and output rendering for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod analysis;
pub mod config;
pub mod exit_codes;
pub mod logchunk;
pub mod logging;
pub mod output;
pub mod snapshots;
pub mod source;

#[cfg(test)]
pub(crate) mod test_utils;
