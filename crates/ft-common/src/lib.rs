//! Flake triage common types and errors.
//!
//! This crate provides foundational types shared across ft-core modules:
//! - Raw CI events and their outcomes
//! - The fixed period enumeration used for lookback and bucketing
//! - Bucket aggregates and per-entity summaries
//! - Common error types
//! - Output format specifications

pub mod error;
pub mod event;
pub mod output;
pub mod period;
pub mod schema;
pub mod summary;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use event::{Outcome, RawEvent};
pub use output::OutputFormat;
pub use period::Period;
pub use schema::SCHEMA_VERSION;
pub use summary::{BucketAggregate, BucketKey, EntitySummary, RankBy, Verdict};
