//! The triage engine.
//!
//! Data flow: events → [`bucket`] → aggregates → [`significance`] →
//! per-entity summaries → [`rank`] → ordered summaries → [`grid`] → grid.
//!
//! Every stage is a pure function over its inputs; [`pipeline`] wires
//! them to an event source for one invocation.

pub mod bucket;
pub mod grid;
pub mod pipeline;
pub mod rank;
pub mod significance;

pub use bucket::{bucketize, event_spans, group_by_entity, EventSpan};
pub use grid::{build_grid, format_rate, Grid, GridCell};
pub use pipeline::{
    entity_detail, run_analysis, AnalysisParams, AnalysisReport, AnalysisRequest, BucketDetail,
    EntityDetail,
};
pub use rank::rank;
pub use significance::analyze_entity;
