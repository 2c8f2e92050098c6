//! Bucket aggregates and per-entity summaries.
//!
//! All of these are derived per invocation from raw events and never
//! persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::period::Period;

/// Identifies one bucket of one entity.
///
/// Ordering is by entity first, then bucket start ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey {
    pub entity_id: String,
    pub bucket_start: DateTime<Utc>,
}

impl BucketKey {
    pub fn new(entity_id: impl Into<String>, bucket_start: DateTime<Utc>) -> Self {
        BucketKey {
            entity_id: entity_id.into(),
            bucket_start,
        }
    }

    /// Date-string key for this bucket.
    pub fn label(&self) -> String {
        Period::label(self.bucket_start)
    }
}

/// Pass/fail counts for one bucket. `failure_count <= total_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAggregate {
    #[serde(flatten)]
    pub key: BucketKey,
    pub total_count: u64,
    pub failure_count: u64,
}

impl BucketAggregate {
    pub fn entity_id(&self) -> &str {
        &self.key.entity_id
    }

    pub fn bucket_start(&self) -> DateTime<Utc> {
        self.key.bucket_start
    }

    pub fn success_count(&self) -> u64 {
        self.total_count.saturating_sub(self.failure_count)
    }

    /// `failures / total`, or `None` for an empty bucket.
    pub fn failure_rate(&self) -> Option<f64> {
        if self.total_count == 0 {
            return None;
        }
        Some(self.failure_count as f64 / self.total_count as f64)
    }
}

/// Outcome of the homogeneity test at the fixed significance level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// p-value below alpha: the failure rate is not constant over time.
    RatesDiffer,
    /// p-value at or above alpha.
    NoSignificantDifference,
}

impl Verdict {
    /// Map the significance decision to a verdict.
    pub fn from_significance(significant: bool) -> Self {
        if significant {
            Verdict::RatesDiffer
        } else {
            Verdict::NoSignificantDifference
        }
    }

    pub fn differs(&self) -> bool {
        matches!(self, Verdict::RatesDiffer)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::RatesDiffer => write!(f, "rates differ across buckets"),
            Verdict::NoSignificantDifference => write!(f, "no significant difference"),
        }
    }
}

/// Failure statistics for one entity across its retained buckets.
///
/// Only produced when the entity has at least two qualifying buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub entity_id: String,
    pub total_failures: u64,
    pub total_events: u64,
    /// `None` when `total_events == 0`; never reported as zero.
    pub failure_rate: Option<f64>,
    pub bucket_count: usize,
    pub first_event_ts: Option<DateTime<Utc>>,
    pub last_event_ts: Option<DateTime<Utc>>,
    pub chi_square_stat: f64,
    pub degrees_of_freedom: u64,
    pub p_value: f64,
    /// Worst bucket rate minus the overall rate.
    pub spike: Option<f64>,
    pub verdict: Verdict,
}

/// Sort key for ranking entity summaries (always descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    #[default]
    FailureRate,
    Spike,
}

impl RankBy {
    /// The ranking key of `summary`, if defined.
    pub fn key(&self, summary: &EntitySummary) -> Option<f64> {
        match self {
            RankBy::FailureRate => summary.failure_rate,
            RankBy::Spike => summary.spike,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankBy::FailureRate => "failure_rate",
            RankBy::Spike => "spike",
        }
    }
}

impl std::fmt::Display for RankBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RankBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "failure_rate" | "failure-rate" | "rate" => Ok(RankBy::FailureRate),
            "spike" | "spikes" => Ok(RankBy::Spike),
            _ => Err(format!("unknown rank key: {}", s)),
        }
    }
}
