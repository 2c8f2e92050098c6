//! Raw CI test-run events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One test run reported by a build agent.
///
/// Events are immutable and externally sourced. A run failed iff it carries
/// a failure stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Build agent ("animal") that produced the run.
    pub entity_id: String,
    /// When the run's snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Stage at which the run failed, or `None` for a passing run.
    #[serde(default)]
    pub failure_stage: Option<String>,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub commit: String,
}

/// Pass/fail outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RawEvent {
    pub fn new(entity_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        RawEvent {
            entity_id: entity_id.into(),
            timestamp,
            failure_stage: None,
            branch: String::new(),
            commit: String::new(),
        }
    }

    /// Mark the run as failed at `stage`.
    pub fn failed_at(mut self, stage: impl Into<String>) -> Self {
        self.failure_stage = Some(stage.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = commit.into();
        self
    }

    pub fn outcome(&self) -> Outcome {
        if self.failure_stage.is_some() {
            Outcome::Failed
        } else {
            Outcome::Ok
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome() == Outcome::Failed
    }
}
