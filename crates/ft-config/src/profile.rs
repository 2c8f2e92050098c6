//! Built-in configuration profiles.
//!
//! - Interactive: dashboard view, last month, lenient threshold, top 10
//! - Batch: full-history report with a stricter sample threshold

use ft_common::{Period, RankBy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::AnalysisConfig;

/// Available configuration profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileName {
    /// Recent window, more than 10 runs per bucket, top 10 entities
    Interactive,
    /// All history, more than 25 runs per bucket, every entity
    Batch,
}

impl ProfileName {
    pub const ALL: &'static [ProfileName] = &[ProfileName::Interactive, ProfileName::Batch];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileName::Interactive => "interactive",
            ProfileName::Batch => "batch",
        }
    }

    pub fn parse(s: &str) -> Option<ProfileName> {
        match s.to_lowercase().as_str() {
            "interactive" | "dashboard" | "web" => Some(ProfileName::Interactive),
            "batch" | "report" => Some(ProfileName::Batch),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProfileName::Interactive => {
                "Last month, monthly buckets over 10 runs, top 10 by failure rate"
            }
            ProfileName::Batch => "All history, monthly buckets over 25 runs, every entity",
        }
    }

    /// The full configuration this profile stands for.
    pub fn config(&self) -> AnalysisConfig {
        match self {
            ProfileName::Interactive => AnalysisConfig::default(),
            ProfileName::Batch => AnalysisConfig {
                min_samples: 25,
                granularity: Period::Month,
                since: None,
                top_n: None,
                rank_by: RankBy::FailureRate,
                ..AnalysisConfig::default()
            },
        }
    }

    /// Overlay this profile's analysis parameters onto `base`, keeping
    /// fields a profile does not govern (log template).
    pub fn apply(&self, base: &AnalysisConfig) -> AnalysisConfig {
        AnalysisConfig {
            log_url_template: base.log_url_template.clone(),
            ..self.config()
        }
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProfileName {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileName::parse(s).ok_or_else(|| ProfileError::UnknownProfile(s.to_string()))
    }
}

/// Errors related to profile selection.
#[derive(Debug, Clone)]
pub enum ProfileError {
    UnknownProfile(String),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::UnknownProfile(name) => {
                write!(
                    f,
                    "Unknown profile '{}'. Available: {}",
                    name,
                    ProfileName::ALL
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

impl std::error::Error for ProfileError {}
