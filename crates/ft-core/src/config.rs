//! Configuration loading for ft-core.
//!
//! Thin layer over ft-config: resolution, profiles and validation live
//! there; this module folds CLI overrides on top of the resolved file.

pub use ft_config::{
    load_config, AnalysisConfig, ConfigError, ConfigSource, ProfileName, ResolvedConfig,
    ValidationError, CONFIG_SCHEMA_VERSION,
};

use ft_common::{Error, Period, RankBy, Result};

/// Raw, unvalidated analysis overrides as they arrive from the command line.
///
/// Period values stay strings here so that an unknown value surfaces as
/// [`Error::InvalidPeriod`] instead of a parser failure.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub profile: Option<ProfileName>,
    pub since: Option<String>,
    /// Explicitly analyze all history, ignoring any configured lookback.
    pub all_history: bool,
    pub granularity: Option<String>,
    pub min_samples: Option<u64>,
    pub top_n: Option<usize>,
    pub rank_by: Option<RankBy>,
}

impl Overrides {
    /// Apply overrides to `base`: profile first, then individual flags.
    pub fn apply(&self, base: &AnalysisConfig) -> Result<AnalysisConfig> {
        let mut config = match self.profile {
            Some(profile) => profile.apply(base),
            None => base.clone(),
        };

        if let Some(ref since) = self.since {
            config.since = Some(since.parse::<Period>()?);
        }
        if self.all_history {
            config.since = None;
        }
        if let Some(ref granularity) = self.granularity {
            config.granularity = granularity.parse::<Period>()?;
        }
        if let Some(min_samples) = self.min_samples {
            config.min_samples = min_samples;
        }
        if let Some(top_n) = self.top_n {
            if top_n == 0 {
                return Err(Error::InvalidArgument(
                    "--top-n must be at least 1".to_string(),
                ));
            }
            config.top_n = Some(top_n);
        }
        if let Some(rank_by) = self.rank_by {
            config.rank_by = rank_by;
        }

        Ok(config)
    }
}
