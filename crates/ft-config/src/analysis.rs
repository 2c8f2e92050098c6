//! Analysis configuration (config.json).

use ft_common::{Period, RankBy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validate::ValidationError;

/// Default log link, filled with the entity id and the snapshot timestamp.
pub const DEFAULT_LOG_URL_TEMPLATE: &str =
    "https://buildfarm.postgresql.org/cgi-bin/show_log.pl?nm={entity}&dt={timestamp}";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid period '{value}' for {field} in {path}: must be one of {allowed}", allowed = Period::allowed())]
    InvalidPeriod {
        path: PathBuf,
        field: &'static str,
        value: String,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Tunable parameters of one analysis run.
///
/// Every field has a default, so a config file only needs the keys it
/// changes. CLI flags override whatever the file resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub schema_version: String,

    /// Buckets need strictly more events than this to be retained.
    pub min_samples: u64,

    /// Bucket width.
    pub granularity: Period,

    /// Lookback window ending at "now". `None` analyzes all history.
    pub since: Option<Period>,

    /// Keep only the first N ranked entities.
    pub top_n: Option<usize>,

    pub rank_by: RankBy,

    /// Template for per-run log links; `{entity}` and `{timestamp}` are
    /// substituted.
    pub log_url_template: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            min_samples: 10,
            granularity: Period::Month,
            since: Some(Period::Month),
            top_n: Some(10),
            rank_by: RankBy::FailureRate,
            log_url_template: DEFAULT_LOG_URL_TEMPLATE.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Load and parse a config file without semantic validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let parse_error = |e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        };
        let value: serde_json::Value = serde_json::from_str(&content).map_err(parse_error)?;
        check_periods(path, &value)?;
        serde_json::from_value(value).map_err(parse_error)
    }

    /// Render the log link for one run.
    ///
    /// Spaces in the snapshot are encoded as `%20`.
    pub fn log_link(&self, entity_id: &str, snapshot: &str) -> String {
        self.log_url_template
            .replace("{entity}", entity_id)
            .replace("{timestamp}", &snapshot.replace(' ', "%20"))
    }
}

/// Period fields must name a known period; anything else is an invalid
/// period rather than malformed JSON.
fn check_periods(path: &Path, value: &serde_json::Value) -> Result<(), ConfigError> {
    for field in ["granularity", "since"] {
        let Some(name) = value.get(field).and_then(|v| v.as_str()) else {
            continue;
        };
        if !Period::ALL.iter().any(|p| p.as_str() == name) {
            return Err(ConfigError::InvalidPeriod {
                path: path.to_path_buf(),
                field,
                value: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_interactive_dashboard() {
        let config = AnalysisConfig::default();
        assert_eq!(config.min_samples, 10);
        assert_eq!(config.granularity, Period::Month);
        assert_eq!(config.since, Some(Period::Month));
        assert_eq!(config.top_n, Some(10));
        assert_eq!(config.rank_by, RankBy::FailureRate);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"min_samples": 25, "granularity": "week", "since": null}}"#).unwrap();

        let config = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(config.min_samples, 25);
        assert_eq!(config.granularity, Period::Week);
        assert_eq!(config.since, None);
        assert_eq!(config.top_n, Some(10));
    }

    #[test]
    fn test_missing_file() {
        let err = AnalysisConfig::from_file(Path::new("/nonexistent/ft/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_unknown_granularity_is_invalid_period() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"granularity": "fortnight"}}"#).unwrap();

        let err = AnalysisConfig::from_file(file.path()).unwrap_err();
        match &err {
            ConfigError::InvalidPeriod { field, value, .. } => {
                assert_eq!(*field, "granularity");
                assert_eq!(value, "fortnight");
            }
            other => panic!("expected InvalidPeriod, got {other:?}"),
        }
        assert!(err.to_string().contains("day, week, month, year"));
    }

    #[test]
    fn test_unknown_lookback_is_invalid_period() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"since": "fortnight"}}"#).unwrap();

        let err = AnalysisConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPeriod { field: "since", .. }));
    }

    #[test]
    fn test_wrong_type_is_still_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"granularity": 7}}"#).unwrap();

        let err = AnalysisConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_log_link_encodes_spaces() {
        let config = AnalysisConfig::default();
        let link = config.log_link("beaver", "2025-03-01 12:30:00");
        assert_eq!(
            link,
            "https://buildfarm.postgresql.org/cgi-bin/show_log.pl?nm=beaver&dt=2025-03-01%2012:30:00"
        );
    }
}
