//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::analysis::AnalysisConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate an analysis configuration semantically.
pub fn validate_config(config: &AnalysisConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.top_n == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: "top_n".to_string(),
            message: "must be at least 1 when set".to_string(),
        });
    }

    if !config.log_url_template.contains("{entity}") {
        return Err(ValidationError::InvalidValue {
            field: "log_url_template".to_string(),
            message: "must contain the {entity} placeholder".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&AnalysisConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let config = AnalysisConfig {
            top_n: Some(0),
            ..AnalysisConfig::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "top_n"));
        assert_eq!(err.code(), 65);
    }

    #[test]
    fn test_template_without_entity_rejected() {
        let config = AnalysisConfig {
            log_url_template: "https://ci.example/logs".to_string(),
            ..AnalysisConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_version_mismatch() {
        let config = AnalysisConfig {
            schema_version: "0.9.0".to_string(),
            ..AnalysisConfig::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ValidationError::VersionMismatch { .. }));
        assert_eq!(err.code(), 66);
    }

    #[test]
    fn test_zero_min_samples_allowed() {
        let config = AnalysisConfig {
            min_samples: 0,
            ..AnalysisConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}
