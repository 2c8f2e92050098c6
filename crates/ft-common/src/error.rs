//! Error types for flake triage.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Invalid Period
//!   Reason: invalid period 'fortnight': must be one of day, week, month, year
//!   Fix: Use one of: day, week, month, year.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 10,
//!   "category": "input",
//!   "message": "invalid period 'fortnight': must be one of day, week, month, year",
//!   "recoverable": true,
//!   "context": { "value": "fortnight" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for flake triage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Caller-supplied parameters (periods, bucket labels, arguments).
    Input,
    /// Event source failures (fetch, malformed rows).
    Source,
    /// Statistical analysis errors.
    Analysis,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Source => write!(f, "source"),
            ErrorCategory::Analysis => write!(f, "analysis"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for flake triage.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (10-19)
    #[error("invalid period '{value}': must be one of day, week, month, year")]
    InvalidPeriod { value: String },

    #[error("invalid bucket '{value}': expected YYYY-MM-DD")]
    InvalidBucket { value: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // Source errors (20-29)
    #[error("event source failed: {0}")]
    Source(String),

    #[error("malformed event on line {line}: {message}")]
    MalformedEvent { line: usize, message: String },

    // Analysis errors (30-39)
    #[error("insufficient data for {entity_id}: {buckets} qualifying bucket(s), need at least 2")]
    InsufficientData { entity_id: String, buckets: usize },

    #[error("numerical instability detected: {0}")]
    NumericalInstability(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Input errors
    /// - 20-29: Source errors
    /// - 30-39: Analysis errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidPeriod { .. } => 10,
            Error::InvalidBucket { .. } => 11,
            Error::InvalidArgument(_) => 12,
            Error::Source(_) => 20,
            Error::MalformedEvent { .. } => 21,
            Error::InsufficientData { .. } => 30,
            Error::NumericalInstability(_) => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidPeriod { .. } | Error::InvalidBucket { .. } | Error::InvalidArgument(_) => {
                ErrorCategory::Input
            }
            Error::Source(_) | Error::MalformedEvent { .. } => ErrorCategory::Source,
            Error::InsufficientData { .. } | Error::NumericalInstability(_) => {
                ErrorCategory::Analysis
            }
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Input: fix the argument and rerun
            Error::InvalidPeriod { .. } => true,
            Error::InvalidBucket { .. } => true,
            Error::InvalidArgument(_) => true,

            Error::Source(_) => true,
            Error::MalformedEvent { .. } => false, // Data must be repaired upstream

            // More data or a lower threshold may qualify the entity
            Error::InsufficientData { .. } => true,
            Error::NumericalInstability(_) => false,

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::InvalidPeriod { .. } => "Use one of: day, week, month, year.",
            Error::InvalidBucket { .. } => {
                "Pass the bucket label exactly as shown in the grid, e.g. 2025-03-01."
            }
            Error::InvalidArgument(_) => "Check the command line with 'ft-core --help'.",

            Error::Source(_) => {
                "Check that the events file exists and is readable. Upstream failures are not retried."
            }
            Error::MalformedEvent { .. } => {
                "Each line must be one JSON object with entity_id, timestamp and failure_stage."
            }

            Error::InsufficientData { .. } => {
                "Widen the lookback window, use a finer granularity, or lower --min-samples."
            }
            Error::NumericalInstability(_) => {
                "Internal numerical issue. Report it with the events file that triggered it."
            }

            Error::Io(_) => "Check paths, permissions and disk space, then retry.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq .' or regenerate the file.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::InvalidPeriod { .. } => "Invalid Period",
            Error::InvalidBucket { .. } => "Invalid Bucket",
            Error::InvalidArgument(_) => "Invalid Argument",
            Error::Source(_) => "Event Source Error",
            Error::MalformedEvent { .. } => "Malformed Event",
            Error::InsufficientData { .. } => "Insufficient Data",
            Error::NumericalInstability(_) => "Numerical Instability",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }

    /// True for errors caused by caller input rather than data or environment.
    pub fn is_user_input(&self) -> bool {
        self.category() == ErrorCategory::Input
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., offending value, line).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidPeriod { value } | Error::InvalidBucket { value } => {
                context.insert("value".to_string(), serde_json::json!(value));
            }
            Error::MalformedEvent { line, .. } => {
                context.insert("line".to_string(), serde_json::json!(line));
            }
            Error::InsufficientData { entity_id, buckets } => {
                context.insert("entity_id".to_string(), serde_json::json!(entity_id));
                context.insert("buckets".to_string(), serde_json::json!(buckets));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
