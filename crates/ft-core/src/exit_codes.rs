//! Exit codes for the ft-core CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes (clean / anomalies found)
//! - 10-19: User/configuration errors (recoverable by user action)
//! - 20-29: Event source and I/O errors
//! - 30-39: Internal errors (bugs, should be reported)

use ft_common::{Error, ErrorCategory};

/// Exit codes for ft-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-1)
    // ========================================================================
    /// Analysis ran and nothing stood out
    Clean = 0,

    /// At least one entity's rate differs across buckets, or a cell is flagged
    AnomaliesFound = 1,

    // ========================================================================
    // User / Configuration Errors (10-19)
    // ========================================================================
    /// Invalid arguments (including unknown periods and bucket labels)
    ArgsError = 10,

    /// Config file missing, unparsable, or semantically invalid
    ConfigError = 11,

    // ========================================================================
    // Source / I/O Errors (20-29)
    // ========================================================================
    /// Event source failed or returned malformed rows
    SourceError = 20,

    /// I/O error
    IoError = 21,

    // ========================================================================
    // Internal Errors (30-39)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 30,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code is an operational outcome rather than an error.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is a user/configuration error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code indicates any error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::AnomaliesFound => "OK_ANOMALIES",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::SourceError => "ERR_SOURCE",
            ExitCode::IoError => "ERR_IO",
            ExitCode::InternalError => "ERR_INTERNAL",
        }
    }

    /// Outcome code for a finished analysis.
    pub fn from_anomalies(found: bool) -> Self {
        if found {
            ExitCode::AnomaliesFound
        } else {
            ExitCode::Clean
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Input => ExitCode::ArgsError,
            ErrorCategory::Source => ExitCode::SourceError,
            ErrorCategory::Io => ExitCode::IoError,
            ErrorCategory::Analysis => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
