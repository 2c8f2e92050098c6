//! Log level and format selection.
//!
//! Precedence, lowest first: built-in defaults, `FT_LOG` (or a bare level
//! in `RUST_LOG`), `FT_LOG_FORMAT`, then the `-v`/`-q`/`--format` flags.
//! A full `RUST_LOG` directive replaces the filter in [`super::init_logging`].

use std::fmt;
use std::str::FromStr;

pub const ENV_LOG_LEVEL: &str = "FT_LOG";
pub const ENV_LOG_FORMAT: &str = "FT_LOG_FORMAT";

/// Where diagnostics go on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("log format must be human or jsonl, got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogConfig {
    /// Read the environment, then apply the CLI flags on top.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        let ft_log = std::env::var(ENV_LOG_LEVEL).ok();
        let rust_log = std::env::var("RUST_LOG").ok();
        let ft_log_format = std::env::var(ENV_LOG_FORMAT).ok();
        Self::resolve(
            ft_log.as_deref().or(rust_log.as_deref()),
            ft_log_format.as_deref(),
            cli_level,
            cli_format,
        )
    }

    /// Unparseable environment values are ignored.
    fn resolve(
        env_level: Option<&str>,
        env_format: Option<&str>,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let level = cli_level
            .or_else(|| env_level.and_then(|v| v.parse().ok()))
            .unwrap_or_default();
        let format = cli_format
            .or_else(|| env_format.and_then(|v| v.parse().ok()))
            .unwrap_or_default();
        LogConfig { format, level }
    }
}
