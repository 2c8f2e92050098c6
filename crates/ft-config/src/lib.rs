//! Flake triage configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust struct for config.json ([`AnalysisConfig`])
//! - Built-in profiles (interactive dashboard, batch report)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod analysis;
pub mod profile;
pub mod resolve;
pub mod validate;

pub use analysis::{AnalysisConfig, ConfigError, DEFAULT_LOG_URL_TEMPLATE};
pub use profile::{ProfileError, ProfileName};
pub use resolve::{load_config, resolve_config_path, ConfigSource, ResolvedConfig};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
