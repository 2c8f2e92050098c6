//! Structured logging for ft-core.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for scripted and agent workflows
//!
//! # Usage
//!
//! ```ignore
//! use ft_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//!
//! let ctx = LogContext::new(generate_run_id());
//! emit(&ctx.info(event_names::RUN_STARTED, Stage::Init, "Starting analysis"));
//! ```
//!
//! stdout is reserved for command payloads (JSON/MD output); all log
//! output goes to stderr.

pub mod config;
pub mod events;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, LogEvent, Stage};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs. A second call
/// is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ft_core={0},ft={0}", config.level)));

    let result = match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Jsonl => {
            let jsonl_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(jsonl_layer)
                .try_init()
        }
    };

    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    // First 12 hex chars are enough to correlate one invocation
    format!("run-{}", &uuid.simple().to_string()[..12])
}

/// Send a prepared [`LogEvent`] through tracing.
///
/// `entity_id` and `fields` are left off the record when there is nothing
/// to report.
pub fn emit(event: &LogEvent) {
    let entity = entity_field(event);
    let fields = fields_field(event);

    macro_rules! at_level {
        ($level:expr) => {
            tracing::event!(
                target: "ft",
                $level,
                event = %event.event,
                run_id = %event.run_id,
                stage = %event.stage,
                entity_id = entity,
                fields = fields.as_deref(),
                "{}",
                event.message
            )
        };
    }

    match event.level {
        Level::Trace => at_level!(tracing::Level::TRACE),
        Level::Debug => at_level!(tracing::Level::DEBUG),
        Level::Info => at_level!(tracing::Level::INFO),
        Level::Warn => at_level!(tracing::Level::WARN),
        Level::Error => at_level!(tracing::Level::ERROR),
    }
}

fn entity_field(event: &LogEvent) -> Option<&str> {
    event.entity_id.as_deref().filter(|id| !id.is_empty())
}

/// Extra fields as one compact JSON object.
fn fields_field(event: &LogEvent) -> Option<String> {
    if event.fields.is_empty() {
        return None;
    }
    let object: serde_json::Map<String, serde_json::Value> =
        event.fields.clone().into_iter().collect();
    Some(serde_json::Value::Object(object).to_string())
}

/// Convenience macro for structured event logging with context.
///
/// Usage:
/// ```ignore
/// log_event!(ctx, INFO, event_names::FETCH_FINISHED, Stage::Fetch, "Fetched events", count = 42);
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(
            event = $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            $($key = $val,)*
            "{}", $msg
        )
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(
            event = $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            $($key = $val,)*
            "{}", $msg
        )
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(
            event = $event,
            run_id = %$ctx.run_id,
            stage = %$stage,
            $($key = $val,)*
            "{}", $msg
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_run_id() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();

        assert!(id1.starts_with("run-"));
        assert_ne!(id1, id2);
        // Format: run-<12 hex chars>
        assert_eq!(id1.len(), 16);
        assert!(id1[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_bare_event_has_no_entity_or_fields() {
        let ctx = LogContext::new("run-test");
        let event = ctx.info(event_names::RUN_FINISHED, Stage::Render, "done");
        assert_eq!(entity_field(&event), None);
        assert_eq!(fields_field(&event), None);

        let blank = event.with_entity("");
        assert_eq!(entity_field(&blank), None);
    }

    #[test]
    fn test_fields_render_as_json_object() {
        let ctx = LogContext::new("run-test");
        let event = ctx
            .debug(event_names::FETCH_FINISHED, Stage::Fetch, "fetched")
            .with_entity("beaver")
            .with_field("count", 42)
            .with_field("source", "events.jsonl");
        assert_eq!(entity_field(&event), Some("beaver"));

        let rendered = fields_field(&event).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["count"], 42);
        assert_eq!(parsed["source"], "events.jsonl");
    }

    #[test]
    fn test_emit_without_subscriber_is_harmless() {
        let ctx = LogContext::new("run-test");
        emit(&ctx.info(event_names::RUN_STARTED, Stage::Init, "start").with_field("n", 3));
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
    }
}
