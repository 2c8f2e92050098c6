//! Event sources.
//!
//! The engine never talks to storage directly: it asks an [`EventSource`]
//! for the rows matching an [`EventFilter`]. Two sources ship here, an
//! in-memory one for library callers and tests, and a JSON-lines file
//! reader used by the CLI.

use chrono::{DateTime, Utc};
use ft_common::{Error, Period, RawEvent, Result};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Which events to fetch.
///
/// Built only from validated values: the lookback is already a [`Period`]
/// and `not_before` is resolved against the caller's "now".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub entity: Option<String>,
    pub since: Option<Period>,
    /// Earliest timestamp kept (inclusive).
    pub not_before: Option<DateTime<Utc>>,
}

impl EventFilter {
    /// Filter for `entity` (or all) over the `since` window ending at `now`.
    pub fn new(entity: Option<String>, since: Option<Period>, now: DateTime<Utc>) -> Result<Self> {
        let not_before = match since {
            Some(period) => Some(period.lookback_start(now).ok_or_else(|| {
                Error::InvalidArgument(format!("lookback of one {} from {} is out of range", period, now))
            })?),
            None => None,
        };
        Ok(EventFilter {
            entity,
            since,
            not_before,
        })
    }

    pub fn matches(&self, event: &RawEvent) -> bool {
        if let Some(ref entity) = self.entity {
            if &event.entity_id != entity {
                return false;
            }
        }
        if let Some(cutoff) = self.not_before {
            if event.timestamp < cutoff {
                return false;
            }
        }
        true
    }
}

/// Supplier of raw events.
///
/// Fetch failures propagate to the caller unchanged; sources do not retry.
pub trait EventSource {
    fn fetch(&self, filter: &EventFilter) -> Result<Vec<RawEvent>>;
}

/// Vector-backed source.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource {
    events: Vec<RawEvent>,
}

impl MemoryEventSource {
    pub fn new(events: Vec<RawEvent>) -> Self {
        MemoryEventSource { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSource for MemoryEventSource {
    fn fetch(&self, filter: &EventFilter) -> Result<Vec<RawEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }
}

/// Reads one JSON [`RawEvent`] per line.
///
/// The file is re-read on every fetch. Blank lines are skipped.
#[derive(Debug, Clone)]
pub struct JsonlEventSource {
    path: PathBuf,
}

impl JsonlEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlEventSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse JSON-lines event text, keeping events that match `filter`.
///
/// Line numbers in errors are 1-based.
pub fn parse_jsonl<R: BufRead>(reader: R, filter: &EventFilter) -> Result<Vec<RawEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => Error::MalformedEvent {
                line: idx + 1,
                message: e.to_string(),
            },
            _ => Error::Io(e),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event: RawEvent =
            serde_json::from_str(trimmed).map_err(|e| Error::MalformedEvent {
                line: idx + 1,
                message: e.to_string(),
            })?;
        if filter.matches(&event) {
            events.push(event);
        }
    }
    Ok(events)
}

impl EventSource for JsonlEventSource {
    fn fetch(&self, filter: &EventFilter) -> Result<Vec<RawEvent>> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            Error::Source(format!("cannot open {}: {}", self.path.display(), e))
        })?;
        parse_jsonl(BufReader::new(file), filter)
    }
}
