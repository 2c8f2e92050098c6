//! Bucket drill-down: the individual runs behind one grid cell.

use chrono::{DateTime, Utc};
use ft_common::{Outcome, Period, RawEvent, Result};
use ft_config::AnalysisConfig;
use serde::Serialize;

use crate::source::{EventFilter, EventSource};

/// Display format of a run's snapshot time.
pub const SNAPSHOT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Validated drill-down target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotQuery {
    pub entity_id: String,
    pub bucket_start: DateTime<Utc>,
    pub granularity: Period,
}

impl SnapshotQuery {
    /// Parse a bucket label (`YYYY-MM-DD`) and granularity name.
    pub fn parse(entity_id: &str, bucket: &str, granularity: &str) -> Result<Self> {
        let granularity = granularity.parse::<Period>()?;
        let bucket_start = Period::parse_label(bucket)?;
        Ok(SnapshotQuery {
            entity_id: entity_id.to_string(),
            bucket_start,
            granularity,
        })
    }

    pub fn contains(&self, event: &RawEvent) -> bool {
        event.entity_id == self.entity_id
            && self.granularity.truncate(event.timestamp) == self.bucket_start
    }
}

/// One run inside the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRow {
    pub snapshot: String,
    pub status: Outcome,
    pub branch: String,
    pub commit: String,
    pub failure_stage: Option<String>,
    pub log_link: String,
}

/// All runs of the query's entity that fall in its bucket, oldest first.
///
/// A label that is not a bucket start for the granularity matches nothing.
pub fn list_snapshots<S: EventSource + ?Sized>(
    source: &S,
    query: &SnapshotQuery,
    config: &AnalysisConfig,
) -> Result<Vec<SnapshotRow>> {
    let filter = EventFilter {
        entity: Some(query.entity_id.clone()),
        ..EventFilter::default()
    };
    let mut events: Vec<RawEvent> = source
        .fetch(&filter)?
        .into_iter()
        .filter(|e| query.contains(e))
        .collect();
    events.sort_by_key(|e| e.timestamp);

    Ok(events
        .into_iter()
        .map(|e| {
            let snapshot = e.timestamp.format(SNAPSHOT_FORMAT).to_string();
            SnapshotRow {
                log_link: config.log_link(&e.entity_id, &snapshot),
                status: e.outcome(),
                snapshot,
                branch: e.branch,
                commit: e.commit,
                failure_stage: e.failure_stage,
            }
        })
        .collect())
}
