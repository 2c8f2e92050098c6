//! Bucketizer: raw events → per-entity, per-period aggregates.

use chrono::{DateTime, Utc};
use ft_common::{BucketAggregate, BucketKey, Period, RawEvent};
use serde::Serialize;
use std::collections::BTreeMap;

/// Group events into one aggregate per (entity, truncated timestamp).
///
/// Only buckets with strictly more than `min_samples` events are kept.
/// Output is sorted by entity, then bucket start ascending.
pub fn bucketize(events: &[RawEvent], granularity: Period, min_samples: u64) -> Vec<BucketAggregate> {
    let mut counts: BTreeMap<BucketKey, (u64, u64)> = BTreeMap::new();
    for event in events {
        let key = BucketKey::new(event.entity_id.clone(), granularity.truncate(event.timestamp));
        let entry = counts.entry(key).or_insert((0, 0));
        entry.0 += 1;
        if event.is_failure() {
            entry.1 += 1;
        }
    }

    counts
        .into_iter()
        .filter(|(_, (total, _))| *total > min_samples)
        .map(|(key, (total_count, failure_count))| BucketAggregate {
            key,
            total_count,
            failure_count,
        })
        .collect()
}

/// Split sorted aggregates per entity, preserving bucket order.
pub fn group_by_entity(aggregates: Vec<BucketAggregate>) -> BTreeMap<String, Vec<BucketAggregate>> {
    let mut grouped: BTreeMap<String, Vec<BucketAggregate>> = BTreeMap::new();
    for agg in aggregates {
        grouped.entry(agg.key.entity_id.clone()).or_default().push(agg);
    }
    grouped
}

/// First and last event time of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventSpan {
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
}

impl EventSpan {
    fn widen(&mut self, ts: DateTime<Utc>) {
        if ts < self.first {
            self.first = ts;
        }
        if ts > self.last {
            self.last = ts;
        }
    }
}

/// Event spans over every event given, including those whose buckets fall
/// under the sample threshold.
pub fn event_spans(events: &[RawEvent]) -> BTreeMap<String, EventSpan> {
    let mut spans: BTreeMap<String, EventSpan> = BTreeMap::new();
    for event in events {
        spans
            .entry(event.entity_id.clone())
            .and_modify(|span| span.widen(event.timestamp))
            .or_insert(EventSpan {
                first: event.timestamp,
                last: event.timestamp,
            });
    }
    spans
}
