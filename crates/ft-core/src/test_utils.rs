//! Shared fixtures for unit tests.

use chrono::{DateTime, TimeZone, Utc};
use ft_common::{BucketAggregate, BucketKey, RawEvent};

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn event(entity: &str, ts: DateTime<Utc>, stage: Option<&str>) -> RawEvent {
    let e = RawEvent::new(entity, ts);
    match stage {
        Some(s) => e.failed_at(s),
        None => e,
    }
}

/// `total` runs of `entity` spread over month `m` of 2025, the first
/// `failures` of them failed.
pub fn month_of_runs(entity: &str, m: u32, total: u64, failures: u64) -> Vec<RawEvent> {
    (0..total)
        .map(|i| {
            let ts = at(2025, m, 1 + (i % 28) as u32, (i % 24) as u32);
            event(entity, ts, (i < failures).then_some("Check"))
        })
        .collect()
}

pub fn aggregate(entity: &str, m: u32, total: u64, failures: u64) -> BucketAggregate {
    BucketAggregate {
        key: BucketKey::new(entity, at(2025, m, 1, 0)),
        total_count: total,
        failure_count: failures,
    }
}
