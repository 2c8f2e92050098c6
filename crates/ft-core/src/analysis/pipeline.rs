//! One invocation of the engine: fetch → bucket → analyze → rank → grid.
//!
//! Parameters are validated before the event source is touched, so an
//! unknown period never reaches storage.

use chrono::{DateTime, Utc};
use ft_common::{EntitySummary, Error, Period, RankBy, Result};
use ft_config::AnalysisConfig;
use serde::Serialize;

use super::bucket::{bucketize, event_spans, group_by_entity};
use super::grid::{build_grid, Grid};
use super::rank::rank;
use super::significance::analyze_entity;
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::source::{EventFilter, EventSource};

/// Validated analysis parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisParams {
    pub entity: Option<String>,
    pub since: Option<Period>,
    pub granularity: Period,
    /// Buckets need strictly more events than this.
    pub min_samples: u64,
    pub rank_by: RankBy,
    pub top_n: Option<usize>,
}

impl AnalysisParams {
    pub fn from_config(config: &AnalysisConfig, entity: Option<String>) -> Self {
        AnalysisParams {
            entity,
            since: config.since,
            granularity: config.granularity,
            min_samples: config.min_samples,
            rank_by: config.rank_by,
            top_n: config.top_n,
        }
    }
}

/// Unvalidated request as a library caller (e.g. a web handler) receives it.
#[derive(Debug, Clone)]
pub struct AnalysisRequest<'a> {
    pub entity: Option<&'a str>,
    pub since: Option<&'a str>,
    pub granularity: &'a str,
    pub min_samples: u64,
    pub rank_by: RankBy,
    pub top_n: Option<usize>,
}

impl AnalysisRequest<'_> {
    /// Check periods and limits; [`Error::InvalidPeriod`] for unknown periods.
    pub fn validate(&self) -> Result<AnalysisParams> {
        let since = self.since.map(str::parse::<Period>).transpose()?;
        let granularity = self.granularity.parse::<Period>()?;
        if self.top_n == Some(0) {
            return Err(Error::InvalidArgument("top_n must be at least 1".to_string()));
        }
        Ok(AnalysisParams {
            entity: self.entity.map(str::to_string),
            since,
            granularity,
            min_samples: self.min_samples,
            rank_by: self.rank_by,
            top_n: self.top_n,
        })
    }

    /// Validate, then run against `source`.
    pub fn run<S: EventSource + ?Sized>(
        &self,
        source: &S,
        now: DateTime<Utc>,
        ctx: &LogContext,
    ) -> Result<AnalysisReport> {
        let params = self.validate()?;
        run_analysis(source, &params, now, ctx)
    }
}

/// Everything one analysis run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub parameters: AnalysisParams,
    /// Anchor for the lookback window.
    pub now: DateTime<Utc>,
    pub events_fetched: usize,
    /// Ranked and truncated summaries.
    pub summaries: Vec<EntitySummary>,
    /// Entities with fewer than two qualifying buckets.
    pub skipped: Vec<String>,
    pub grid: Grid,
}

impl AnalysisReport {
    /// True when any ranked entity's rates differ or any cell is flagged.
    pub fn anomalies_found(&self) -> bool {
        self.summaries.iter().any(|s| s.verdict.differs()) || self.grid.flagged_count() > 0
    }
}

/// Run the full pipeline once.
pub fn run_analysis<S: EventSource + ?Sized>(
    source: &S,
    params: &AnalysisParams,
    now: DateTime<Utc>,
    ctx: &LogContext,
) -> Result<AnalysisReport> {
    let filter = EventFilter::new(params.entity.clone(), params.since, now)?;

    log_event!(ctx, DEBUG, event_names::FETCH_STARTED, Stage::Fetch, "Fetching events");
    let events = source.fetch(&filter)?;
    log_event!(
        ctx,
        INFO,
        event_names::FETCH_FINISHED,
        Stage::Fetch,
        "Fetched events",
        count = events.len()
    );

    let spans = event_spans(&events);
    let aggregates = bucketize(&events, params.granularity, params.min_samples);
    log_event!(
        ctx,
        DEBUG,
        event_names::BUCKET_FINISHED,
        Stage::Bucket,
        "Bucketed events",
        buckets = aggregates.len(),
        entities = spans.len()
    );
    let by_entity = group_by_entity(aggregates);

    let mut summaries = Vec::new();
    let mut skipped = Vec::new();
    for entity_id in spans.keys() {
        let buckets = by_entity.get(entity_id).map(Vec::as_slice).unwrap_or(&[]);
        match analyze_entity(entity_id, buckets, spans.get(entity_id).copied()) {
            Ok(summary) => summaries.push(summary),
            Err(Error::InsufficientData { buckets, .. }) => {
                log_event!(
                    ctx,
                    DEBUG,
                    event_names::ANALYZE_ENTITY_SKIPPED,
                    Stage::Analyze,
                    "Skipping entity with fewer than two qualifying buckets",
                    entity_id = entity_id.as_str(),
                    buckets = buckets
                );
                skipped.push(entity_id.clone());
            }
            Err(e) => return Err(e),
        }
    }
    log_event!(
        ctx,
        INFO,
        event_names::ANALYZE_FINISHED,
        Stage::Analyze,
        "Analyzed entities",
        analyzed = summaries.len(),
        skipped = skipped.len()
    );

    let summaries = rank(summaries, params.rank_by, params.top_n);
    log_event!(
        ctx,
        DEBUG,
        event_names::RANK_FINISHED,
        Stage::Rank,
        "Ranked entities",
        kept = summaries.len(),
        rank_by = params.rank_by.as_str()
    );

    let grid = build_grid(&summaries, &by_entity)?;
    log_event!(
        ctx,
        DEBUG,
        event_names::GRID_FINISHED,
        Stage::Grid,
        "Built significance grid",
        buckets = grid.buckets.len(),
        flagged = grid.flagged_count()
    );

    Ok(AnalysisReport {
        parameters: params.clone(),
        now,
        events_fetched: events.len(),
        summaries,
        skipped,
        grid,
    })
}

/// One retained bucket of a single entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketDetail {
    pub bucket: String,
    pub failures: u64,
    pub total: u64,
    pub failure_rate: Option<f64>,
}

/// Drill-down for a single entity.
#[derive(Debug, Clone, Serialize)]
pub struct EntityDetail {
    pub entity_id: String,
    pub parameters: AnalysisParams,
    pub events_fetched: usize,
    /// `None` when the entity has fewer than two qualifying buckets.
    pub summary: Option<EntitySummary>,
    /// Retained buckets, ascending.
    pub buckets: Vec<BucketDetail>,
}

impl EntityDetail {
    pub fn insufficient_data(&self) -> bool {
        self.summary.is_none()
    }
}

/// Summary plus per-bucket breakdown for `entity_id`.
///
/// An entity without enough buckets is a clean outcome with no summary.
pub fn entity_detail<S: EventSource + ?Sized>(
    source: &S,
    entity_id: &str,
    params: &AnalysisParams,
    now: DateTime<Utc>,
    ctx: &LogContext,
) -> Result<EntityDetail> {
    let params = AnalysisParams {
        entity: Some(entity_id.to_string()),
        top_n: None,
        ..params.clone()
    };
    let filter = EventFilter::new(params.entity.clone(), params.since, now)?;
    let events = source.fetch(&filter)?;
    log_event!(
        ctx,
        INFO,
        event_names::FETCH_FINISHED,
        Stage::Fetch,
        "Fetched events",
        count = events.len(),
        entity_id = entity_id
    );

    let span = event_spans(&events).get(entity_id).copied();
    let aggregates = bucketize(&events, params.granularity, params.min_samples);

    let summary = match analyze_entity(entity_id, &aggregates, span) {
        Ok(summary) => Some(summary),
        Err(Error::InsufficientData { buckets, .. }) => {
            log_event!(
                ctx,
                DEBUG,
                event_names::ANALYZE_ENTITY_SKIPPED,
                Stage::Analyze,
                "Entity has fewer than two qualifying buckets",
                entity_id = entity_id,
                buckets = buckets
            );
            None
        }
        Err(e) => return Err(e),
    };

    let buckets = aggregates
        .iter()
        .map(|agg| BucketDetail {
            bucket: agg.key.label(),
            failures: agg.failure_count,
            total: agg.total_count,
            failure_rate: agg.failure_rate(),
        })
        .collect();

    Ok(EntityDetail {
        entity_id: entity_id.to_string(),
        parameters: params,
        events_fetched: events.len(),
        summary,
        buckets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryEventSource;
    use crate::test_utils::{at, month_of_runs};
    use ft_common::{RawEvent, Verdict};
    use std::cell::Cell;

    struct CountingSource {
        inner: MemoryEventSource,
        fetches: Cell<usize>,
    }

    impl EventSource for CountingSource {
        fn fetch(&self, filter: &EventFilter) -> Result<Vec<RawEvent>> {
            self.fetches.set(self.fetches.get() + 1);
            self.inner.fetch(filter)
        }
    }

    struct FailingSource;

    impl EventSource for FailingSource {
        fn fetch(&self, _filter: &EventFilter) -> Result<Vec<RawEvent>> {
            Err(Error::Source("connection refused".to_string()))
        }
    }

    fn fleet() -> Vec<RawEvent> {
        let mut events = Vec::new();
        events.extend(month_of_runs("beaver", 1, 50, 5));
        events.extend(month_of_runs("beaver", 2, 50, 5));
        events.extend(month_of_runs("beaver", 3, 50, 40));
        events.extend(month_of_runs("crake", 1, 40, 4));
        events.extend(month_of_runs("crake", 2, 40, 4));
        // Only one qualifying month
        events.extend(month_of_runs("loner", 3, 60, 30));
        events.extend(month_of_runs("loner", 2, 5, 0));
        events
    }

    fn params() -> AnalysisParams {
        AnalysisParams {
            entity: None,
            since: None,
            granularity: Period::Month,
            min_samples: 10,
            rank_by: RankBy::FailureRate,
            top_n: None,
        }
    }

    fn ctx() -> LogContext {
        LogContext::new("run-test")
    }

    #[test]
    fn test_full_pipeline() {
        let source = MemoryEventSource::new(fleet());
        let report = run_analysis(&source, &params(), at(2025, 4, 1, 0), &ctx()).unwrap();

        let ids: Vec<&str> = report.summaries.iter().map(|s| s.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["beaver", "crake"]);
        assert_eq!(report.skipped, vec!["loner"]);
        assert_eq!(report.summaries[0].verdict, Verdict::RatesDiffer);
        assert!(report.anomalies_found());
        assert_eq!(report.events_fetched, 295);
    }

    #[test]
    fn test_single_bucket_entity_absent_from_summary_and_grid() {
        let source = MemoryEventSource::new(fleet());
        let report = run_analysis(&source, &params(), at(2025, 4, 1, 0), &ctx()).unwrap();
        assert!(report.summaries.iter().all(|s| s.entity_id != "loner"));
        assert!(!report.grid.entities.contains(&"loner".to_string()));
        assert!(!report.grid.cells.contains_key("loner"));
    }

    #[test]
    fn test_fortnight_rejected_before_fetch() {
        let source = CountingSource {
            inner: MemoryEventSource::new(fleet()),
            fetches: Cell::new(0),
        };
        let request = AnalysisRequest {
            entity: None,
            since: Some("fortnight"),
            granularity: "month",
            min_samples: 10,
            rank_by: RankBy::FailureRate,
            top_n: None,
        };
        let err = request.run(&source, at(2025, 4, 1, 0), &ctx()).unwrap_err();
        assert!(matches!(err, Error::InvalidPeriod { ref value } if value == "fortnight"));
        assert_eq!(source.fetches.get(), 0);
    }

    #[test]
    fn test_valid_request_fetches_once() {
        let source = CountingSource {
            inner: MemoryEventSource::new(fleet()),
            fetches: Cell::new(0),
        };
        let request = AnalysisRequest {
            entity: Some("beaver"),
            since: Some("year"),
            granularity: "month",
            min_samples: 10,
            rank_by: RankBy::Spike,
            top_n: Some(1),
        };
        let report = request.run(&source, at(2025, 4, 1, 0), &ctx()).unwrap();
        assert_eq!(source.fetches.get(), 1);
        assert_eq!(report.summaries.len(), 1);
    }

    #[test]
    fn test_top_n_limits_grid_rows() {
        let source = MemoryEventSource::new(fleet());
        let mut p = params();
        p.top_n = Some(1);
        let report = run_analysis(&source, &p, at(2025, 4, 1, 0), &ctx()).unwrap();
        assert_eq!(report.grid.entities, vec!["beaver"]);
    }

    #[test]
    fn test_lookback_drops_old_events() {
        let source = MemoryEventSource::new(fleet());
        let mut p = params();
        p.since = Some(Period::Month);
        // Only March remains, so nobody has two buckets
        let report = run_analysis(&source, &p, at(2025, 3, 31, 0), &ctx()).unwrap();
        assert!(report.summaries.is_empty());
        assert!(!report.anomalies_found());
    }

    #[test]
    fn test_source_failure_propagates() {
        let err = run_analysis(&FailingSource, &params(), at(2025, 4, 1, 0), &ctx()).unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }

    #[test]
    fn test_entity_detail() {
        let source = MemoryEventSource::new(fleet());
        let detail = entity_detail(&source, "beaver", &params(), at(2025, 4, 1, 0), &ctx()).unwrap();
        assert!(!detail.insufficient_data());
        let labels: Vec<&str> = detail.buckets.iter().map(|b| b.bucket.as_str()).collect();
        assert_eq!(labels, vec!["2025-01-01", "2025-02-01", "2025-03-01"]);
        assert_eq!(detail.buckets[2].failures, 40);
        assert_eq!(detail.summary.unwrap().bucket_count, 3);
    }

    #[test]
    fn test_entity_detail_insufficient_is_clean() {
        let source = MemoryEventSource::new(fleet());
        let detail = entity_detail(&source, "loner", &params(), at(2025, 4, 1, 0), &ctx()).unwrap();
        assert!(detail.insufficient_data());
        assert_eq!(detail.buckets.len(), 1);
    }

    #[test]
    fn test_request_rejects_zero_top_n() {
        let request = AnalysisRequest {
            entity: None,
            since: None,
            granularity: "week",
            min_samples: 0,
            rank_by: RankBy::FailureRate,
            top_n: Some(0),
        };
        assert!(matches!(request.validate(), Err(Error::InvalidArgument(_))));
    }
}
