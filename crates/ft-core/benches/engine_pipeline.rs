//! Criterion benchmarks for the triage engine in `ft-core`.
//!
//! Benchmarks `bucketize`, `analyze_entity`, `build_grid`, and the full
//! `run_analysis` pipeline over a synthetic fleet of daily CI runs.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ft_common::{Period, RankBy, RawEvent};
use ft_core::analysis::{
    analyze_entity, bucketize, build_grid, group_by_entity, rank, run_analysis, AnalysisParams,
};
use ft_core::logging::LogContext;
use ft_core::source::MemoryEventSource;

/// `entities` × `days` × 4 runs per day, with a failure burst in the last month.
fn fleet(entities: usize, days: i64) -> Vec<RawEvent> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut events = Vec::with_capacity(entities * days as usize * 4);
    for e in 0..entities {
        let entity = format!("animal-{e:03}");
        for d in 0..days {
            for run in 0..4i64 {
                let ts = start + Duration::days(d) + Duration::hours(run * 6);
                let burst = e % 7 == 0 && d >= days - 30;
                let fails = if burst { run != 3 } else { (d + run + e as i64) % 23 == 0 };
                let event = RawEvent::new(entity.clone(), ts);
                events.push(if fails { event.failed_at("Check") } else { event });
            }
        }
    }
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

fn bench_bucketize(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/bucketize");

    for entities in [10usize, 100] {
        let events = fleet(entities, 365);
        for granularity in [Period::Week, Period::Month] {
            group.bench_with_input(
                BenchmarkId::new(granularity.as_str(), entities),
                &events,
                |b, events| {
                    b.iter(|| {
                        let buckets = bucketize(black_box(events), granularity, 10);
                        black_box(buckets.len());
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_analyze_entity(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/analyze_entity");

    for (name, granularity) in [("monthly", Period::Month), ("daily", Period::Day)] {
        let buckets = bucketize(&fleet(1, 365), granularity, 0);
        group.bench_with_input(BenchmarkId::new("buckets", name), &buckets, |b, buckets| {
            b.iter(|| {
                let summary = analyze_entity("animal-000", black_box(buckets), None);
                black_box(summary.unwrap().p_value);
            })
        });
    }

    group.finish();
}

fn bench_build_grid(c: &mut Criterion) {
    let events = fleet(50, 365);
    let by_entity = group_by_entity(bucketize(&events, Period::Month, 10));
    let summaries: Vec<_> = by_entity
        .iter()
        .filter_map(|(id, buckets)| analyze_entity(id, buckets, None).ok())
        .collect();
    let ranked = rank(summaries, RankBy::FailureRate, None);

    c.bench_function("engine/build_grid/50_entities", |b| {
        b.iter(|| {
            let grid = build_grid(black_box(&ranked), black_box(&by_entity));
            black_box(grid.unwrap().flagged_count());
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/run_analysis");
    group.sample_size(20);
    let ctx = LogContext::new("run-bench");
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    for entities in [10usize, 100] {
        let source = MemoryEventSource::new(fleet(entities, 365));
        group.bench_with_input(BenchmarkId::new("fleet", entities), &source, |b, source| {
            b.iter(|| {
                let report = run_analysis(black_box(source), &params(), now, &ctx);
                black_box(report.unwrap().summaries.len());
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_bucketize,
    bench_analyze_entity,
    bench_build_grid,
    bench_full_pipeline
);
criterion_main!(benches);
