//! Payload rendering for the CLI.
//!
//! Every renderer returns a `String` or a JSON value; printing is left to
//! `main.rs` so that stdout stays payload-only.

use chrono::{DateTime, Utc};
use ft_common::{EntitySummary, SCHEMA_VERSION};
use serde_json::{json, Value};
use std::fmt::Write;

use crate::analysis::{AnalysisReport, EntityDetail};
use crate::snapshots::SnapshotRow;

/// Common envelope fields for JSON payloads.
pub fn envelope(command: &str, run_id: &str, generated_at: DateTime<Utc>) -> Value {
    json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": run_id,
        "generated_at": generated_at.to_rfc3339(),
        "command": command,
    })
}

/// Merge the fields of `extra` into the object `base`.
pub fn merge(mut base: Value, extra: Value) -> Value {
    if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
        base.extend(extra);
    }
    base
}

pub fn analysis_json(report: &AnalysisReport, run_id: &str, generated_at: DateTime<Utc>) -> Value {
    merge(
        envelope("analyze", run_id, generated_at),
        json!({
            "parameters": report.parameters,
            "now": report.now.to_rfc3339(),
            "events_fetched": report.events_fetched,
            "anomalies_found": report.anomalies_found(),
            "summaries": report.summaries,
            "skipped": report.skipped,
            "grid": report.grid,
        }),
    )
}

fn fmt_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.1}%", r * 100.0),
        None => "n/a".to_string(),
    }
}

fn fmt_spike(spike: Option<f64>) -> String {
    match spike {
        Some(s) => format!("{:+.1} pp", s * 100.0),
        None => "n/a".to_string(),
    }
}

fn fmt_p(p: f64) -> String {
    if p < 1e-4 {
        format!("{:.2e}", p)
    } else {
        format!("{:.4}", p)
    }
}

fn summary_table(out: &mut String, summaries: &[EntitySummary]) {
    let _ = writeln!(
        out,
        "| Entity | Failures | Runs | Rate | Buckets | χ² | df | p-value | Spike | Verdict |"
    );
    let _ = writeln!(out, "|---|---:|---:|---:|---:|---:|---:|---:|---:|---|");
    for s in summaries {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {:.2} | {} | {} | {} | {} |",
            s.entity_id,
            s.total_failures,
            s.total_events,
            fmt_rate(s.failure_rate),
            s.bucket_count,
            s.chi_square_stat,
            s.degrees_of_freedom,
            fmt_p(s.p_value),
            fmt_spike(s.spike),
            s.verdict
        );
    }
}

/// Markdown report: ranked table, then the grid with `*` on flagged cells.
pub fn analysis_markdown(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let p = &report.parameters;
    let _ = writeln!(out, "# Flake Triage");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Granularity: {} | Lookback: {} | Min samples: >{} | Ranked by: {}",
        p.granularity,
        p.since.map(|s| s.to_string()).unwrap_or_else(|| "all".to_string()),
        p.min_samples,
        p.rank_by
    );
    let _ = writeln!(out);

    if report.summaries.is_empty() {
        let _ = writeln!(out, "No entity has two or more qualifying buckets.");
        return out;
    }

    let _ = writeln!(out, "## Ranked entities");
    let _ = writeln!(out);
    summary_table(&mut out, &report.summaries);

    let grid = &report.grid;
    let _ = writeln!(out);
    let _ = writeln!(out, "## Failure rate by bucket");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Entity | {} |", grid.buckets.join(" | "));
    let _ = writeln!(out, "|---|{}", "---|".repeat(grid.buckets.len()));
    for entity in &grid.entities {
        let cells: Vec<String> = grid
            .buckets
            .iter()
            .map(|bucket| match grid.cell(entity, bucket) {
                Some(cell) if cell.significant => format!("{} *", cell.display),
                Some(cell) => cell.display.clone(),
                None => String::new(),
            })
            .collect();
        let _ = writeln!(out, "| {} | {} |", entity, cells.join(" | "));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "`*` one-tailed binomial test against the entity's overall rate, p < 0.05");
    out
}

/// One line for terminals and chat notifications.
pub fn analysis_summary(report: &AnalysisReport, run_id: &str) -> String {
    let differ = report
        .summaries
        .iter()
        .filter(|s| s.verdict.differs())
        .count();
    let top = report
        .summaries
        .first()
        .map(|s| format!("; top: {} ({})", s.entity_id, fmt_rate(s.failure_rate)))
        .unwrap_or_default();
    format!(
        "[{}] {} entities ranked, {} with differing rates, {} flagged cells, {} skipped{}",
        run_id,
        report.summaries.len(),
        differ,
        report.grid.flagged_count(),
        report.skipped.len(),
        top
    )
}

pub fn entity_json(detail: &EntityDetail, run_id: &str, generated_at: DateTime<Utc>) -> Value {
    merge(
        envelope("entity", run_id, generated_at),
        json!({
            "entity_id": detail.entity_id,
            "parameters": detail.parameters,
            "events_fetched": detail.events_fetched,
            "insufficient_data": detail.insufficient_data(),
            "summary": detail.summary,
            "buckets": detail.buckets,
        }),
    )
}

pub fn entity_markdown(detail: &EntityDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", detail.entity_id);
    let _ = writeln!(out);
    match &detail.summary {
        Some(summary) => summary_table(&mut out, std::slice::from_ref(summary)),
        None => {
            let _ = writeln!(
                out,
                "Insufficient data: {} qualifying bucket(s), need at least 2.",
                detail.buckets.len()
            );
        }
    }
    if !detail.buckets.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "| Bucket | Failures | Runs | Rate |");
        let _ = writeln!(out, "|---|---:|---:|---:|");
        for b in &detail.buckets {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                b.bucket,
                b.failures,
                b.total,
                fmt_rate(b.failure_rate)
            );
        }
    }
    out
}

pub fn entity_summary(detail: &EntityDetail) -> String {
    match &detail.summary {
        Some(s) => format!(
            "{}: {} over {} buckets, p={}, {}",
            s.entity_id,
            fmt_rate(s.failure_rate),
            s.bucket_count,
            fmt_p(s.p_value),
            s.verdict
        ),
        None => format!("{}: insufficient data", detail.entity_id),
    }
}

pub fn snapshots_markdown(entity_id: &str, bucket: &str, rows: &[SnapshotRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} / {}", entity_id, bucket);
    let _ = writeln!(out);
    if rows.is_empty() {
        let _ = writeln!(out, "No runs in this bucket.");
        return out;
    }
    let _ = writeln!(out, "| Snapshot | Status | Branch | Commit | Stage | Log |");
    let _ = writeln!(out, "|---|---|---|---|---|---|");
    for r in rows {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | [log]({}) |",
            r.snapshot,
            r.status,
            r.branch,
            r.commit,
            r.failure_stage.as_deref().unwrap_or(""),
            r.log_link
        );
    }
    out
}
