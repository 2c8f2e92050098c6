//! Grid builder: entity × bucket matrix with a local significance flag
//! per cell.
//!
//! A cell is flagged when its failure rate is above the entity's overall
//! rate and a one-tailed exact binomial test at that baseline gives a tail
//! probability below alpha. Cells at or below baseline are never tested.

use ft_common::{BucketAggregate, EntitySummary, Error, Period, Result};
use ft_math::{is_significant, BinomialTail};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One observed (entity, bucket) combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub failures: u64,
    pub total: u64,
    pub rate: f64,
    /// e.g. `80.0% (n=50)`
    pub display: String,
    pub significant: bool,
    /// Binomial upper-tail probability; only present for above-baseline cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail_probability: Option<f64>,
}

/// Sparse grid over the ranked entities.
///
/// `cells[entity][bucket_label]` exists only for buckets the entity
/// actually has; absent combinations are never filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Entities in rank order.
    pub entities: Vec<String>,
    /// Union of bucket labels, ascending.
    pub buckets: Vec<String>,
    pub cells: BTreeMap<String, BTreeMap<String, GridCell>>,
}

impl Grid {
    pub fn cell(&self, entity_id: &str, bucket: &str) -> Option<&GridCell> {
        self.cells.get(entity_id)?.get(bucket)
    }

    /// Number of cells flagged significant.
    pub fn flagged_count(&self) -> usize {
        self.cells
            .values()
            .flat_map(|row| row.values())
            .filter(|c| c.significant)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Format a rate the way the grid displays it: `"{rate:.1%} (n={total})"`.
pub fn format_rate(rate: f64, total: u64) -> String {
    format!("{:.1}% (n={})", rate * 100.0, total)
}

/// Build the grid for `ranked` entities from their retained buckets.
///
/// Each entity's baseline is its summary's overall failure rate; entities
/// without one get cells but never a flag.
pub fn build_grid(
    ranked: &[EntitySummary],
    buckets_by_entity: &BTreeMap<String, Vec<BucketAggregate>>,
) -> Result<Grid> {
    let mut grid = Grid::default();
    let mut bucket_starts = BTreeSet::new();

    for summary in ranked {
        grid.entities.push(summary.entity_id.clone());
        let Some(buckets) = buckets_by_entity.get(&summary.entity_id) else {
            continue;
        };

        let row = grid.cells.entry(summary.entity_id.clone()).or_default();
        for bucket in buckets {
            let Some(rate) = bucket.failure_rate() else {
                continue;
            };
            bucket_starts.insert(bucket.bucket_start());

            let tail = match summary.failure_rate {
                Some(baseline) if rate > baseline => Some(
                    BinomialTail::test(bucket.failure_count, bucket.total_count, baseline)
                        .ok_or_else(|| {
                            Error::NumericalInstability(format!(
                                "binomial tail undefined for {}/{} at p={}",
                                bucket.failure_count, bucket.total_count, baseline
                            ))
                        })?,
                ),
                _ => None,
            };

            row.insert(
                bucket.key.label(),
                GridCell {
                    failures: bucket.failure_count,
                    total: bucket.total_count,
                    rate,
                    display: format_rate(rate, bucket.total_count),
                    significant: tail.map(|t| is_significant(t.p_value)).unwrap_or(false),
                    tail_probability: tail.map(|t| t.p_value),
                },
            );
        }
    }

    grid.buckets = bucket_starts.into_iter().map(Period::label).collect();
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::significance::analyze_entity;
    use crate::test_utils::aggregate;

    fn beaver_buckets() -> Vec<BucketAggregate> {
        vec![
            aggregate("beaver", 1, 50, 5),
            aggregate("beaver", 2, 50, 5),
            aggregate("beaver", 3, 50, 40),
        ]
    }

    fn grid_for(entities: Vec<(&str, Vec<BucketAggregate>)>) -> Grid {
        let mut by_entity = BTreeMap::new();
        let mut ranked = Vec::new();
        for (id, buckets) in entities {
            ranked.push(analyze_entity(id, &buckets, None).unwrap());
            by_entity.insert(id.to_string(), buckets);
        }
        build_grid(&ranked, &by_entity).unwrap()
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.8, 50), "80.0% (n=50)");
        assert_eq!(format_rate(0.0, 12), "0.0% (n=12)");
        assert_eq!(format_rate(1.0 / 3.0, 150), "33.3% (n=150)");
    }

    #[test]
    fn test_spike_cell_flagged() {
        let grid = grid_for(vec![("beaver", beaver_buckets())]);

        let spike = grid.cell("beaver", "2025-03-01").unwrap();
        assert_eq!(spike.display, "80.0% (n=50)");
        assert!(spike.significant);
        assert!(spike.tail_probability.unwrap() < 0.05);

        // Below baseline: never tested, never flagged
        let quiet = grid.cell("beaver", "2025-01-01").unwrap();
        assert!(!quiet.significant);
        assert_eq!(quiet.tail_probability, None);
        assert_eq!(grid.flagged_count(), 1);
    }

    #[test]
    fn test_slightly_above_baseline_not_flagged() {
        let grid = grid_for(vec![(
            "crake",
            vec![aggregate("crake", 1, 40, 4), aggregate("crake", 2, 40, 5)],
        )]);
        let cell = grid.cell("crake", "2025-02-01").unwrap();
        assert!(cell.tail_probability.is_some());
        assert!(!cell.significant);
    }

    #[test]
    fn test_buckets_are_sorted_union_and_missing_cells_absent() {
        let grid = grid_for(vec![
            ("beaver", vec![aggregate("beaver", 3, 20, 2), aggregate("beaver", 1, 20, 2)]),
            ("crake", vec![aggregate("crake", 2, 20, 2), aggregate("crake", 3, 20, 2)]),
        ]);
        assert_eq!(grid.buckets, vec!["2025-01-01", "2025-02-01", "2025-03-01"]);
        assert!(grid.cell("crake", "2025-01-01").is_none());
        assert!(grid.cell("beaver", "2025-02-01").is_none());
    }

    #[test]
    fn test_entities_keep_rank_order() {
        let grid = grid_for(vec![
            ("zebra", vec![aggregate("zebra", 1, 20, 2), aggregate("zebra", 2, 20, 2)]),
            ("aardvark", vec![aggregate("aardvark", 1, 20, 2), aggregate("aardvark", 2, 20, 2)]),
        ]);
        assert_eq!(grid.entities, vec!["zebra", "aardvark"]);
    }

    #[test]
    fn test_undefined_baseline_never_flags() {
        let buckets = vec![aggregate("ghost", 1, 0, 0), aggregate("ghost", 2, 0, 0)];
        let grid = grid_for(vec![("ghost", buckets)]);
        assert_eq!(grid.flagged_count(), 0);
        assert!(grid.buckets.is_empty());
    }

    #[test]
    fn test_empty_ranking() {
        let grid = build_grid(&[], &BTreeMap::new()).unwrap();
        assert!(grid.is_empty());
        assert!(grid.buckets.is_empty());
    }
}
