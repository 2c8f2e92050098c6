//! Ranker: order entity summaries and keep the top N.

use ft_common::{EntitySummary, RankBy};
use std::cmp::Ordering;

/// Sort summaries by `by` descending, then truncate to `top_n`.
///
/// Entities with an undefined key go last. The sort is stable, so ties
/// keep their input order.
pub fn rank(mut summaries: Vec<EntitySummary>, by: RankBy, top_n: Option<usize>) -> Vec<EntitySummary> {
    summaries.sort_by(|a, b| match (by.key(a), by.key(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    if let Some(n) = top_n {
        summaries.truncate(n);
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use ft_common::Verdict;

    fn summary(id: &str, rate: Option<f64>, spike: Option<f64>) -> EntitySummary {
        EntitySummary {
            entity_id: id.to_string(),
            total_failures: 0,
            total_events: 0,
            failure_rate: rate,
            bucket_count: 2,
            first_event_ts: None,
            last_event_ts: None,
            chi_square_stat: 0.0,
            degrees_of_freedom: 1,
            p_value: 1.0,
            spike,
            verdict: Verdict::NoSignificantDifference,
        }
    }

    fn ids(ranked: &[EntitySummary]) -> Vec<&str> {
        ranked.iter().map(|s| s.entity_id.as_str()).collect()
    }

    #[test]
    fn test_rank_by_failure_rate_descending() {
        let ranked = rank(
            vec![
                summary("a", Some(0.1), Some(0.5)),
                summary("b", Some(0.4), Some(0.0)),
                summary("c", Some(0.2), Some(0.1)),
            ],
            RankBy::FailureRate,
            None,
        );
        assert_eq!(ids(&ranked), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_by_spike() {
        let ranked = rank(
            vec![
                summary("a", Some(0.1), Some(0.5)),
                summary("b", Some(0.4), Some(0.0)),
            ],
            RankBy::Spike,
            None,
        );
        assert_eq!(ids(&ranked), vec!["a", "b"]);
    }

    #[test]
    fn test_undefined_keys_sort_last_in_input_order() {
        let ranked = rank(
            vec![
                summary("none1", None, None),
                summary("low", Some(0.1), None),
                summary("none2", None, None),
                summary("high", Some(0.9), None),
            ],
            RankBy::FailureRate,
            None,
        );
        assert_eq!(ids(&ranked), vec!["high", "low", "none1", "none2"]);
    }

    #[test]
    fn test_ties_are_stable() {
        let ranked = rank(
            vec![
                summary("first", Some(0.3), None),
                summary("second", Some(0.3), None),
                summary("third", Some(0.3), None),
            ],
            RankBy::FailureRate,
            None,
        );
        assert_eq!(ids(&ranked), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_top_n_applied_after_sort() {
        let ranked = rank(
            vec![
                summary("a", Some(0.1), None),
                summary("b", Some(0.3), None),
                summary("c", Some(0.2), None),
            ],
            RankBy::FailureRate,
            Some(2),
        );
        assert_eq!(ids(&ranked), vec!["b", "c"]);
    }

    #[test]
    fn test_top_n_larger_than_input() {
        let ranked = rank(vec![summary("a", Some(0.1), None)], RankBy::FailureRate, Some(10));
        assert_eq!(ranked.len(), 1);
    }
}
