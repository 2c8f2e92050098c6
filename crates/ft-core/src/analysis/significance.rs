//! Significance engine: chi-square test of homogeneity across one entity's
//! buckets.
//!
//! The null hypothesis is that the failure rate is the same in every
//! bucket. Expected counts split each outcome's total in proportion to
//! the bucket sizes; terms with a zero expected count are skipped.

use ft_common::{BucketAggregate, EntitySummary, Error, Result, Verdict};
use ft_math::{chi_square_sf, is_significant, pearson_term};

use super::bucket::EventSpan;

/// Summarize one entity's retained buckets.
///
/// Fails with [`Error::InsufficientData`] when fewer than two buckets are
/// given, and with [`Error::NumericalInstability`] when the statistic or
/// its p-value is not a finite probability.
pub fn analyze_entity(
    entity_id: &str,
    buckets: &[BucketAggregate],
    span: Option<EventSpan>,
) -> Result<EntitySummary> {
    if buckets.len() < 2 {
        return Err(Error::InsufficientData {
            entity_id: entity_id.to_string(),
            buckets: buckets.len(),
        });
    }
    let degrees_of_freedom = (buckets.len() - 1) as u64;

    let total_failures: u64 = buckets.iter().map(|b| b.failure_count).sum();
    let total_events: u64 = buckets.iter().map(|b| b.total_count).sum();
    let total_successes = total_events.saturating_sub(total_failures);

    let failure_rate = if total_events > 0 {
        Some(total_failures as f64 / total_events as f64)
    } else {
        None
    };

    let mut statistic = 0.0;
    if total_events > 0 {
        for bucket in buckets {
            let share = bucket.total_count as f64 / total_events as f64;
            let expected_failures = total_failures as f64 * share;
            let expected_successes = total_successes as f64 * share;
            if let Some(term) = pearson_term(bucket.failure_count as f64, expected_failures) {
                statistic += term;
            }
            if let Some(term) = pearson_term(bucket.success_count() as f64, expected_successes) {
                statistic += term;
            }
        }
    }
    if !statistic.is_finite() {
        return Err(Error::NumericalInstability(format!(
            "chi-square statistic for {} is {}",
            entity_id, statistic
        )));
    }

    let p_value = chi_square_sf(statistic, degrees_of_freedom).ok_or_else(|| {
        Error::NumericalInstability(format!(
            "no p-value for statistic {} with {} degrees of freedom",
            statistic, degrees_of_freedom
        ))
    })?;

    let spike = failure_rate.and_then(|overall| {
        buckets
            .iter()
            .filter_map(BucketAggregate::failure_rate)
            .reduce(f64::max)
            .map(|worst| worst - overall)
    });

    Ok(EntitySummary {
        entity_id: entity_id.to_string(),
        total_failures,
        total_events,
        failure_rate,
        bucket_count: buckets.len(),
        first_event_ts: span.map(|s| s.first),
        last_event_ts: span.map(|s| s.last),
        chi_square_stat: statistic,
        degrees_of_freedom,
        p_value,
        spike,
        verdict: Verdict::from_significance(is_significant(p_value)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{aggregate, at};

    const TOL: f64 = 1e-9;

    #[test]
    fn test_beaver_rates_differ() {
        let buckets = vec![
            aggregate("beaver", 1, 50, 5),
            aggregate("beaver", 2, 50, 5),
            aggregate("beaver", 3, 50, 40),
        ];
        let span = EventSpan {
            first: at(2025, 1, 1, 3),
            last: at(2025, 3, 28, 9),
        };
        let summary = analyze_entity("beaver", &buckets, Some(span)).unwrap();

        assert_eq!(summary.bucket_count, 3);
        assert_eq!(summary.degrees_of_freedom, 2);
        assert_eq!(summary.total_failures, 50);
        assert_eq!(summary.total_events, 150);
        assert!((summary.failure_rate.unwrap() - 1.0 / 3.0).abs() < TOL);
        // 8.1667 + 4.0833 twice, plus 32.6667 + 16.3333
        assert!((summary.chi_square_stat - 73.5).abs() < 1e-6);
        assert!(summary.p_value < 1e-10);
        assert_eq!(summary.verdict, Verdict::RatesDiffer);
        assert!((summary.spike.unwrap() - (0.8 - 1.0 / 3.0)).abs() < TOL);
        assert_eq!(summary.first_event_ts, Some(span.first));
        assert_eq!(summary.last_event_ts, Some(span.last));
    }

    #[test]
    fn test_constant_rate_is_not_significant() {
        let buckets = vec![
            aggregate("crake", 1, 40, 4),
            aggregate("crake", 2, 40, 4),
            aggregate("crake", 3, 40, 4),
        ];
        let summary = analyze_entity("crake", &buckets, None).unwrap();
        assert!(summary.chi_square_stat.abs() < TOL);
        assert!((summary.p_value - 1.0).abs() < TOL);
        assert_eq!(summary.verdict, Verdict::NoSignificantDifference);
        assert!(summary.spike.unwrap().abs() < TOL);
    }

    #[test]
    fn test_single_bucket_is_insufficient() {
        let buckets = vec![aggregate("loner", 1, 100, 50)];
        let err = analyze_entity("loner", &buckets, None).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { buckets: 1, .. }));
    }

    #[test]
    fn test_no_failures_skips_zero_expected_terms() {
        let buckets = vec![aggregate("clean", 1, 30, 0), aggregate("clean", 2, 70, 0)];
        let summary = analyze_entity("clean", &buckets, None).unwrap();
        assert_eq!(summary.failure_rate, Some(0.0));
        assert!(summary.chi_square_stat.abs() < TOL);
        assert_eq!(summary.verdict, Verdict::NoSignificantDifference);
    }

    #[test]
    fn test_all_failures_skips_zero_expected_terms() {
        let buckets = vec![aggregate("broken", 1, 20, 20), aggregate("broken", 2, 20, 20)];
        let summary = analyze_entity("broken", &buckets, None).unwrap();
        assert_eq!(summary.failure_rate, Some(1.0));
        assert!(summary.chi_square_stat.abs() < TOL);
    }

    #[test]
    fn test_empty_buckets_leave_rate_undefined() {
        let buckets = vec![aggregate("ghost", 1, 0, 0), aggregate("ghost", 2, 0, 0)];
        let summary = analyze_entity("ghost", &buckets, None).unwrap();
        assert_eq!(summary.failure_rate, None);
        assert_eq!(summary.spike, None);
        assert_eq!(summary.total_events, 0);
    }

    #[test]
    fn test_two_bucket_golden_value() {
        // 2x2 table [[10, 40], [30, 20]]: statistic 16.6667, df 1
        let buckets = vec![aggregate("x", 1, 50, 10), aggregate("x", 2, 50, 30)];
        let summary = analyze_entity("x", &buckets, None).unwrap();
        assert!((summary.chi_square_stat - 50.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.degrees_of_freedom, 1);
        assert!(summary.p_value < 1e-4);
    }
}
