//! Exact one-tailed binomial test.
//!
//! For `X ~ Binomial(n, p)` the upper tail is
//!
//! `P(X ≥ k) = I_p(k, n - k + 1)`
//!
//! where `I` is the regularized incomplete beta function. `statrs` exposes
//! this as the survival function of its `Binomial` distribution, shifted by
//! one because `sf(x)` is the strict tail `P(X > x)`.

use statrs::distribution::{Binomial, DiscreteCDF};

/// Result of a one-tailed ("greater") exact binomial test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinomialTail {
    /// Observed successes `k`.
    pub successes: u64,
    /// Number of trials `n`.
    pub trials: u64,
    /// Null success probability `p`.
    pub probability: f64,
    /// `P(X ≥ k)` under the null.
    pub p_value: f64,
}

impl BinomialTail {
    /// Run the test; see [`binomial_upper_tail`] for the `None` cases.
    pub fn test(successes: u64, trials: u64, probability: f64) -> Option<Self> {
        let p_value = binomial_upper_tail(successes, trials, probability)?;
        Some(BinomialTail {
            successes,
            trials,
            probability,
            p_value,
        })
    }

    /// Observed success fraction `k / n`.
    pub fn observed_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.successes as f64 / self.trials as f64
    }
}

/// Probability of observing at least `successes` in `trials` draws at
/// success probability `probability`.
///
/// # Returns
/// * `Some(p)` with `p ∈ [0, 1]`
/// * `None` if `probability` is outside `[0, 1]` or NaN, or if
///   `successes > trials`
pub fn binomial_upper_tail(successes: u64, trials: u64, probability: f64) -> Option<f64> {
    if probability.is_nan() || !(0.0..=1.0).contains(&probability) {
        return None;
    }
    if successes > trials {
        return None;
    }
    if successes == 0 {
        return Some(1.0);
    }

    let dist = Binomial::new(probability, trials).ok()?;
    Some(dist.sf(successes - 1).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn zero_successes_is_certain() {
        assert_eq!(binomial_upper_tail(0, 25, 0.3), Some(1.0));
    }

    #[test]
    fn fair_coin_golden_value() {
        // P(X ≥ 8 | n=10, p=0.5) = (45 + 10 + 1) / 1024
        let p = binomial_upper_tail(8, 10, 0.5).unwrap();
        assert!(approx_eq(p, 56.0 / 1024.0, 1e-12), "p = {}", p);
    }

    #[test]
    fn all_successes_golden_value() {
        // P(X ≥ 5 | n=5, p=0.2) = 0.2^5
        let p = binomial_upper_tail(5, 5, 0.2).unwrap();
        assert!(approx_eq(p, 0.2f64.powi(5), 1e-12), "p = {}", p);
    }

    #[test]
    fn zero_probability_with_successes() {
        assert_eq!(binomial_upper_tail(1, 10, 0.0), Some(0.0));
    }

    #[test]
    fn burst_against_low_baseline_is_tiny() {
        // 40 failures out of 50 at a 1/3 baseline
        let p = binomial_upper_tail(40, 50, 1.0 / 3.0).unwrap();
        assert!(p < 1e-8, "p = {}", p);
    }

    #[test]
    fn rejects_invalid_inputs() {
        assert_eq!(binomial_upper_tail(3, 10, -0.1), None);
        assert_eq!(binomial_upper_tail(3, 10, 1.5), None);
        assert_eq!(binomial_upper_tail(3, 10, f64::NAN), None);
        assert_eq!(binomial_upper_tail(11, 10, 0.5), None);
    }

    #[test]
    fn tail_struct_carries_inputs() {
        let t = BinomialTail::test(8, 10, 0.5).unwrap();
        assert_eq!(t.successes, 8);
        assert_eq!(t.trials, 10);
        assert!(approx_eq(t.observed_rate(), 0.8, 1e-12));
        assert!(approx_eq(t.p_value, 56.0 / 1024.0, 1e-12));
    }
}
