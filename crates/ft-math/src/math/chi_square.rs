//! Chi-square helpers for the bucket homogeneity test.
//!
//! The statistic itself is accumulated by the caller from Pearson terms:
//!
//! `X² = Σ (O - E)² / E`
//!
//! and its upper-tail probability comes from the chi-square distribution
//! with `k - 1` degrees of freedom, evaluated through `statrs`.

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// One Pearson term `(observed - expected)² / expected`.
///
/// Returns `None` when `expected` is zero, negative or non-finite. Callers
/// skip such terms instead of failing the whole statistic.
pub fn pearson_term(observed: f64, expected: f64) -> Option<f64> {
    if !observed.is_finite() || !expected.is_finite() || expected <= 0.0 {
        return None;
    }
    let diff = observed - expected;
    Some(diff * diff / expected)
}

/// Upper-tail probability `P(X ≥ statistic)` for `X ~ χ²(dof)`.
///
/// # Returns
/// * `Some(p)` with `p ∈ [0, 1]`
/// * `None` if `dof == 0` or the statistic is negative or NaN
pub fn chi_square_sf(statistic: f64, dof: u64) -> Option<f64> {
    if dof == 0 || statistic.is_nan() || statistic < 0.0 {
        return None;
    }
    if statistic.is_infinite() {
        return Some(0.0);
    }
    let dist = ChiSquared::new(dof as f64).ok()?;
    Some(dist.sf(statistic).clamp(0.0, 1.0))
}
