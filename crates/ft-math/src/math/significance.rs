//! Fixed significance level shared by every test in the workspace.

/// Alpha for both the homogeneity test and the per-cell binomial test.
pub const SIGNIFICANCE_ALPHA: f64 = 0.05;

/// True when `p_value` is strictly below [`SIGNIFICANCE_ALPHA`].
///
/// A p-value of exactly 0.05 is not significant. NaN is never significant.
pub fn is_significant(p_value: f64) -> bool {
    p_value < SIGNIFICANCE_ALPHA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_not_significant() {
        assert!(!is_significant(0.05));
        assert!(is_significant(0.049_999));
        assert!(!is_significant(0.5));
    }

    #[test]
    fn nan_is_not_significant() {
        assert!(!is_significant(f64::NAN));
    }
}
