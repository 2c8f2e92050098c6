//! Flake triage math utilities.

pub mod math;

pub use math::binomial::{binomial_upper_tail, BinomialTail};
pub use math::chi_square::{chi_square_sf, pearson_term};
pub use math::significance::{is_significant, SIGNIFICANCE_ALPHA};
