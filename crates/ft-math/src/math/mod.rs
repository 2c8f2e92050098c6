//! Core math modules.

pub mod binomial;
pub mod chi_square;
pub mod significance;
