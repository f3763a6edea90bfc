//! Scan-profile fitting.
//!
//! Responsibilities:
//!
//! - the two-Gaussian-plus-fraction profile model and its fitted-curve
//!   post-processing (`model`)
//! - a small bounded Levenberg–Marquardt minimizer driving the chi-square
//!   residuals (`levmar`)

pub mod levmar;
pub mod model;

pub use levmar::*;
pub use model::*;
