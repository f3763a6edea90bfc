//! Numerical utilities: 2D quadrature, compensated summation, special
//! functions, and weighted least squares.

pub mod integrate;
pub mod kahan;
pub mod lsq;
pub mod special;

pub use integrate::*;
pub use kahan::*;
pub use lsq::*;
pub use special::*;
