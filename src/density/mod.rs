//! Beam-overlap densities and their native 2D sampler.
//!
//! The density family models the product of two beam profiles, each a small
//! mixture of correlated 2D Gaussians. Variants differ only in mixture size
//! and are dispatched over a tag, not a type hierarchy.

pub mod overlap;
pub mod sampler;

pub use overlap::*;
pub use sampler::*;
