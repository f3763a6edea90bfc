//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - beam-shape configuration (`BeamConfig`, `BeamShape`, `BeamComponent`)
//! - the mixture variant tag (`OverlapVariant`)
//! - RNG seeding policy (`SeedMode`)
//! - simulation outputs (`ScanRecord`, `ScanFit`, `ScanOutcome`)

pub mod types;

pub use types::*;
