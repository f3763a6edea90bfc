//! Input/output helpers.
//!
//! - beam configuration JSON ingest (`config`)
//! - scan record / summary exports (`export`)

pub mod config;
pub mod export;

pub use config::*;
pub use export::*;
