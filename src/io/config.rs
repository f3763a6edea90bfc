//! Read beam configuration JSON files.
//!
//! A configuration file is the "portable" description of an overlap density:
//! variant, both beams' components and weights, and the global factor. The
//! schema is defined by `domain::BeamConfig`; files are validated on read so
//! a bad width or correlation fails here, with a path in the message, rather
//! than deep inside a simulation.

use std::fs::File;
use std::path::Path;

use crate::domain::BeamConfig;
use crate::error::AppError;

/// Read and validate a beam configuration JSON file.
pub fn read_beam_config(path: &Path) -> Result<BeamConfig, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!("Failed to open beam config '{}': {e}", path.display()))
    })?;
    let config: BeamConfig = serde_json::from_reader(file).map_err(|e| {
        AppError::config(format!("Invalid beam config '{}': {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Write a beam configuration JSON file (e.g. to snapshot the built-in
/// defaults as a starting point for editing).
pub fn write_beam_config(path: &Path, config: &BeamConfig) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::config(format!(
            "Failed to create beam config '{}': {e}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, config)
        .map_err(|e| AppError::config(format!("Failed to write beam config: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OverlapVariant;

    #[test]
    fn round_trips_a_default_config() {
        let dir = std::env::temp_dir();
        let path = dir.join("vdm_scan_test_beam_config.json");
        let config = BeamConfig::default_for(OverlapVariant::Triple);

        write_beam_config(&path, &config).unwrap();
        let back = read_beam_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(back.variant, OverlapVariant::Triple);
        assert_eq!(back.beam1.components.len(), 3);
        assert!((back.beam1.weights[0] - config.beam1.weights[0]).abs() < 1e-12);
    }

    #[test]
    fn invalid_files_are_rejected_with_the_path() {
        let err = read_beam_config(Path::new("/nonexistent/beams.json")).unwrap_err();
        assert!(err.to_string().contains("beams.json"));
    }
}
