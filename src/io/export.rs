//! Export simulation results.
//!
//! CSV for per-step records (easy to consume in spreadsheets or downstream
//! scripts), JSON for full summaries.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{BeamConfig, ScanOutcome, ScanRecord};
use crate::error::AppError;
use crate::hist::Hist2d;

/// Write per-step scan records to a CSV file.
pub fn write_scan_csv(path: &Path, records: &[ScanRecord]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::config(format!("Failed to create scan CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "step,pos1,pos2,count")
        .map_err(|e| AppError::config(format!("Failed to write scan CSV header: {e}")))?;
    for r in records {
        writeln!(file, "{},{:.10},{:.10},{:.0}", r.step, r.pos1, r.pos2, r.count)
            .map_err(|e| AppError::config(format!("Failed to write scan CSV row: {e}")))?;
    }
    Ok(())
}

/// Scan summary JSON schema.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummaryFile<'a> {
    pub tool: &'a str,
    pub config: &'a BeamConfig,
    pub outcome: &'a ScanOutcome,
}

/// Write the full scan outcome to a JSON file.
pub fn write_scan_json(
    path: &Path,
    config: &BeamConfig,
    outcome: &ScanOutcome,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::config(format!("Failed to create scan JSON '{}': {e}", path.display()))
    })?;
    let summary = ScanSummaryFile {
        tool: "vdm",
        config,
        outcome,
    };
    serde_json::to_writer_pretty(file, &summary)
        .map_err(|e| AppError::config(format!("Failed to write scan JSON: {e}")))?;
    Ok(())
}

/// Toy summary JSON schema, including the accumulated vertex histogram.
#[derive(Debug, Clone, Serialize)]
pub struct ToySummaryFile<'a> {
    pub tool: &'a str,
    pub config: &'a BeamConfig,
    pub nevents: u64,
    pub histogram: &'a Hist2d,
}

/// Write the toy generation result to a JSON file.
pub fn write_toy_json(
    path: &Path,
    config: &BeamConfig,
    nevents: u64,
    histogram: &Hist2d,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::config(format!("Failed to create toy JSON '{}': {e}", path.display()))
    })?;
    let summary = ToySummaryFile {
        tool: "vdm",
        config,
        nevents,
        histogram,
    };
    serde_json::to_writer_pretty(file, &summary)
        .map_err(|e| AppError::config(format!("Failed to write toy JSON: {e}")))?;
    Ok(())
}
