//! Reporting utilities: formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the simulation/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{BeamConfig, ScanOutcome, ScanRecord};

/// Format the scan run summary (configuration + calibration quantities).
pub fn format_scan_summary(config: &BeamConfig, outcome: &ScanOutcome) -> String {
    let mut out = String::new();

    out.push_str("=== vdm - van der Meer scan simulation ===\n");
    out.push_str(&format!("Variant: {}\n", config.variant.display_name()));
    out.push_str(&format!(
        "Steps: {} | Events: {:.0}\n",
        outcome.records.len(),
        outcome.nevents
    ));

    out.push_str("\nCalibration:\n");
    out.push_str(&format!("- peak : {:.4}\n", outcome.peak));
    out.push_str(&format!("- area : {:.4}\n", outcome.area));
    out.push_str(&format!("- chi2/dof: {:.4}\n", outcome.chisq_per_dof));

    out.push_str("\nProfile fit:\n");
    let fit = &outcome.fit;
    out.push_str(&format!(
        "- mean1={:.4} mean2={:.4}\n",
        fit.mean1, fit.mean2
    ));
    match fit.width_diff {
        Some(diff) => out.push_str(&format!(
            "- width1={:.4} width2={:.4} (width1 + {:.4})\n",
            fit.width1, fit.width2, diff
        )),
        None => out.push_str(&format!(
            "- width1={:.4} width2={:.4} (free)\n",
            fit.width1, fit.width2
        )),
    }
    out.push_str(&format!("- fraction={:.4}\n", fit.fraction));
    out.push_str(&format!(
        "- chi2={:.4} | {} iteration(s) | {}\n",
        fit.chi2,
        fit.iterations,
        if fit.converged { "converged" } else { "NOT converged" }
    ));
    out.push('\n');

    out
}

/// Format the per-step count table.
pub fn format_scan_records(records: &[ScanRecord]) -> String {
    let mut out = String::new();
    out.push_str("step    pos1      pos2     count\n");
    for r in records {
        out.push_str(&format!(
            "{:>4} {:>8.3} {:>8.3} {:>9.0}\n",
            r.step, r.pos1, r.pos2, r.count
        ));
    }
    out
}

/// Format the toy generation summary.
pub fn format_toy_summary(
    config: &BeamConfig,
    nevents: u64,
    nbins: usize,
    res_x: f64,
    res_y: f64,
) -> String {
    let mut out = String::new();
    out.push_str("=== vdm - toy vertex generation ===\n");
    out.push_str(&format!("Variant: {}\n", config.variant.display_name()));
    out.push_str(&format!(
        "Resolution: x={res_x} y={res_y} | Histogram: {nbins}x{nbins} over ±10\n"
    ));
    out.push_str(&format!("Generated events: {nevents}\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OverlapVariant, ScanFit};

    fn outcome() -> ScanOutcome {
        ScanOutcome {
            peak: 31.5,
            area: 420.0,
            chisq_per_dof: 1.1,
            nevents: 430.0,
            fit: ScanFit {
                mean1: 12.0,
                mean2: 12.3,
                width1: 2.4,
                width2: 3.1,
                width_diff: Some(0.7),
                fraction: 0.8,
                chi2: 22.0,
                iterations: 17,
                converged: true,
            },
            records: vec![ScanRecord {
                step: 0,
                pos1: -6.0,
                pos2: 6.0,
                count: 3.0,
            }],
        }
    }

    #[test]
    fn scan_summary_mentions_the_calibration_numbers() {
        let config = BeamConfig::default_for(OverlapVariant::Double);
        let text = format_scan_summary(&config, &outcome());
        assert!(text.contains("double-Gaussian"));
        assert!(text.contains("peak : 31.5"));
        assert!(text.contains("chi2/dof: 1.1"));
        assert!(text.contains("converged"));
    }

    #[test]
    fn record_table_has_one_row_per_step() {
        let text = format_scan_records(&outcome().records);
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().contains("-6.000"));
    }
}
