//! Shared simulation pipeline used by the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! configuration -> density -> sweep positions -> simulate -> outcome.
//! The CLI can then focus on presentation (printing, plotting, exports).

use crate::cli::{CommonArgs, ScanArgs, ToyArgs};
use crate::density::{OverlapDensity, PAR_X1, PAR_X2};
use crate::domain::{BeamConfig, ScanOutcome, SeedMode};
use crate::error::AppError;
use crate::hist::Hist2d;
use crate::scan::ScanSimulator;
use crate::toy::ToyGenerator;

/// All computed outputs of a `vdm scan` run.
#[derive(Debug, Clone)]
pub struct ScanRunOutput {
    pub config: BeamConfig,
    pub outcome: ScanOutcome,
}

/// All computed outputs of a `vdm toy` run.
#[derive(Debug, Clone)]
pub struct ToyRunOutput {
    pub config: BeamConfig,
    pub histogram: Hist2d,
    pub nevents: u64,
    pub res_x: f64,
    pub res_y: f64,
}

/// Resolve the beam configuration: an explicit file wins over the built-in
/// per-variant defaults.
pub fn resolve_config(common: &CommonArgs) -> Result<BeamConfig, AppError> {
    match &common.beams {
        Some(path) => crate::io::read_beam_config(path),
        None => Ok(BeamConfig::default_for(common.variant)),
    }
}

fn seed_mode(common: &CommonArgs) -> SeedMode {
    match common.seed {
        Some(s) => SeedMode::Fixed(s),
        None => SeedMode::Entropy,
    }
}

/// Symmetric sweep positions for the two beams.
///
/// Beam 1 moves from `−half_span` to `+half_span` across the steps; beam 2
/// mirrors it, so the full separation covers twice that range. A single step
/// parks both beams head-on.
pub fn sweep_positions(steps: usize, sep_max: f64) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    if steps == 0 {
        return Err(AppError::config("Scan needs at least one step."));
    }
    if !(sep_max.is_finite() && sep_max > 0.0) {
        return Err(AppError::config(format!(
            "Maximum separation must be positive and finite (got {sep_max})."
        )));
    }

    let half_span = sep_max / 2.0;
    let pos1: Vec<f64> = if steps == 1 {
        vec![0.0]
    } else {
        let mid = (steps - 1) as f64 / 2.0;
        (0..steps)
            .map(|i| (i as f64 - mid) / mid * half_span)
            .collect()
    };
    let pos2 = pos1.iter().map(|p| -p).collect();
    Ok((pos1, pos2))
}

/// Execute the scan pipeline.
pub fn run_scan(args: &ScanArgs) -> Result<ScanRunOutput, AppError> {
    let config = resolve_config(&args.common)?;
    let density = OverlapDensity::from_config(&config)?;
    let (pos1, pos2) = sweep_positions(args.common.steps, args.common.sep_max)?;

    let mut simulator = ScanSimulator::new(density, seed_mode(&args.common));
    simulator.set_verbose(args.common.verbose);
    simulator.set_parametrized(!args.free_width2);

    let outcome = simulator.simulate_scan(PAR_X1, PAR_X2, &pos1, &pos2)?;
    Ok(ScanRunOutput { config, outcome })
}

/// Execute the toy-generation pipeline.
pub fn run_toy(args: &ToyArgs) -> Result<ToyRunOutput, AppError> {
    let config = resolve_config(&args.common)?;
    let density = OverlapDensity::from_config(&config)?;
    // The toy sweep moves one beam only, as the original generator does.
    let (pos1, _) = sweep_positions(args.common.steps, args.common.sep_max)?;

    let mut generator = ToyGenerator::new(density, seed_mode(&args.common));
    generator.set_verbose(args.common.verbose);
    generator.set_resolution(args.resolution, args.resolution_y)?;
    let res_x = args.resolution;
    let res_y = args.resolution_y.filter(|r| *r >= 0.0).unwrap_or(res_x);

    let (histogram, nevents) = generator.generate(PAR_X1, &pos1, args.nbins)?;
    Ok(ToyRunOutput {
        config,
        histogram,
        nevents,
        res_x,
        res_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_positions_are_symmetric_and_opposed() {
        let (pos1, pos2) = sweep_positions(25, 6.0).unwrap();
        assert_eq!(pos1.len(), 25);
        assert!((pos1[0] + 3.0).abs() < 1e-12);
        assert!((pos1[24] - 3.0).abs() < 1e-12);
        assert!((pos1[12]).abs() < 1e-12);
        for (a, b) in pos1.iter().zip(&pos2) {
            assert_eq!(*b, -*a);
        }
    }

    #[test]
    fn single_step_sweep_is_head_on() {
        let (pos1, pos2) = sweep_positions(1, 6.0).unwrap();
        assert_eq!(pos1, vec![0.0]);
        assert_eq!(pos2, vec![0.0]);
    }

    #[test]
    fn invalid_sweeps_are_rejected() {
        assert!(sweep_positions(0, 6.0).is_err());
        assert!(sweep_positions(5, 0.0).is_err());
        assert!(sweep_positions(5, f64::NAN).is_err());
    }
}
