//! Command-line parsing for the beam-overlap simulator.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the simulation/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::OverlapVariant;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "vdm", version, about = "Beam-overlap toy generation and vdM scan simulation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Simulate a van der Meer scan, fit the yield profile, and report the
    /// calibration quantities (peak, area, chi2/dof).
    Scan(ScanArgs),
    /// Generate a toy vertex dataset across a beam-separation sweep.
    Toy(ToyArgs),
}

/// Options shared by both subcommands.
#[derive(Debug, Parser, Clone)]
pub struct CommonArgs {
    /// Beam mixture variant used for the built-in configuration.
    #[arg(long, value_enum, default_value_t = OverlapVariant::Double)]
    pub variant: OverlapVariant,

    /// Beam configuration JSON file (overrides --variant).
    #[arg(long)]
    pub beams: Option<PathBuf>,

    /// Number of scan steps.
    #[arg(long, default_value_t = 25)]
    pub steps: usize,

    /// Maximum beam displacement; each beam sweeps ±sep-max/2 so the full
    /// separation covers ±sep-max.
    #[arg(long, default_value_t = 6.0)]
    pub sep_max: f64,

    /// Random seed. Omit to seed from OS entropy.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print one line per simulated step.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options for `vdm scan`.
#[derive(Debug, Parser, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Fit the second width freely instead of as width1 + positive difference.
    #[arg(long)]
    pub free_width2: bool,

    /// Write per-step records to a CSV file.
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Write the full outcome to a JSON file.
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Render an ASCII plot of the profile and fitted curve.
    #[arg(long)]
    pub plot: bool,

    /// Plot width in characters.
    #[arg(long, default_value_t = 72)]
    pub plot_width: usize,

    /// Plot height in characters.
    #[arg(long, default_value_t = 20)]
    pub plot_height: usize,
}

/// Options for `vdm toy`.
#[derive(Debug, Parser, Clone)]
pub struct ToyArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Vertex resolution (x axis).
    #[arg(long, default_value_t = 0.1)]
    pub resolution: f64,

    /// Vertex resolution (y axis); defaults to the x resolution.
    #[arg(long)]
    pub resolution_y: Option<f64>,

    /// Bins per axis of the accumulated vertex histogram.
    #[arg(long, default_value_t = 95)]
    pub nbins: usize,

    /// Write the histogram and totals to a JSON file.
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scan_defaults() {
        let cli = Cli::try_parse_from(["vdm", "scan"]).unwrap();
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.common.steps, 25);
        assert_eq!(args.common.variant, OverlapVariant::Double);
        assert!(args.common.seed.is_none());
        assert!(!args.free_width2);
    }

    #[test]
    fn parses_toy_flags() {
        let cli = Cli::try_parse_from([
            "vdm",
            "toy",
            "--variant",
            "single",
            "--steps",
            "5",
            "--seed",
            "9",
            "--resolution",
            "0.25",
            "--nbins",
            "40",
        ])
        .unwrap();
        let Command::Toy(args) = cli.command else {
            panic!("expected toy");
        };
        assert_eq!(args.common.variant, OverlapVariant::Single);
        assert_eq!(args.common.steps, 5);
        assert_eq!(args.common.seed, Some(9));
        assert_eq!(args.resolution, 0.25);
        assert_eq!(args.nbins, 40);
    }

    #[test]
    fn rejects_unknown_subcommands() {
        assert!(Cli::try_parse_from(["vdm", "frobnicate"]).is_err());
    }
}
