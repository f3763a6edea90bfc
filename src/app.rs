//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds the overlap density from configuration
//! - runs the scan or toy pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, ScanArgs, ToyArgs};
use crate::error::AppError;
use crate::scan::curve_from_fit;

pub mod pipeline;

/// Entry point for the `vdm` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Scan(args) => handle_scan(args),
        Command::Toy(args) => handle_toy(args),
    }
}

fn handle_scan(args: ScanArgs) -> Result<(), AppError> {
    let run = pipeline::run_scan(&args)?;

    println!(
        "{}",
        crate::report::format_scan_summary(&run.config, &run.outcome)
    );
    println!("{}", crate::report::format_scan_records(&run.outcome.records));

    if args.plot {
        let steps = run.outcome.records.len();
        let curve = curve_from_fit(&run.outcome.fit, steps, run.outcome.nevents);
        let samples = (args.plot_width.max(10) * 4).max(steps);
        let curve_points: Vec<(f64, f64)> = (0..=samples)
            .map(|i| {
                let x = -0.5 + (steps as f64) * i as f64 / samples as f64;
                (x, curve.eval(x))
            })
            .collect();
        println!(
            "{}",
            crate::plot::render_profile_plot(
                &run.outcome.records,
                Some(&curve_points),
                args.plot_width,
                args.plot_height,
            )
        );
    }

    if let Some(path) = &args.export_csv {
        crate::io::write_scan_csv(path, &run.outcome.records)?;
        println!("Wrote scan records to {}", path.display());
    }
    if let Some(path) = &args.export_json {
        crate::io::write_scan_json(path, &run.config, &run.outcome)?;
        println!("Wrote scan summary to {}", path.display());
    }

    Ok(())
}

fn handle_toy(args: ToyArgs) -> Result<(), AppError> {
    let run = pipeline::run_toy(&args)?;

    println!(
        "{}",
        crate::report::format_toy_summary(
            &run.config,
            run.nevents,
            args.nbins,
            run.res_x,
            run.res_y,
        )
    );

    if let Some(path) = &args.export_json {
        crate::io::write_toy_json(path, &run.config, run.nevents, &run.histogram)?;
        println!("Wrote toy summary to {}", path.display());
    }

    Ok(())
}
