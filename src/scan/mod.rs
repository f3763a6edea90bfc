//! Separation-scan simulation and calibration fit.
//!
//! A `ScanSimulator` sweeps both beam-center coordinates across the scan
//! positions, draws a Poisson count per step from the true overlap rate,
//! records the counts in a step-index profile, and fits the profile with the
//! two-Gaussian-plus-fraction model. The calibration quantities (fitted-curve
//! peak and area, chi-square per degree of freedom, total events) are
//! extracted from the fitted curve.
//!
//! The simulator owns its density (cloned from the caller's); swept
//! parameters are reset to 0 after each run. The profile histogram itself is
//! transient; only the per-step records survive in the outcome.

use rand::SeedableRng;
use rand::rngs::StdRng;

use nalgebra::DVector;

use crate::chisq::{BinnedData, ChiSquare, ErrorMode, FuncMode};
use crate::density::OverlapDensity;
use crate::domain::{ScanFit, ScanOutcome, ScanRecord, SeedMode};
use crate::error::AppError;
use crate::fit::{FittedCurve, LevMarOptions, ScanModel, minimize};
use crate::hist::Hist1d;
use crate::toy::poisson_count;

/// Fixed acceptance × efficiency normalization of the scan rate.
/// Calibration numbers depend on this constant staying exactly 800.0.
pub const SCAN_RATE_SCALE: f64 = 800.0;

/// Box bounds seeding the profile fit.
///
/// The defaults assume a scan of ~25 steps with the peak near the middle;
/// they are wide enough for the usual beam widths and narrow enough to keep
/// the two components from wandering off the profile.
#[derive(Debug, Clone, Copy)]
pub struct FitRanges {
    pub mean1: (f64, f64),
    pub mean2: (f64, f64),
    pub width1: (f64, f64),
    /// Used by the free-width fit only.
    pub width2: (f64, f64),
    /// Used by the parametrized fit only (`width2 = width1 + diff`).
    pub width_diff: (f64, f64),
    pub fraction: (f64, f64),
}

impl Default for FitRanges {
    fn default() -> Self {
        Self {
            mean1: (8.0, 16.0),
            mean2: (8.0, 16.0),
            width1: (1.0, 4.0),
            width2: (2.0, 5.0),
            width_diff: (0.001, 4.0),
            fraction: (0.0, 1.0),
        }
    }
}

pub struct ScanSimulator {
    density: OverlapDensity,
    rng: StdRng,
    verbose: bool,
    parametrized: bool,
    ranges: FitRanges,
}

impl ScanSimulator {
    pub fn new(density: OverlapDensity, seed: SeedMode) -> Self {
        let rng = match seed {
            SeedMode::Entropy => StdRng::from_entropy(),
            SeedMode::Fixed(s) => StdRng::seed_from_u64(s),
        };
        Self {
            density,
            rng,
            verbose: false,
            parametrized: true,
            ranges: FitRanges::default(),
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Choose between the constrained (`width2 = width1 + diff`) and the
    /// free-width fit model.
    pub fn set_parametrized(&mut self, parametrized: bool) {
        self.parametrized = parametrized;
    }

    pub fn set_ranges(&mut self, ranges: FitRanges) {
        self.ranges = ranges;
    }

    pub fn density(&self) -> &OverlapDensity {
        &self.density
    }

    /// The density's bounded 2D integral, exposed for reuse at this layer.
    pub fn integral(&self) -> Result<f64, AppError> {
        self.density.integral()
    }

    /// Simulate one scan and fit its yield profile.
    ///
    /// `param1` / `param2` are the two swept parameter indices (beam-center
    /// coordinates); `positions1` / `positions2` give each step's settings.
    pub fn simulate_scan(
        &mut self,
        param1: usize,
        param2: usize,
        positions1: &[f64],
        positions2: &[f64],
    ) -> Result<ScanOutcome, AppError> {
        if positions1.is_empty() {
            return Err(AppError::empty("Scan needs at least one step."));
        }
        if positions1.len() != positions2.len() {
            return Err(AppError::config(format!(
                "Scan position arrays differ in length ({} vs {}).",
                positions1.len(),
                positions2.len()
            )));
        }

        let steps = positions1.len();
        let mut profile = Hist1d::new(steps, -0.5, steps as f64 - 0.5)?;
        let mut records = Vec::with_capacity(steps);

        for step in 0..steps {
            self.density.set_parameter(param1, positions1[step])?;
            self.density.set_parameter(param2, positions2[step])?;
            let rate = SCAN_RATE_SCALE * self.density.integral()?;
            let count = poisson_count(&mut self.rng, rate)?;
            profile.set_content(step, count)?;
            records.push(ScanRecord {
                step,
                pos1: positions1[step],
                pos2: positions2[step],
                count,
            });
            if self.verbose {
                eprintln!("<<< Scan step {step} with count {count}");
            }
        }
        self.density.set_parameter(param1, 0.0)?;
        self.density.set_parameter(param2, 0.0)?;

        let nevents = profile.integral();
        if nevents <= 0.0 {
            return Err(AppError::empty(
                "Scan produced no events; nothing to fit.",
            ));
        }

        let (fit, curve, chisq_per_dof) = self.fit_profile(&profile, nevents)?;
        let peak = curve.peak(steps);
        let area = curve.integral(steps);

        Ok(ScanOutcome {
            peak,
            area,
            chisq_per_dof,
            nevents,
            fit,
            records,
        })
    }

    /// Fit the yield profile and derive the chi-square per degree of freedom.
    fn fit_profile(
        &self,
        profile: &Hist1d,
        nevents: f64,
    ) -> Result<(ScanFit, FittedCurve, f64), AppError> {
        let model = ScanModel {
            lo: profile.low(),
            hi: profile.high(),
            parametrized: self.parametrized,
        };
        let data = BinnedData::from_hist(profile);
        let statistic = ChiSquare {
            mode: FuncMode::Pdf,
            errors: ErrorMode::Stored,
        };

        // The curve overlays the pdf on the count profile: total entries
        // times the (unit) bin width.
        let norm = nevents * profile.bin_width();

        let bounds = [
            self.ranges.mean1,
            self.ranges.mean2,
            self.ranges.width1,
            if self.parametrized {
                self.ranges.width_diff
            } else {
                self.ranges.width2
            },
            self.ranges.fraction,
        ];

        // Chi-square residuals per countable bin; their squared norm is
        // exactly the compensated statistic the evaluator computes.
        let residuals = |params: &[f64]| -> Result<DVector<f64>, AppError> {
            let mut values = Vec::with_capacity(data.len());
            for (i, bin) in data.bins().iter().enumerate() {
                if !bin.valid || bin.weight == 0.0 {
                    continue;
                }
                let expected = model.pdf(bin.center, params) * norm;
                let err = if expected - bin.weight > 0.0 {
                    bin.err_high
                } else {
                    bin.err_low
                };
                if err == 0.0 {
                    return Err(AppError::numeric(format!(
                        "Profile fit failed: bin {i} has zero error."
                    )));
                }
                values.push((expected - bin.weight) / err);
            }
            Ok(DVector::from_vec(values))
        };

        let result = minimize(residuals, &bounds, &LevMarOptions::default())?;

        let chi2 = statistic
            .evaluate(&data, |x| model.pdf(x, &result.params))?
            .value();

        let used_bins = data
            .bins()
            .iter()
            .filter(|b| b.valid && b.weight != 0.0)
            .count();
        let dof = used_bins as i64 - ScanModel::N_PARAMS as i64;
        let chisq_per_dof = if dof > 0 { chi2 / dof as f64 } else { f64::NAN };

        let fit = ScanFit {
            mean1: result.params[0],
            mean2: result.params[1],
            width1: result.params[2],
            width2: model.width2(&result.params),
            width_diff: self.parametrized.then_some(result.params[3]),
            fraction: result.params[4],
            chi2,
            iterations: result.iterations,
            converged: result.converged,
        };
        let curve = FittedCurve::new(model, result.params, norm);

        Ok((fit, curve, chisq_per_dof))
    }
}

/// Rebuild the fitted curve from a reported fit, e.g. for plotting.
pub fn curve_from_fit(fit: &ScanFit, steps: usize, nevents: f64) -> FittedCurve {
    let model = ScanModel {
        lo: -0.5,
        hi: steps as f64 - 0.5,
        parametrized: fit.width_diff.is_some(),
    };
    let w2_slot = fit.width_diff.unwrap_or(fit.width2);
    let params = vec![fit.mean1, fit.mean2, fit.width1, w2_slot, fit.fraction];
    FittedCurve::new(model, params, nevents)
}
