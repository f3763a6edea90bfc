//! Monte-Carlo toy generation.
//!
//! A `ToyGenerator` sweeps one density parameter (a beam-center coordinate)
//! across the scan positions and, per step, draws a Poisson number of events
//! from the density's true rate, samples each event from the density's own 2D
//! sampler, applies per-axis Gaussian resolution smearing, and accumulates
//! everything into one shared 2D vertex histogram.
//!
//! The generator owns its density (cloned from the caller's), so the sweep
//! never mutates an object the caller still holds; the swept parameter is
//! reset to 0 after each run so the generator can be reused.

use rand::SeedableRng;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand_distr::{Normal, Poisson};

use crate::density::{GridSampler2d, OverlapDensity};
use crate::domain::SeedMode;
use crate::error::AppError;
use crate::hist::Hist2d;

/// Fixed acceptance × efficiency normalization of the toy event rate.
/// Calibration numbers depend on this constant staying exactly 80.0.
pub const TOY_RATE_SCALE: f64 = 80.0;

/// Spatial range of the accumulated vertex histogram.
pub const TOY_HIST_HALF_WIDTH: f64 = 10.0;

pub struct ToyGenerator {
    density: OverlapDensity,
    rng: StdRng,
    res_x: f64,
    res_y: f64,
    verbose: bool,
}

impl ToyGenerator {
    pub fn new(density: OverlapDensity, seed: SeedMode) -> Self {
        let rng = match seed {
            SeedMode::Entropy => StdRng::from_entropy(),
            SeedMode::Fixed(s) => StdRng::seed_from_u64(s),
        };
        Self {
            density,
            rng,
            res_x: 0.0,
            res_y: 0.0,
            verbose: false,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set the per-axis vertex resolution.
    ///
    /// A missing or negative `res_y` falls back to `res_x`.
    pub fn set_resolution(&mut self, res_x: f64, res_y: Option<f64>) -> Result<(), AppError> {
        if !(res_x.is_finite() && res_x >= 0.0) {
            return Err(AppError::config(format!(
                "Resolution must be non-negative and finite (got {res_x})."
            )));
        }
        self.res_x = res_x;
        self.res_y = match res_y {
            Some(r) if r >= 0.0 && r.is_finite() => r,
            _ => res_x,
        };
        Ok(())
    }

    pub fn density(&self) -> &OverlapDensity {
        &self.density
    }

    /// Draw one smeared vertex: a native density sample plus independent
    /// Gaussian noise of width `res_x` / `res_y` on each axis.
    pub fn sample_point(&mut self, sampler: &GridSampler2d) -> Result<(f64, f64), AppError> {
        let (x, y) = sampler.sample(&mut self.rng);
        let smear_x = Normal::new(x, self.res_x)
            .map_err(|e| AppError::numeric(format!("Resolution smearing failed: {e}")))?;
        let x = smear_x.sample(&mut self.rng);
        let smear_y = Normal::new(y, self.res_y)
            .map_err(|e| AppError::numeric(format!("Resolution smearing failed: {e}")))?;
        let y = smear_y.sample(&mut self.rng);
        Ok((x, y))
    }

    /// Generate a full toy scan into one shared 2D histogram.
    ///
    /// For each step: set the swept parameter, compute the true rate
    /// `80.0 × integral`, draw the event count from a Poisson of that mean,
    /// and sample that many smeared vertices. Returns the histogram and the
    /// total event count; the swept parameter is reset to 0 afterwards.
    pub fn generate(
        &mut self,
        param_index: usize,
        positions: &[f64],
        nbins: usize,
    ) -> Result<(Hist2d, u64), AppError> {
        if positions.is_empty() {
            return Err(AppError::empty("Toy generation needs at least one step."));
        }

        let mut hist = Hist2d::new(
            nbins,
            -TOY_HIST_HALF_WIDTH,
            TOY_HIST_HALF_WIDTH,
            nbins,
            -TOY_HIST_HALF_WIDTH,
            TOY_HIST_HALF_WIDTH,
        )?;

        let mut total = 0u64;
        for (step, &pos) in positions.iter().enumerate() {
            self.density.set_parameter(param_index, pos)?;
            let rate = TOY_RATE_SCALE * self.density.integral()?;
            let count = poisson_count(&mut self.rng, rate)? as u64;
            if self.verbose {
                eprintln!("<<< Step {step}: generating {count} events");
            }
            if count > 0 {
                // The cached cell distribution depends on the swept
                // parameter, so the sampler is rebuilt per step.
                let sampler = GridSampler2d::for_density(&self.density)?;
                for _ in 0..count {
                    let (x, y) = self.sample_point(&sampler)?;
                    hist.fill(x, y);
                }
            }
            total += count;
        }
        self.density.set_parameter(param_index, 0.0)?;

        Ok((hist, total))
    }
}

/// Poisson draw with the original engine's convention for degenerate means:
/// a non-positive mean yields zero events instead of an error.
pub(crate) fn poisson_count(rng: &mut StdRng, mean: f64) -> Result<f64, AppError> {
    if !mean.is_finite() {
        return Err(AppError::numeric(format!(
            "Poisson mean must be finite (got {mean})."
        )));
    }
    if mean <= 0.0 {
        return Ok(0.0);
    }
    let dist = Poisson::new(mean)
        .map_err(|e| AppError::numeric(format!("Poisson draw failed for mean {mean}: {e}")))?;
    Ok(dist.sample(rng))
}
