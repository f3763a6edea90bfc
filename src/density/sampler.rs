//! Grid-based inverse-CDF sampler for a 2D density.
//!
//! The density is discretized into cells over the ±30 square; a cumulative
//! cell distribution maps one uniform draw to a cell and the point is placed
//! uniformly inside it. Resolution is governed by the grid size (cells much
//! smaller than the narrowest beam width).
//!
//! The distribution table caches the density's current parameters, so a
//! sampler must be rebuilt after any parameter change.

use rand::Rng;
use rand::rngs::StdRng;

use crate::density::{DOMAIN_HALF_WIDTH, OverlapDensity};
use crate::error::AppError;

/// Default cells per axis (0.3 units per cell over ±30).
pub const DEFAULT_GRID: usize = 200;

/// Frozen cumulative cell distribution for one density configuration.
#[derive(Debug, Clone)]
pub struct GridSampler2d {
    nx: usize,
    ny: usize,
    cell_dx: f64,
    cell_dy: f64,
    /// Cumulative (unnormalized) cell masses in row-major order.
    cumulative: Vec<f64>,
    total: f64,
}

impl GridSampler2d {
    /// Tabulate the density over an `nx × ny` cell grid.
    ///
    /// Fails when the density has no mass on the domain (all cells zero).
    pub fn build(density: &OverlapDensity, nx: usize, ny: usize) -> Result<Self, AppError> {
        if nx == 0 || ny == 0 {
            return Err(AppError::config("Sampler grid must have at least one cell."));
        }

        let cell_dx = 2.0 * DOMAIN_HALF_WIDTH / nx as f64;
        let cell_dy = 2.0 * DOMAIN_HALF_WIDTH / ny as f64;

        let mut cumulative = Vec::with_capacity(nx * ny);
        let mut running = 0.0;
        for iy in 0..ny {
            let y = -DOMAIN_HALF_WIDTH + (iy as f64 + 0.5) * cell_dy;
            for ix in 0..nx {
                let x = -DOMAIN_HALF_WIDTH + (ix as f64 + 0.5) * cell_dx;
                let mass = density.evaluate(x, y).max(0.0);
                running += mass;
                cumulative.push(running);
            }
        }

        if !(running.is_finite() && running > 0.0) {
            return Err(AppError::numeric(
                "Density has no positive mass on the sampling domain.",
            ));
        }

        Ok(Self {
            nx,
            ny,
            cell_dx,
            cell_dy,
            cumulative,
            total: running,
        })
    }

    /// Tabulate with the default grid.
    pub fn for_density(density: &OverlapDensity) -> Result<Self, AppError> {
        Self::build(density, DEFAULT_GRID, DEFAULT_GRID)
    }

    /// Draw one point distributed per the tabulated density.
    pub fn sample(&self, rng: &mut StdRng) -> (f64, f64) {
        let target: f64 = rng.r#gen::<f64>() * self.total;
        let cell = self.cumulative.partition_point(|&c| c <= target);
        let cell = cell.min(self.cumulative.len() - 1);

        let ix = cell % self.nx;
        let iy = cell / self.nx;

        let ux: f64 = rng.r#gen();
        let uy: f64 = rng.r#gen();
        let x = -DOMAIN_HALF_WIDTH + (ix as f64 + ux) * self.cell_dx;
        let y = -DOMAIN_HALF_WIDTH + (iy as f64 + uy) * self.cell_dy;
        (x, y)
    }
}
