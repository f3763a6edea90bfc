//! Bounded 2D numerical integration.
//!
//! The overlap densities are smooth products of Gaussians evaluated over a
//! fixed square, so a tensor Gauss–Legendre rule on a uniform panel grid
//! converges very fast. We refine by doubling the panel count per axis until
//! two successive estimates agree to tolerance.
//!
//! Panels are independent, so each refinement pass fans out over rayon and is
//! reduced in panel order (the reduction order is fixed, keeping results
//! deterministic across runs and thread counts).

use rayon::prelude::*;

use crate::error::AppError;

/// Relative tolerance for successive panel refinements.
pub const DEFAULT_REL_TOL: f64 = 1e-9;
/// Absolute floor below which agreement is accepted regardless of scale.
pub const DEFAULT_ABS_TOL: f64 = 1e-12;

/// Initial panels per axis; doubled on each refinement.
const INITIAL_PANELS: usize = 8;
/// Refinement cap. 8 → 16 → 32 → 64 → 128 panels per axis.
const MAX_REFINEMENTS: usize = 4;

/// 16-point Gauss–Legendre abscissae (positive half) on [-1, 1].
const GL_X: [f64; 8] = [
    0.0950125098376374,
    0.2816035507792589,
    0.4580167776572274,
    0.6178762444026438,
    0.7554044083550030,
    0.8656312023878318,
    0.9445750230732326,
    0.9894009349916499,
];

/// Matching 16-point Gauss–Legendre weights.
const GL_W: [f64; 8] = [
    0.1894506104550685,
    0.1826034150449236,
    0.1691565193950025,
    0.1495959888165767,
    0.1246289712555339,
    0.0951585116824928,
    0.0622535239386479,
    0.0271524594117541,
];

/// Integrate `f` over the rectangle `[xlo, xhi] × [ylo, yhi]`.
///
/// Returns an error if the bounds are degenerate or the refinement loop fails
/// to converge (a non-smooth or non-finite integrand).
pub fn integrate2d<F>(f: F, xlo: f64, xhi: f64, ylo: f64, yhi: f64) -> Result<f64, AppError>
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    if !(xlo.is_finite() && xhi.is_finite() && ylo.is_finite() && yhi.is_finite()) {
        return Err(AppError::config("Integration bounds must be finite."));
    }
    if xhi <= xlo || yhi <= ylo {
        return Err(AppError::config(format!(
            "Invalid integration rectangle: x=[{xlo}, {xhi}], y=[{ylo}, {yhi}]."
        )));
    }

    let mut panels = INITIAL_PANELS;
    let mut previous = panel_sum(&f, xlo, xhi, ylo, yhi, panels);

    for _ in 0..MAX_REFINEMENTS {
        panels *= 2;
        let current = panel_sum(&f, xlo, xhi, ylo, yhi, panels);

        let delta = (current - previous).abs();
        if current.is_finite() && delta <= DEFAULT_ABS_TOL.max(DEFAULT_REL_TOL * current.abs()) {
            return Ok(current);
        }
        previous = current;
    }

    if previous.is_finite() {
        // One more agreement check against the finest grid would need another
        // doubling; treat a finite but unconverged estimate as failure so the
        // caller sees a tolerance problem instead of a silently loose number.
        Err(AppError::numeric(format!(
            "2D integration did not converge to tolerance {DEFAULT_REL_TOL:e} \
             ({panels} panels per axis)."
        )))
    } else {
        Err(AppError::numeric(
            "2D integration produced a non-finite estimate.",
        ))
    }
}

/// Tensor Gauss–Legendre sum over a `panels × panels` grid.
fn panel_sum<F>(f: &F, xlo: f64, xhi: f64, ylo: f64, yhi: f64, panels: usize) -> f64
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    let hx = (xhi - xlo) / panels as f64;
    let hy = (yhi - ylo) / panels as f64;

    // Expand the symmetric half-rule into full node/weight lists once.
    let mut nodes = Vec::with_capacity(16);
    for k in 0..8 {
        nodes.push((-GL_X[k], GL_W[k]));
        nodes.push((GL_X[k], GL_W[k]));
    }

    let rows: Vec<f64> = (0..panels)
        .into_par_iter()
        .map(|iy| {
            let yc = ylo + (iy as f64 + 0.5) * hy;
            let mut row = 0.0;
            for ix in 0..panels {
                let xc = xlo + (ix as f64 + 0.5) * hx;
                let mut cell = 0.0;
                for &(uy, wy) in &nodes {
                    let y = yc + 0.5 * hy * uy;
                    for &(ux, wx) in &nodes {
                        let x = xc + 0.5 * hx * ux;
                        cell += wx * wy * f(x, y);
                    }
                }
                row += cell;
            }
            row * 0.25 * hx * hy
        })
        .collect();

    // Sequential reduction in row order.
    rows.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn integrates_constant_exactly() {
        let v = integrate2d(|_, _| 2.5, 0.0, 2.0, -1.0, 1.0).unwrap();
        assert!((v - 10.0).abs() < 1e-12);
    }

    #[test]
    fn integrates_separable_polynomial_exactly() {
        // ∫0..1 x^2 dx * ∫0..2 y dy = (1/3) * 2 = 2/3
        let v = integrate2d(|x, y| x * x * y, 0.0, 1.0, 0.0, 2.0).unwrap();
        assert!((v - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn unit_gaussian_normalizes_over_wide_box() {
        let norm = 1.0 / (2.0 * PI);
        let v = integrate2d(
            |x, y| norm * (-0.5 * (x * x + y * y)).exp(),
            -30.0,
            30.0,
            -30.0,
            30.0,
        )
        .unwrap();
        assert!((v - 1.0).abs() < 1e-8, "got {v}");
    }

    #[test]
    fn narrow_gaussian_still_converges() {
        // σ = 0.5 peak inside a ±30 box stresses the panel refinement.
        let sigma: f64 = 0.5;
        let norm = 1.0 / (2.0 * PI * sigma * sigma);
        let v = integrate2d(
            |x, y| norm * (-0.5 * (x * x + y * y) / (sigma * sigma)).exp(),
            -30.0,
            30.0,
            -30.0,
            30.0,
        )
        .unwrap();
        assert!((v - 1.0).abs() < 1e-6, "got {v}");
    }

    #[test]
    fn rejects_degenerate_bounds() {
        assert!(integrate2d(|_, _| 1.0, 1.0, 1.0, 0.0, 1.0).is_err());
        assert!(integrate2d(|_, _| 1.0, 0.0, 1.0, f64::NAN, 1.0).is_err());
    }
}
