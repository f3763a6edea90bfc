//! Linear least squares solver.
//!
//! The Levenberg–Marquardt step repeatedly solves small damped systems of the
//! form:
//!
//! ```text
//! minimize ||J δ + r||^2 + λ ||D δ||^2
//! ```
//!
//! stacked as one tall least-squares problem. The parameter dimension is tiny
//! (5–6 columns), so a robust SVD solve is cheap and avoids trouble when the
//! Jacobian goes near-singular close to a flat direction of the chi-square.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails. A nearly
    // collinear Jacobian (two Gaussian components collapsing onto each other)
    // should still yield a usable step rather than aborting the fit.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_handles_tall_systems() {
        // Overdetermined consistent system: y = 1 + 2x on five points.
        let xs = [0.0, 0.5, 1.0, 1.5, 2.0];
        let mut rows = Vec::with_capacity(10);
        let mut ys = Vec::with_capacity(5);
        for &x in &xs {
            rows.push(1.0);
            rows.push(x);
            ys.push(1.0 + 2.0 * x);
        }
        let x = DMatrix::from_row_slice(5, 2, &rows);
        let y = DVector::from_row_slice(&ys);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-9);
        assert!((beta[1] - 2.0).abs() < 1e-9);
    }
}
