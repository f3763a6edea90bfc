//! Bounded Levenberg–Marquardt minimization.
//!
//! Minimizes `||r(p)||²` for a residual vector `r` over box-bounded
//! parameters. Bounds are enforced through a logistic transform to an
//! unbounded internal coordinate (the approach bounded minimizers in this
//! field use), so the damped step itself is unconstrained:
//!
//! ```text
//! p = lo + (hi − lo) · sigmoid(t)
//! ```
//!
//! The start point is the midpoint of each range (`t = 0`), matching the
//! convention of a bounded fit parameter with no explicit initial value.
//! The Jacobian is numeric (forward differences in `t`); each damped step is
//! solved as one stacked least-squares system via SVD.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::math::solve_least_squares;

#[derive(Debug, Clone, Copy)]
pub struct LevMarOptions {
    pub max_iterations: usize,
    /// Relative chi-square reduction below which the fit is converged.
    pub chi2_tol: f64,
    /// Internal-coordinate step norm below which the fit is converged.
    pub step_tol: f64,
    pub lambda_init: f64,
}

impl Default for LevMarOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            chi2_tol: 1e-10,
            step_tol: 1e-12,
            lambda_init: 1e-3,
        }
    }
}

/// Minimization outcome. Non-convergence is reported, not retried.
#[derive(Debug, Clone)]
pub struct LevMarResult {
    pub params: Vec<f64>,
    pub chi2: f64,
    pub iterations: usize,
    pub converged: bool,
}

fn sigmoid(t: f64) -> f64 {
    1.0 / (1.0 + (-t).exp())
}

fn to_external(t: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    t.iter()
        .zip(bounds)
        .map(|(&ti, &(lo, hi))| lo + (hi - lo) * sigmoid(ti))
        .collect()
}

/// Minimize `||residuals(p)||²` over box-bounded parameters.
///
/// `residuals` receives external (bounded) parameters and returns the residual
/// vector; an `Err` from it aborts the minimization.
pub fn minimize<F>(
    residuals: F,
    bounds: &[(f64, f64)],
    options: &LevMarOptions,
) -> Result<LevMarResult, AppError>
where
    F: Fn(&[f64]) -> Result<DVector<f64>, AppError>,
{
    if bounds.is_empty() {
        return Err(AppError::config("Fit needs at least one parameter."));
    }
    for &(lo, hi) in bounds {
        if !(lo.is_finite() && hi.is_finite() && hi > lo) {
            return Err(AppError::config(format!(
                "Invalid parameter range [{lo}, {hi}]."
            )));
        }
    }

    let n_params = bounds.len();
    let mut t = vec![0.0f64; n_params];
    let mut r = residuals(&to_external(&t, bounds))?;
    let mut chi2 = r.norm_squared();
    let mut lambda = options.lambda_init;
    let mut converged = false;
    let mut iterations = 0;

    for _ in 0..options.max_iterations {
        iterations += 1;

        // Forward-difference Jacobian in internal coordinates.
        let m = r.len();
        let mut jacobian = DMatrix::<f64>::zeros(m, n_params);
        for j in 0..n_params {
            let h = 1e-6 * (1.0 + t[j].abs());
            let mut t_probe = t.clone();
            t_probe[j] += h;
            let r_probe = residuals(&to_external(&t_probe, bounds))?;
            for i in 0..m {
                jacobian[(i, j)] = (r_probe[i] - r[i]) / h;
            }
        }

        // Marquardt column scaling keeps the damping meaningful when
        // parameters have very different sensitivities.
        let scales: Vec<f64> = (0..n_params)
            .map(|j| jacobian.column(j).norm().max(1e-12))
            .collect();

        // One damped step: stack [J; sqrt(λ)·D] against [−r; 0].
        let mut accepted = false;
        for _ in 0..12 {
            let mut stacked = DMatrix::<f64>::zeros(m + n_params, n_params);
            let mut rhs = DVector::<f64>::zeros(m + n_params);
            stacked.view_mut((0, 0), (m, n_params)).copy_from(&jacobian);
            for i in 0..m {
                rhs[i] = -r[i];
            }
            for j in 0..n_params {
                stacked[(m + j, j)] = lambda.sqrt() * scales[j];
            }

            let Some(delta) = solve_least_squares(&stacked, &rhs) else {
                lambda *= 10.0;
                continue;
            };

            let t_trial: Vec<f64> = t.iter().zip(delta.iter()).map(|(a, d)| a + d).collect();
            let r_trial = residuals(&to_external(&t_trial, bounds))?;
            let chi2_trial = r_trial.norm_squared();

            if chi2_trial.is_finite() && chi2_trial < chi2 {
                let reduction = (chi2 - chi2_trial) / chi2.max(1e-300);
                let step_norm = delta.norm();
                t = t_trial;
                r = r_trial;
                chi2 = chi2_trial;
                lambda = (lambda / 10.0).max(1e-12);
                accepted = true;
                if reduction < options.chi2_tol || step_norm < options.step_tol {
                    converged = true;
                }
                break;
            }
            lambda *= 10.0;
            if lambda > 1e12 {
                break;
            }
        }

        if converged || !accepted {
            // No acceptable step at maximal damping: a (possibly local)
            // minimum to the resolution of the numeric Jacobian.
            converged = converged || chi2.is_finite();
            break;
        }
    }

    Ok(LevMarResult {
        params: to_external(&t, bounds),
        chi2,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_gaussian_parameters_from_noiseless_data() {
        // y(x) = a · exp(−(x−m)² / 2s²) with known truth, residuals with unit
        // weights. Noiseless, so the minimum is exact.
        let truth = (2.0f64, 5.0f64, 1.5f64);
        let xs: Vec<f64> = (0..51).map(|i| 0.2 * i as f64).collect();
        let ys: Vec<f64> = xs
            .iter()
            .map(|&x| truth.0 * (-0.5 * ((x - truth.1) / truth.2).powi(2)).exp())
            .collect();

        let xs_for_fit = xs.clone();
        let residuals = move |p: &[f64]| {
            let (a, m, s) = (p[0], p[1], p[2]);
            Ok(DVector::from_iterator(
                xs_for_fit.len(),
                xs_for_fit
                    .iter()
                    .zip(&ys)
                    .map(|(&x, &y)| a * (-0.5 * ((x - m) / s).powi(2)).exp() - y),
            ))
        };

        let bounds = [(0.1, 10.0), (0.0, 10.0), (0.5, 5.0)];
        let fit = minimize(residuals, &bounds, &LevMarOptions::default()).unwrap();

        assert!(fit.converged);
        assert!(fit.chi2 < 1e-10, "chi2 = {}", fit.chi2);
        assert!((fit.params[0] - truth.0).abs() < 1e-4);
        assert!((fit.params[1] - truth.1).abs() < 1e-4);
        assert!((fit.params[2] - truth.2).abs() < 1e-4);
    }

    #[test]
    fn fitted_parameters_respect_their_bounds() {
        // Data pulls the parameter toward 10, but the box stops at 4.
        let residuals = |p: &[f64]| {
            Ok(DVector::from_row_slice(&[p[0] - 10.0]))
        };
        let bounds = [(1.0, 4.0)];
        let fit = minimize(residuals, &bounds, &LevMarOptions::default()).unwrap();
        assert!(fit.params[0] > 1.0 && fit.params[0] <= 4.0);
        assert!(fit.params[0] > 3.5, "should push against the upper bound");
    }

    #[test]
    fn rejects_empty_or_inverted_bounds() {
        let residuals = |_: &[f64]| Ok(DVector::from_row_slice(&[0.0]));
        assert!(minimize(residuals, &[], &LevMarOptions::default()).is_err());
        let residuals = |_: &[f64]| Ok(DVector::from_row_slice(&[0.0]));
        assert!(minimize(residuals, &[(2.0, 1.0)], &LevMarOptions::default()).is_err());
    }
}
