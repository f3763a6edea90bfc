//! Analytic beam-overlap density.
//!
//! The density is the pointwise product of two beam profiles; each beam is a
//! weighted mixture of 1–3 correlated 2D Gaussians sharing one center per
//! beam. Parameters live in one ordered vector so a scan can sweep a single
//! scalar (a beam-center coordinate) by position without rebuilding the
//! density.
//!
//! Parameter layout (`factor` always last):
//!
//! ```text
//! [x01, y01, x02, y02,                      beam centers
//!  xw_n1, yw_n1, xw_n2, yw_n2, rho_n1, rho_n2,   first (narrow) tier
//!  w1, w2,                                  free weights, Double/Triple only
//!  xw_m1, yw_m1, xw_m2, yw_m2, rho_m1, rho_m2,   second tier
//!  w1', w2',                                Triple only
//!  xw_w1, yw_w1, xw_w2, yw_w2, rho_w1, rho_w2,   third tier
//!  factor]
//! ```
//!
//! Evaluation is restricted by convention to the ±30 square; integration and
//! sampling both use that domain.

use crate::domain::{BeamConfig, BeamShape, OverlapVariant};
use crate::error::AppError;
use crate::math::integrate2d;

/// Half-width of the square evaluation domain.
pub const DOMAIN_HALF_WIDTH: f64 = 30.0;

/// Parameter indices of the four beam-center coordinates (the quantities a
/// separation scan sweeps).
pub const PAR_X1: usize = 0;
pub const PAR_Y1: usize = 1;
pub const PAR_X2: usize = 2;
pub const PAR_Y2: usize = 3;

/// Normalized bivariate Gaussian with correlation, scaled by `factor`.
///
/// Undefined at |rho| = 1 and zero widths; construction through
/// [`OverlapDensity::from_config`] guards those, direct calls do not.
pub fn gaussian(
    x: f64,
    y: f64,
    x0: f64,
    y0: f64,
    x_width: f64,
    y_width: f64,
    rho: f64,
    factor: f64,
) -> f64 {
    let xx = (x - x0) / x_width;
    let yy = (y - y0) / y_width;
    let one_minus_rho2 = 1.0 - rho * rho;
    let norm = 2.0 * std::f64::consts::PI * one_minus_rho2.sqrt() * (x_width * y_width).abs();
    let arg = -0.5 / one_minus_rho2 * (xx * xx + yy * yy - 2.0 * rho * xx * yy);
    factor / norm * arg.exp()
}

/// A validated overlap density over an ordered parameter vector.
#[derive(Debug, Clone)]
pub struct OverlapDensity {
    variant: OverlapVariant,
    params: Vec<f64>,
}

impl OverlapDensity {
    /// Build a density from a beam configuration.
    ///
    /// Fails if widths, correlations, or weights are out of domain; the
    /// density itself never produces NaN for parameters accepted here.
    pub fn from_config(config: &BeamConfig) -> Result<Self, AppError> {
        config.validate()?;

        let variant = config.variant;
        let mut params = vec![0.0; variant.param_count()];
        params[PAR_X1] = config.beam1.x0;
        params[PAR_Y1] = config.beam1.y0;
        params[PAR_X2] = config.beam2.x0;
        params[PAR_Y2] = config.beam2.y0;

        let tier = |params: &mut Vec<f64>, base: usize, b1: &BeamShape, b2: &BeamShape, t: usize| {
            params[base] = b1.components[t].x_width;
            params[base + 1] = b1.components[t].y_width;
            params[base + 2] = b2.components[t].x_width;
            params[base + 3] = b2.components[t].y_width;
            params[base + 4] = b1.components[t].rho;
            params[base + 5] = b2.components[t].rho;
        };

        tier(&mut params, 4, &config.beam1, &config.beam2, 0);
        match variant {
            OverlapVariant::Single => {}
            OverlapVariant::Double => {
                params[10] = config.beam1.weights[0];
                params[11] = config.beam2.weights[0];
                tier(&mut params, 12, &config.beam1, &config.beam2, 1);
            }
            OverlapVariant::Triple => {
                params[10] = config.beam1.weights[0];
                params[11] = config.beam2.weights[0];
                tier(&mut params, 12, &config.beam1, &config.beam2, 1);
                params[18] = config.beam1.weights[1];
                params[19] = config.beam2.weights[1];
                tier(&mut params, 20, &config.beam1, &config.beam2, 2);
            }
        }
        let last = params.len() - 1;
        params[last] = config.factor;

        Ok(Self { variant, params })
    }

    pub fn variant(&self) -> OverlapVariant {
        self.variant
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Read one scalar parameter by position.
    pub fn parameter(&self, index: usize) -> Result<f64, AppError> {
        self.params
            .get(index)
            .copied()
            .ok_or_else(|| self.index_error(index))
    }

    /// Mutate one scalar parameter by position.
    ///
    /// This is the sweep hook: a separation scan updates a beam-center
    /// coordinate between evaluations without rebuilding the density.
    pub fn set_parameter(&mut self, index: usize, value: f64) -> Result<(), AppError> {
        match self.params.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.index_error(index)),
        }
    }

    fn index_error(&self, index: usize) -> AppError {
        AppError::config(format!(
            "Parameter index {index} out of range for {} density ({} parameters).",
            self.variant.display_name(),
            self.params.len()
        ))
    }

    /// Density value at `(x, y)`: product of the two per-beam mixture sums.
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let p = &self.params;
        let factor = p[p.len() - 1];

        match self.variant {
            OverlapVariant::Single => {
                let beam1 = gaussian(x, y, p[0], p[1], p[4], p[5], p[8], factor);
                let beam2 = gaussian(x, y, p[2], p[3], p[6], p[7], p[9], factor);
                beam1 * beam2
            }
            OverlapVariant::Double => {
                let n1 = gaussian(x, y, p[0], p[1], p[4], p[5], p[8], factor);
                let m1 = gaussian(x, y, p[0], p[1], p[12], p[13], p[16], factor);
                let n2 = gaussian(x, y, p[2], p[3], p[6], p[7], p[9], factor);
                let m2 = gaussian(x, y, p[2], p[3], p[14], p[15], p[17], factor);
                let (w1, w2) = (p[10], p[11]);
                (w1 * n1 + (1.0 - w1) * m1) * (w2 * n2 + (1.0 - w2) * m2)
            }
            OverlapVariant::Triple => {
                let n1 = gaussian(x, y, p[0], p[1], p[4], p[5], p[8], factor);
                let m1 = gaussian(x, y, p[0], p[1], p[12], p[13], p[16], factor);
                let wide1 = gaussian(x, y, p[0], p[1], p[20], p[21], p[24], factor);
                let n2 = gaussian(x, y, p[2], p[3], p[6], p[7], p[9], factor);
                let m2 = gaussian(x, y, p[2], p[3], p[14], p[15], p[17], factor);
                let wide2 = gaussian(x, y, p[2], p[3], p[22], p[23], p[25], factor);
                let (w1n, w2n) = (p[10], p[11]);
                let (w1m, w2m) = (p[18], p[19]);
                (w1n * n1 + w1m * m1 + (1.0 - w1n - w1m) * wide1)
                    * (w2n * n2 + w2m * m2 + (1.0 - w2n - w2m) * wide2)
            }
        }
    }

    /// Numerical integral of the density over the ±30 square.
    pub fn integral(&self) -> Result<f64, AppError> {
        integrate2d(
            |x, y| self.evaluate(x, y),
            -DOMAIN_HALF_WIDTH,
            DOMAIN_HALF_WIDTH,
            -DOMAIN_HALF_WIDTH,
            DOMAIN_HALF_WIDTH,
        )
    }
}
