//! Error function and normal CDF.
//!
//! The scan fit model uses truncated Gaussian components, whose normalization
//! needs `Φ((hi−μ)/σ) − Φ((lo−μ)/σ)`. A polynomial approximation is plenty
//! here: the normalization enters the fit as a smooth factor and the fitted
//! parameters are resolved to ~1e-3 by the data anyway.

/// Error function (Abramowitz & Stegun 7.1.26, |ε| < 1.5e-7).
pub fn erf(x: f64) -> f64 {
    if x < 0.0 {
        return -erf(-x);
    }
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let poly = t * (A1 + t * (A2 + t * (A3 + t * (A4 + t * A5))));
    1.0 - poly * (-x * x).exp()
}

/// Standard normal CDF: `Φ(x) = (1 + erf(x/√2)) / 2`.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erf_known_values() {
        assert!(erf(0.0).abs() < 1e-12);
        assert!((erf(1.0) - 0.8427007929).abs() < 1e-6);
        assert!((erf(-1.0) + 0.8427007929).abs() < 1e-6);
        assert!((erf(3.0) - 0.9999779095).abs() < 1e-6);
    }

    #[test]
    fn normal_cdf_symmetry() {
        for &x in &[0.1, 0.7, 1.3, 2.5] {
            let hi = normal_cdf(x);
            let lo = normal_cdf(-x);
            assert!((hi + lo - 1.0).abs() < 1e-7, "Φ({x}) + Φ(−{x}) should be 1");
        }
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-12);
    }
}
