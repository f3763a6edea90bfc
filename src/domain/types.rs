//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can
//! be:
//!
//! - used in-memory during simulation and fitting
//! - read from / written to JSON configuration and summary files
//! - reloaded later for comparisons across runs

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// How many Gaussian components each beam's mixture carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverlapVariant {
    /// One component per beam, no mixture weights.
    Single,
    /// Two components per beam, one free weight per beam.
    Double,
    /// Three components per beam, two free weights per beam.
    Triple,
}

impl OverlapVariant {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            OverlapVariant::Single => "single-Gaussian",
            OverlapVariant::Double => "double-Gaussian",
            OverlapVariant::Triple => "triple-Gaussian",
        }
    }

    /// Components per beam mixture.
    pub fn components_per_beam(self) -> usize {
        match self {
            OverlapVariant::Single => 1,
            OverlapVariant::Double => 2,
            OverlapVariant::Triple => 3,
        }
    }

    /// Free mixture weights per beam (the last weight is implied).
    pub fn weights_per_beam(self) -> usize {
        self.components_per_beam() - 1
    }

    /// Length of the ordered parameter vector for this variant.
    ///
    /// Layout: two beam centers (4), then per component tier the four widths
    /// and two correlations of both beams (6 each), with the free weights of
    /// both beams inserted after the first tier, and the global factor last.
    pub fn param_count(self) -> usize {
        match self {
            OverlapVariant::Single => 11,
            OverlapVariant::Double => 19,
            OverlapVariant::Triple => 27,
        }
    }
}

/// One correlated 2D Gaussian term of a beam's mixture.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BeamComponent {
    pub x_width: f64,
    pub y_width: f64,
    /// Correlation between the two axes, in (−1, 1).
    pub rho: f64,
}

/// One beam: a shared center plus 1–3 components and their mixture weights.
///
/// `weights` holds the free weights only; the last component's weight is
/// `1 − Σ weights`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamShape {
    pub x0: f64,
    pub y0: f64,
    pub components: Vec<BeamComponent>,
    #[serde(default)]
    pub weights: Vec<f64>,
}

/// Full analysis configuration for an overlap density.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeamConfig {
    pub variant: OverlapVariant,
    pub beam1: BeamShape,
    pub beam2: BeamShape,
    /// Global scale applied per Gaussian component.
    #[serde(default = "default_factor")]
    pub factor: f64,
}

fn default_factor() -> f64 {
    1.0
}

impl BeamConfig {
    /// Built-in beam shapes per variant, used when no configuration file is
    /// given. Widths are in the scan's transverse-position units and sit well
    /// inside the ±30 evaluation domain.
    pub fn default_for(variant: OverlapVariant) -> Self {
        let tiers: &[(f64, f64)] = match variant {
            OverlapVariant::Single => &[(2.0, 2.0)],
            OverlapVariant::Double => &[(1.8, 1.9), (3.0, 3.2)],
            OverlapVariant::Triple => &[(1.6, 1.7), (2.6, 2.7), (4.0, 4.2)],
        };
        let weights: Vec<f64> = match variant {
            OverlapVariant::Single => vec![],
            OverlapVariant::Double => vec![0.7],
            OverlapVariant::Triple => vec![0.6, 0.3],
        };

        let beam = |dx: f64| BeamShape {
            x0: 0.0,
            y0: 0.0,
            components: tiers
                .iter()
                .map(|&(xw, yw)| BeamComponent {
                    x_width: xw + dx,
                    y_width: yw,
                    rho: 0.0,
                })
                .collect(),
            weights: weights.clone(),
        };

        // The two beams are given slightly different widths so the overlap is
        // not artificially symmetric.
        BeamConfig {
            variant,
            beam1: beam(0.0),
            beam2: beam(0.1),
            factor: 1.0,
        }
    }

    /// Validate the configuration against the density's domain requirements.
    pub fn validate(&self) -> Result<(), AppError> {
        for (label, beam) in [("beam1", &self.beam1), ("beam2", &self.beam2)] {
            let want = self.variant.components_per_beam();
            if beam.components.len() != want {
                return Err(AppError::config(format!(
                    "{label}: {} variant needs {want} component(s), got {}.",
                    self.variant.display_name(),
                    beam.components.len()
                )));
            }
            if beam.weights.len() != self.variant.weights_per_beam() {
                return Err(AppError::config(format!(
                    "{label}: {} variant needs {} free weight(s), got {}.",
                    self.variant.display_name(),
                    self.variant.weights_per_beam(),
                    beam.weights.len()
                )));
            }
            if !(beam.x0.is_finite() && beam.y0.is_finite()) {
                return Err(AppError::config(format!("{label}: non-finite center.")));
            }
            for (i, c) in beam.components.iter().enumerate() {
                if !(c.x_width.is_finite() && c.x_width > 0.0)
                    || !(c.y_width.is_finite() && c.y_width > 0.0)
                {
                    return Err(AppError::config(format!(
                        "{label} component {i}: widths must be positive and finite \
                         (got {}, {}).",
                        c.x_width, c.y_width
                    )));
                }
                if !(c.rho.is_finite() && c.rho.abs() < 1.0) {
                    return Err(AppError::config(format!(
                        "{label} component {i}: correlation must satisfy |rho| < 1 \
                         (got {}).",
                        c.rho
                    )));
                }
            }
            let mut sum = 0.0;
            for (i, &w) in beam.weights.iter().enumerate() {
                if !(w.is_finite() && (0.0..=1.0).contains(&w)) {
                    return Err(AppError::config(format!(
                        "{label} weight {i}: must be in [0, 1] (got {w})."
                    )));
                }
                sum += w;
            }
            if sum > 1.0 {
                return Err(AppError::config(format!(
                    "{label}: free weights sum to {sum:.4} > 1."
                )));
            }
        }
        if !self.factor.is_finite() {
            return Err(AppError::config("Non-finite global factor."));
        }
        Ok(())
    }
}

/// RNG seeding policy.
///
/// The original convention was "seed 0 means seed from entropy"; here the two
/// cases are spelled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    /// Seed from OS entropy; runs are not reproducible.
    Entropy,
    /// Fixed seed; the full simulation is deterministic.
    Fixed(u64),
}

/// One scan step: beam separations and the observed count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanRecord {
    pub step: usize,
    pub pos1: f64,
    pub pos2: f64,
    pub count: f64,
}

/// Fitted scan-profile parameters and fit diagnostics.
///
/// `width2` is always the resolved second width, whether it was fitted freely
/// or expressed as `width1 + width_diff`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFit {
    pub mean1: f64,
    pub mean2: f64,
    pub width1: f64,
    pub width2: f64,
    /// Fitted `width2 − width1`, present only for the parametrized fit.
    pub width_diff: Option<f64>,
    /// Mixture fraction of the first Gaussian.
    pub fraction: f64,
    /// Chi-square of the fitted model over the profile.
    pub chi2: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Everything a simulated scan reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Maximum of the fitted curve over the step domain, in event counts.
    pub peak: f64,
    /// Integral of the fitted curve over the step domain.
    pub area: f64,
    /// Fit chi-square divided by degrees of freedom; NaN when dof ≤ 0.
    pub chisq_per_dof: f64,
    /// Total observed events across all steps.
    pub nevents: f64,
    pub fit: ScanFit,
    pub records: Vec<ScanRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_validate_for_all_variants() {
        for variant in [
            OverlapVariant::Single,
            OverlapVariant::Double,
            OverlapVariant::Triple,
        ] {
            let config = BeamConfig::default_for(variant);
            config.validate().unwrap();
            assert_eq!(
                config.beam1.components.len(),
                variant.components_per_beam()
            );
        }
    }

    #[test]
    fn validate_rejects_bad_rho_and_widths() {
        let mut config = BeamConfig::default_for(OverlapVariant::Single);
        config.beam1.components[0].rho = 1.0;
        assert!(config.validate().is_err());

        let mut config = BeamConfig::default_for(OverlapVariant::Single);
        config.beam2.components[0].x_width = 0.0;
        assert!(config.validate().is_err());

        let mut config = BeamConfig::default_for(OverlapVariant::Double);
        config.beam1.weights[0] = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_component_count_mismatch() {
        let mut config = BeamConfig::default_for(OverlapVariant::Double);
        config.beam1.components.pop();
        assert!(config.validate().is_err());
    }
}
