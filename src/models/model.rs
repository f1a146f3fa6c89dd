//! Peak model evaluation.
//!
//! The fitter relies on three primitive operations:
//! - evaluate `y(x)` for a parameter set (for residuals/plots)
//! - fill the gradient row `df/dp` at a given `x` (for the Jacobian)
//! - build a data-derived initial guess
//!
//! These are implemented on [`GaussianLine`], the one model this crate
//! ships: a single Gaussian peak on a straight-line background.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Width of the Gaussian term at half its height, per unit sigma:
/// `2 * sqrt(2 * ln 2)`.
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949_3;

/// Gaussian-plus-line model parameters.
///
/// The curve is
/// `y = offset + slope * x + height * exp(-((x - center) / sigma)^2 / 2)`.
///
/// `sigma` enters the model through its square, so its sign carries no
/// information; fit results normalize it to be non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianLine {
    pub offset: f64,
    pub slope: f64,
    pub height: f64,
    pub center: f64,
    pub sigma: f64,
}

impl Default for GaussianLine {
    /// Unit peak at the origin on a zero baseline.
    fn default() -> Self {
        Self {
            offset: 0.0,
            slope: 0.0,
            height: 1.0,
            center: 0.0,
            sigma: 1.0,
        }
    }
}

impl GaussianLine {
    /// Number of free parameters.
    pub const N_PARAMS: usize = 5;

    pub fn new(offset: f64, slope: f64, height: f64, center: f64, sigma: f64) -> Self {
        Self {
            offset,
            slope,
            height,
            center,
            sigma,
        }
    }

    /// Evaluate the model at `x`.
    ///
    /// A zero `sigma` yields a non-finite value; the solver treats such
    /// steps as rejected.
    pub fn eval(&self, x: f64) -> f64 {
        let z = (x - self.center) / self.sigma;
        self.offset + self.slope * x + self.height * (-0.5 * z * z).exp()
    }

    /// Fill `out` with the partial derivatives
    /// `(df/doffset, df/dslope, df/dheight, df/dcenter, df/dsigma)` at `x`.
    ///
    /// # Panics
    /// Panics if `out` does not have length [`GaussianLine::N_PARAMS`].
    /// Callers should size the row correctly.
    pub fn fill_gradient_row(&self, x: f64, out: &mut [f64]) {
        let z = (x - self.center) / self.sigma;
        let g = (-0.5 * z * z).exp();
        out[0] = 1.0;
        out[1] = x;
        out[2] = g;
        out[3] = self.height * g * z / self.sigma;
        out[4] = self.height * g * z * z / self.sigma;
    }

    /// Coarse, format-agnostic starting point for typical single-peak data:
    /// offset at the lowest observed value, height as a fraction of the
    /// observed range, center at the midpoint of the domain, flat slope,
    /// unit sigma.
    ///
    /// # Panics
    /// Panics if `x` or `y` is empty. The fitter validates input before
    /// calling this.
    pub fn initial_guess(x: &[f64], y: &[f64]) -> Self {
        assert!(!x.is_empty() && !y.is_empty());
        let (y_min, y_max) = min_max(y);
        let (x_min, x_max) = min_max(x);
        Self {
            offset: y_min,
            slope: 0.0,
            height: 0.6 * (y_max - y_min),
            center: 0.5 * (x_min + x_max),
            sigma: 1.0,
        }
    }

    /// Full width at half maximum of the Gaussian term.
    pub fn fwhm(&self) -> f64 {
        FWHM_PER_SIGMA * self.sigma.abs()
    }

    /// Same parameters with `sigma` normalized to its absolute value.
    pub fn abs_sigma(mut self) -> Self {
        self.sigma = self.sigma.abs();
        self
    }

    /// Parameter vector in `(offset, slope, height, center, sigma)` order.
    pub fn to_vector(&self) -> DVector<f64> {
        DVector::from_row_slice(&[self.offset, self.slope, self.height, self.center, self.sigma])
    }

    /// Rebuild parameters from a vector in the same order as
    /// [`GaussianLine::to_vector`].
    ///
    /// # Panics
    /// Panics if `v` does not have length [`GaussianLine::N_PARAMS`].
    pub fn from_vector(v: &DVector<f64>) -> Self {
        assert_eq!(v.len(), Self::N_PARAMS);
        Self {
            offset: v[0],
            slope: v[1],
            height: v[2],
            center: v[3],
            sigma: v[4],
        }
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo, hi)
}
