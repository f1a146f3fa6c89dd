//! Peak fitting orchestration.
//!
//! Given paired `(x, y)` observations we:
//! - validate the sample (equal lengths, minimum size, finite values)
//! - build a data-derived initial parameter guess
//! - minimize the residual `model(x) - y` with Levenberg-Marquardt
//! - normalize sigma and derive the peak width
//!
//! Non-convergence is surfaced in the returned report, never as an error.

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitQuality, FitReport, SolverSummary};
use crate::error::ScanError;
use crate::math::{LmOptions, ResidualProblem, minimize};
use crate::models::GaussianLine;

/// Minimum sample size: one point per free parameter.
pub const MIN_POINTS: usize = GaussianLine::N_PARAMS;

/// Abstract curve-fit capability.
///
/// One concrete implementation ships today ([`GaussianFit`]); variants for
/// other peak shapes can be added as siblings without changing callers that
/// depend only on this trait.
pub trait CurveFit {
    /// Refined parameter type produced by the fit.
    type Model;

    /// Human-readable model name for reports and exports.
    fn model_name(&self) -> &'static str;

    /// Fit the model to paired observations.
    fn fit(&self, x: &[f64], y: &[f64]) -> Result<FitReport<Self::Model>, ScanError>;
}

/// Gaussian-on-a-line fit with a data-derived starting point.
#[derive(Debug, Clone, Default)]
pub struct GaussianFit {
    pub options: LmOptions,
}

impl GaussianFit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LmOptions) -> Self {
        Self { options }
    }
}

impl CurveFit for GaussianFit {
    type Model = GaussianLine;

    fn model_name(&self) -> &'static str {
        "gaussian+line"
    }

    fn fit(&self, x: &[f64], y: &[f64]) -> Result<FitReport<GaussianLine>, ScanError> {
        validate_sample(x, y)?;

        let guess = GaussianLine::initial_guess(x, y);
        let problem = PeakProblem { x, y };
        let outcome = minimize(&problem, guess.to_vector(), &self.options);

        let model = GaussianLine::from_vector(&outcome.params).abs_sigma();
        Ok(FitReport {
            model,
            fwhm: model.fwhm(),
            quality: FitQuality::from_sse(outcome.sse, x.len()),
            solver: SolverSummary {
                status: outcome.status,
                iterations: outcome.iterations,
            },
        })
    }
}

/// Residuals `model(x_i) - y_i` for the Gaussian-plus-line model.
struct PeakProblem<'a> {
    x: &'a [f64],
    y: &'a [f64],
}

impl ResidualProblem for PeakProblem<'_> {
    fn residual_count(&self) -> usize {
        self.x.len()
    }

    fn parameter_count(&self) -> usize {
        GaussianLine::N_PARAMS
    }

    fn fill_residuals(&self, params: &DVector<f64>, out: &mut DVector<f64>) {
        let model = GaussianLine::from_vector(params);
        for (i, (&x, &y)) in self.x.iter().zip(self.y).enumerate() {
            out[i] = model.eval(x) - y;
        }
    }

    fn fill_jacobian(&self, params: &DVector<f64>, out: &mut DMatrix<f64>) {
        let model = GaussianLine::from_vector(params);
        let mut row = [0.0; GaussianLine::N_PARAMS];
        for (i, &x) in self.x.iter().enumerate() {
            model.fill_gradient_row(x, &mut row);
            for (j, &v) in row.iter().enumerate() {
                out[(i, j)] = v;
            }
        }
    }
}

fn validate_sample(x: &[f64], y: &[f64]) -> Result<(), ScanError> {
    if x.len() != y.len() {
        return Err(ScanError::fit_input(format!(
            "x and y must have equal length (got {} and {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < MIN_POINTS {
        return Err(ScanError::fit_input(format!(
            "need at least {MIN_POINTS} points for a {MIN_POINTS}-parameter model (got {})",
            x.len()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(ScanError::fit_input("x and y values must all be finite"));
    }
    Ok(())
}
