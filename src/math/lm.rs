//! Levenberg-Marquardt least squares.
//!
//! The fitter solves small nonlinear least-squares problems of the form:
//!
//! ```text
//! minimize Σ r_i(p)^2
//! ```
//!
//! where the residual vector and its Jacobian come from a model. The solver
//! is model-agnostic: anything implementing [`ResidualProblem`] can be
//! minimized.
//!
//! Implementation choices:
//! - Classic Marquardt damping: solve `(JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr`, then
//!   shrink λ on accepted steps and grow it on rejected ones.
//! - The damped normal matrix is solved by Cholesky. A failed factorization
//!   (rank-deficient Jacobian) is handled like an uphill step: inflate λ and
//!   retry.
//! - Steps that produce non-finite residuals are rejected the same way.
//! - Non-convergence is reported in the outcome status, never as an error;
//!   the best parameters seen so far are always returned.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Damping growth factor on a rejected step.
const LAMBDA_UP: f64 = 10.0;
/// Damping shrink factor on an accepted step.
const LAMBDA_DOWN: f64 = 0.1;
/// Damping floor; keeps accepted-step shrinking from reaching zero.
const LAMBDA_MIN: f64 = 1e-12;
/// Damping ceiling; past this the search counts as stalled.
const LAMBDA_MAX: f64 = 1e12;
/// Floor for the damped diagonal so zero-curvature columns stay positive.
const DIAG_FLOOR: f64 = 1e-12;

/// Residual system consumed by [`minimize`].
pub trait ResidualProblem {
    /// Number of residual entries (observations).
    fn residual_count(&self) -> usize;

    /// Number of free parameters.
    fn parameter_count(&self) -> usize;

    /// Write the residual vector at `params` into `out`.
    fn fill_residuals(&self, params: &DVector<f64>, out: &mut DVector<f64>);

    /// Write the Jacobian of the residuals at `params` into `out`
    /// (rows = observations, columns = parameters).
    fn fill_jacobian(&self, params: &DVector<f64>, out: &mut DMatrix<f64>);
}

/// Solver knobs. The defaults suit small single-peak spectroscopy fits.
#[derive(Debug, Clone)]
pub struct LmOptions {
    /// Hard cap on outer iterations.
    pub max_iterations: usize,
    /// Relative sum-of-squares decrease below which the fit has converged.
    pub ftol: f64,
    /// Relative step size below which the fit has converged.
    pub xtol: f64,
    /// Gradient infinity-norm below which the fit has converged.
    pub gtol: f64,
    /// Initial damping factor.
    pub lambda_init: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            lambda_init: 1e-3,
        }
    }
}

/// How the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LmStatus {
    /// A tolerance was met.
    Converged,
    /// The iteration cap was hit first.
    MaxIterations,
    /// Damping grew past its ceiling without finding a downhill step.
    Stalled,
}

impl LmStatus {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            LmStatus::Converged => "converged",
            LmStatus::MaxIterations => "max iterations reached",
            LmStatus::Stalled => "stalled",
        }
    }

    pub fn is_converged(self) -> bool {
        matches!(self, LmStatus::Converged)
    }
}

/// Solver result: best parameters seen plus how the run ended.
#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub params: DVector<f64>,
    pub status: LmStatus,
    /// Accepted outer iterations performed.
    pub iterations: usize,
    /// Final sum of squared residuals.
    pub sse: f64,
}

/// Minimize the problem's sum of squared residuals starting from `initial`.
///
/// Always returns the best parameters encountered; inspect
/// [`LmOutcome::status`] to tell a converged fit from a capped or stalled
/// one.
pub fn minimize(
    problem: &impl ResidualProblem,
    initial: DVector<f64>,
    options: &LmOptions,
) -> LmOutcome {
    let m = problem.residual_count();
    let n = problem.parameter_count();

    let mut params = initial;
    let mut residuals = DVector::zeros(m);
    problem.fill_residuals(&params, &mut residuals);
    let mut sse = residuals.norm_squared();

    // A non-finite start gives the step test nothing to compare against.
    if !sse.is_finite() {
        return LmOutcome {
            params,
            status: LmStatus::Stalled,
            iterations: 0,
            sse,
        };
    }

    let mut jacobian = DMatrix::zeros(m, n);
    let mut trial = DVector::zeros(m);
    let mut lambda = options.lambda_init;

    for iteration in 1..=options.max_iterations {
        problem.fill_jacobian(&params, &mut jacobian);
        let jt = jacobian.transpose();
        let jtj = &jt * &jacobian;
        let gradient = &jt * &residuals;

        if gradient.amax() < options.gtol {
            return LmOutcome {
                params,
                status: LmStatus::Converged,
                iterations: iteration - 1,
                sse,
            };
        }

        // Inner loop: inflate lambda until a solvable, downhill step shows
        // up (or the damping ceiling says there is none).
        loop {
            let mut damped = jtj.clone();
            for i in 0..n {
                damped[(i, i)] += lambda * jtj[(i, i)].max(DIAG_FLOOR);
            }

            let Some(chol) = damped.cholesky() else {
                lambda *= LAMBDA_UP;
                if lambda > LAMBDA_MAX {
                    return LmOutcome {
                        params,
                        status: LmStatus::Stalled,
                        iterations: iteration - 1,
                        sse,
                    };
                }
                continue;
            };

            let neg_gradient = -&gradient;
            let delta = chol.solve(&neg_gradient);
            let candidate = &params + &delta;
            problem.fill_residuals(&candidate, &mut trial);
            let trial_sse = trial.norm_squared();

            if trial_sse.is_finite() && trial_sse < sse {
                let step_small = delta.norm() <= options.xtol * (params.norm() + options.xtol);
                let drop_small = (sse - trial_sse) <= options.ftol * sse;

                params = candidate;
                std::mem::swap(&mut residuals, &mut trial);
                sse = trial_sse;
                lambda = (lambda * LAMBDA_DOWN).max(LAMBDA_MIN);

                if step_small || drop_small {
                    return LmOutcome {
                        params,
                        status: LmStatus::Converged,
                        iterations: iteration,
                        sse,
                    };
                }
                break;
            }

            lambda *= LAMBDA_UP;
            if lambda > LAMBDA_MAX {
                return LmOutcome {
                    params,
                    status: LmStatus::Stalled,
                    iterations: iteration - 1,
                    sse,
                };
            }
        }
    }

    LmOutcome {
        params,
        status: LmStatus::MaxIterations,
        iterations: options.max_iterations,
        sse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Residuals for `y = a + b*x`, linear in both parameters.
    struct LineProblem {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl ResidualProblem for LineProblem {
        fn residual_count(&self) -> usize {
            self.x.len()
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn fill_residuals(&self, params: &DVector<f64>, out: &mut DVector<f64>) {
            for (i, (&x, &y)) in self.x.iter().zip(&self.y).enumerate() {
                out[i] = params[0] + params[1] * x - y;
            }
        }

        fn fill_jacobian(&self, _params: &DVector<f64>, out: &mut DMatrix<f64>) {
            for (i, &x) in self.x.iter().enumerate() {
                out[(i, 0)] = 1.0;
                out[(i, 1)] = x;
            }
        }
    }

    /// Residuals for `y = c * exp(-k*x)`, nonlinear in `k`.
    struct DecayProblem {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl ResidualProblem for DecayProblem {
        fn residual_count(&self) -> usize {
            self.x.len()
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn fill_residuals(&self, params: &DVector<f64>, out: &mut DVector<f64>) {
            for (i, (&x, &y)) in self.x.iter().zip(&self.y).enumerate() {
                out[i] = params[0] * (-params[1] * x).exp() - y;
            }
        }

        fn fill_jacobian(&self, params: &DVector<f64>, out: &mut DMatrix<f64>) {
            for (i, &x) in self.x.iter().enumerate() {
                let e = (-params[1] * x).exp();
                out[(i, 0)] = e;
                out[(i, 1)] = -params[0] * x * e;
            }
        }
    }

    fn decay_data() -> DecayProblem {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = x.iter().map(|&x| 5.0 * (-0.8_f64 * x).exp()).collect();
        DecayProblem { x, y }
    }

    #[test]
    fn solves_a_linear_system_exactly() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let problem = LineProblem {
            x: vec![0.0, 1.0, 2.0],
            y: vec![2.0, 5.0, 8.0],
        };
        let out = minimize(
            &problem,
            DVector::from_row_slice(&[0.0, 0.0]),
            &LmOptions::default(),
        );
        assert!(out.status.is_converged());
        assert!((out.params[0] - 2.0).abs() < 1e-8);
        assert!((out.params[1] - 3.0).abs() < 1e-8);
        assert!(out.sse < 1e-16);
    }

    #[test]
    fn recovers_nonlinear_decay_from_a_rough_start() {
        let problem = decay_data();
        let out = minimize(
            &problem,
            DVector::from_row_slice(&[1.0, 0.1]),
            &LmOptions::default(),
        );
        assert!(out.status.is_converged(), "status: {:?}", out.status);
        assert!((out.params[0] - 5.0).abs() < 1e-6);
        assert!((out.params[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn iteration_cap_is_reported_not_raised() {
        let problem = decay_data();
        let options = LmOptions {
            max_iterations: 1,
            ..LmOptions::default()
        };
        let out = minimize(&problem, DVector::from_row_slice(&[1.0, 0.1]), &options);
        assert_eq!(out.status, LmStatus::MaxIterations);
        assert_eq!(out.iterations, 1);
        // The single accepted step still improved on the start.
        assert!(out.sse.is_finite());
    }

    #[test]
    fn non_finite_start_stalls_with_best_effort_output() {
        let problem = DecayProblem {
            x: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            y: vec![f64::NAN; 5],
        };
        let out = minimize(
            &problem,
            DVector::from_row_slice(&[1.0, 0.1]),
            &LmOptions::default(),
        );
        assert_eq!(out.status, LmStatus::Stalled);
        assert_eq!(out.iterations, 0);
    }

    #[test]
    fn status_labels_are_stable() {
        assert_eq!(LmStatus::Converged.display_name(), "converged");
        assert!(!LmStatus::Stalled.is_converged());
    }
}
