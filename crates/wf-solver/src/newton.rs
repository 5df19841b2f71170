//! Bounded Newton solver with backtracking line search.

use std::fmt;

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Why the iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationCondition {
    /// Residual norm below tolerance.
    Optimal,
    /// Iteration limit reached first.
    MaxIterations,
    /// No descent possible within the variable bounds.
    LocallyInfeasible,
    /// Linear solve of the Newton step failed.
    NumericalError,
    /// Residuals were not finite at the starting point.
    EvaluationError,
}

impl fmt::Display for TerminationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Optimal => "optimal",
            Self::MaxIterations => "maxIterations",
            Self::LocallyInfeasible => "locallyInfeasible",
            Self::NumericalError => "numericalError",
            Self::EvaluationError => "evaluationError",
        };
        f.write_str(s)
    }
}

/// Newton solver configuration.
#[derive(Debug, Clone)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
    /// Sufficient-decrease constant (Armijo)
    pub armijo: f64,
    /// Relative finite-difference step
    pub fd_epsilon: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            abs_tol: 1e-8,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
            armijo: 1e-4,
            fd_epsilon: 1e-7,
        }
    }
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Last iterate (the solution when `termination` is optimal)
    pub x: DVector<f64>,
    /// Final residual norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
    pub termination: TerminationCondition,
}

impl NewtonResult {
    pub fn converged(&self) -> bool {
        self.termination == TerminationCondition::Optimal
    }
}

fn project(x: &mut DVector<f64>, lower: &[f64], upper: &[f64]) {
    for i in 0..x.len() {
        x[i] = x[i].clamp(lower[i], upper[i]);
    }
}

fn norm_or_inf(r: &DVector<f64>) -> f64 {
    let n = r.norm();
    if n.is_finite() { n } else { f64::INFINITY }
}

/// Solve the Newton step `J dx = -r`, falling back to a least-squares step
/// when the Jacobian is singular.
fn newton_step(jac: DMatrix<f64>, r: &DVector<f64>) -> Option<DVector<f64>> {
    let rhs = -r;
    if jac.is_square()
        && let Some(dx) = jac.clone().lu().solve(&rhs)
        && dx.iter().all(|v| v.is_finite())
    {
        return Some(dx);
    }
    let dx = jac.svd(true, true).solve(&rhs, 1e-12).ok()?;
    dx.iter().all(|v| v.is_finite()).then_some(dx)
}

/// Newton solver with projection onto box bounds and backtracking.
///
/// Non-convergence is reported through [`NewtonResult::termination`], not as
/// an error; `Err` is reserved for residual evaluation failures.
pub fn newton_solve<F, J>(
    x0: DVector<f64>,
    lower: &[f64],
    upper: &[f64],
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    J: Fn(&DVector<f64>, &DVector<f64>) -> SolverResult<DMatrix<f64>>,
{
    let mut x = x0;
    project(&mut x, lower, upper);
    let mut r = residual_fn(&x)?;
    let mut r_norm = norm_or_inf(&r);

    if !r_norm.is_finite() {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: 0,
            termination: TerminationCondition::EvaluationError,
        });
    }

    for iter in 0..config.max_iterations {
        if r_norm < config.abs_tol {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
                termination: TerminationCondition::Optimal,
            });
        }

        let jac = jacobian_fn(&x, &r)?;
        let Some(dx) = newton_step(jac, &r) else {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
                termination: TerminationCondition::NumericalError,
            });
        };

        // Backtracking on the projected step
        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..config.max_line_search_iters {
            let mut x_new = &x + alpha * &dx;
            project(&mut x_new, lower, upper);
            let r_new = residual_fn(&x_new)?;
            let r_new_norm = norm_or_inf(&r_new);
            if r_new_norm <= (1.0 - config.armijo * alpha) * r_norm {
                accepted = Some((x_new, r_new, r_new_norm));
                break;
            }
            alpha *= config.line_search_beta;
        }

        match accepted {
            Some((x_new, r_new, r_new_norm)) => {
                x = x_new;
                r = r_new;
                r_norm = r_new_norm;
            }
            None => {
                return Ok(NewtonResult {
                    x,
                    residual_norm: r_norm,
                    iterations: iter + 1,
                    termination: TerminationCondition::LocallyInfeasible,
                });
            }
        }
    }

    let termination = if r_norm < config.abs_tol {
        TerminationCondition::Optimal
    } else {
        TerminationCondition::MaxIterations
    };
    Ok(NewtonResult {
        x,
        residual_norm: r_norm,
        iterations: config.max_iterations,
        termination,
    })
}
