//! High-level solver interface.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wf_model::Model;

use crate::error::{SolverError, SolverResult};
use crate::jacobian::finite_difference_jacobian_at;
use crate::newton::{TerminationCondition, newton_solve};
use crate::options::SolverOptions;
use crate::system::SubSystem;

/// Outcome of one solver invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveStatus {
    pub termination: TerminationCondition,
    pub iterations: usize,
    pub residual_norm: f64,
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        self.termination == TerminationCondition::Optimal
    }

    fn trivial() -> Self {
        Self {
            termination: TerminationCondition::Optimal,
            iterations: 0,
            residual_norm: 0.0,
        }
    }
}

/// A nonlinear equation solver working on a slice of a model.
///
/// Implementations must leave the model's variables at their last iterate,
/// converged or not.
pub trait NonlinearSolver: Send + Sync {
    fn name(&self) -> &str;

    fn solve_system(
        &self,
        model: &mut Model,
        system: &SubSystem,
        options: &SolverOptions,
    ) -> SolverResult<SolveStatus>;
}

/// Bounded damped Newton with finite-difference Jacobians.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewtonSolver;

impl NonlinearSolver for NewtonSolver {
    fn name(&self) -> &str {
        "newton"
    }

    fn solve_system(
        &self,
        model: &mut Model,
        system: &SubSystem,
        options: &SolverOptions,
    ) -> SolverResult<SolveStatus> {
        if system.is_empty() {
            return Ok(SolveStatus::trivial());
        }

        let var_scales = system.var_scales(model, options.use_scaling);
        let con_scales = system.con_scales(model, options.use_scaling);
        let (lower, upper) = system.bounds(model);
        let lower: Vec<f64> = lower.iter().zip(&var_scales).map(|(l, s)| l * s).collect();
        let upper: Vec<f64> = upper.iter().zip(&var_scales).map(|(u, s)| u * s).collect();
        let sv = DVector::from_vec(var_scales);
        let sc = DVector::from_vec(con_scales);
        let y0 = system.initial_point(model).component_mul(&sv);
        let config = options.newton_config();

        let result = {
            let residual = system.residual_fn(model);
            let scaled = |y: &DVector<f64>| -> SolverResult<DVector<f64>> {
                let x = y.component_div(&sv);
                Ok(residual(&x)?.component_mul(&sc))
            };
            let jacobian = |y: &DVector<f64>, r: &DVector<f64>| {
                finite_difference_jacobian_at(y, r, &scaled, &lower, &upper, config.fd_epsilon)
            };
            newton_solve(y0, &lower, &upper, &scaled, jacobian, &config)?
        };

        system.write_back(model, &result.x.component_div(&sv));
        debug!(
            termination = %result.termination,
            iterations = result.iterations,
            residual = result.residual_norm,
            "newton finished"
        );

        Ok(SolveStatus {
            termination: result.termination,
            iterations: result.iterations,
            residual_norm: result.residual_norm,
        })
    }
}

/// Solve the whole case once with the default Newton solver.
///
/// - Degrees of freedom must be zero, else [`SolverError::DegreesOfFreedom`].
/// - On non-optimal termination, `fail_flag = true` returns
///   [`SolverError::DidNotConverge`]; `fail_flag = false` returns the status
///   and leaves the model at the solver's last iterate.
pub fn solve(model: &mut Model, options: &SolverOptions, fail_flag: bool) -> SolverResult<SolveStatus> {
    solve_with(model, &NewtonSolver, options, fail_flag)
}

/// [`solve`] with a caller-chosen solver backend.
pub fn solve_with(
    model: &mut Model,
    solver: &dyn NonlinearSolver,
    options: &SolverOptions,
    fail_flag: bool,
) -> SolverResult<SolveStatus> {
    let system = SubSystem::whole(model);
    let dof = system.vars.len() as i64 - system.cons.len() as i64;
    if dof != 0 {
        return Err(SolverError::DegreesOfFreedom {
            dof,
            free_vars: system.vars.len(),
            constraints: system.cons.len(),
        });
    }

    info!(
        solver = solver.name(),
        vars = system.vars.len(),
        constraints = system.cons.len(),
        "solving case"
    );
    let status = solver.solve_system(model, &system, options)?;

    if !status.is_optimal() {
        warn!(
            termination = %status.termination,
            iterations = status.iterations,
            residual = status.residual_norm,
            "solve did not reach optimal termination"
        );
        if fail_flag {
            return Err(SolverError::DidNotConverge {
                termination: status.termination,
                iterations: status.iterations,
                residual: status.residual_norm,
            });
        }
    }
    Ok(status)
}

/// Solve a square slice of the model (block-local initialization solves).
pub fn solve_subsystem(
    model: &mut Model,
    system: &SubSystem,
    options: &SolverOptions,
) -> SolverResult<SolveStatus> {
    if !system.is_square() {
        return Err(SolverError::ProblemSetup {
            what: format!(
                "subsystem has {} unknowns and {} equations",
                system.vars.len(),
                system.cons.len()
            ),
        });
    }
    NewtonSolver.solve_system(model, system, options)
}
