//! Solver options shared by the solve driver, initializer and sweeps.

use serde::{Deserialize, Serialize};

use crate::newton::NewtonConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Maximum Newton iterations per solve.
    pub max_iterations: usize,
    /// Convergence tolerance on the (scaled) residual 2-norm.
    pub tolerance: f64,
    /// Backtracking factor for the line search.
    pub line_search_beta: f64,
    /// Maximum backtracking steps per iteration.
    pub max_line_search_iters: usize,
    /// Relative perturbation for finite-difference Jacobians.
    pub fd_epsilon: f64,
    /// Solve in scaled variables/residuals when scale factors are present.
    pub use_scaling: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
            fd_epsilon: 1e-7,
            use_scaling: true,
        }
    }
}

impl SolverOptions {
    pub fn newton_config(&self) -> NewtonConfig {
        NewtonConfig {
            max_iterations: self.max_iterations,
            abs_tol: self.tolerance,
            line_search_beta: self.line_search_beta,
            max_line_search_iters: self.max_line_search_iters,
            fd_epsilon: self.fd_epsilon,
            ..NewtonConfig::default()
        }
    }
}
