//! Error types for solver operations.

use thiserror::Error;
use wf_core::WfError;
use wf_model::ModelError;

use crate::newton::TerminationCondition;

/// Errors that can occur while preparing or running a solve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error(
        "Degrees of freedom is {dof} ({free_vars} free variables, {constraints} active constraints); expected 0"
    )]
    DegreesOfFreedom {
        dof: i64,
        free_vars: usize,
        constraints: usize,
    },

    #[error(
        "Solver did not converge: termination = {termination} after {iterations} iterations (residual {residual:.3e})"
    )]
    DidNotConverge {
        termination: TerminationCondition,
        iterations: usize,
        residual: f64,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    /// True for the non-convergence error raised under `fail_flag`.
    pub fn is_convergence_failure(&self) -> bool {
        matches!(self, SolverError::DidNotConverge { .. })
    }
}

impl From<SolverError> for WfError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ProblemSetup { .. } => WfError::InvalidArg {
                what: "problem setup",
            },
            SolverError::DegreesOfFreedom { .. } => WfError::Invariant {
                what: "degrees of freedom",
            },
            SolverError::DidNotConverge { .. } => WfError::Unconverged {
                what: "flowsheet model",
            },
            SolverError::Model(_) => WfError::InvalidArg { what: "model" },
            SolverError::Numeric { .. } => WfError::InvalidArg { what: "numeric" },
        }
    }
}
