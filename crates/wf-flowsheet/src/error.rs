//! Error types for flowsheet assembly, initialization and reporting.

use thiserror::Error;
use wf_core::WfError;
use wf_graph::GraphError;
use wf_model::ModelError;
use wf_solver::SolverError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowsheetError {
    #[error("Unknown technology '{tech}' in the case database")]
    UnknownTechnology { tech: String },

    #[error("Technology '{tech}' has no parameter '{param}'")]
    MissingParameter { tech: String, param: String },

    #[error("Technology '{tech}' has no removal fraction for solute '{solute}'")]
    MissingSolute { tech: String, solute: String },

    #[error("Failed to read case database at {path}: {message}")]
    DatabaseIo { path: String, message: String },

    #[error("Failed to parse database entry '{tech}': {message}")]
    DatabaseParse { tech: String, message: String },

    #[error("Invalid component list: {what}")]
    Components { what: String },

    #[error("Unknown unit '{name}'")]
    UnknownUnit { name: String },

    #[error("Unit '{unit}' is not a {expected}")]
    WrongUnitKind { unit: String, expected: &'static str },

    #[error("Invalid flowsheet configuration: {what}")]
    Config { what: String },

    #[error("Case topology is sealed; blocks and arcs can no longer change")]
    Sealed,

    #[error("Case topology has not been sealed")]
    NotSealed,

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

pub type FlowsheetResult<T> = Result<T, FlowsheetError>;

impl From<FlowsheetError> for WfError {
    fn from(e: FlowsheetError) -> Self {
        match e {
            FlowsheetError::Solver(inner) => inner.into(),
            FlowsheetError::Sealed | FlowsheetError::NotSealed => WfError::Invariant {
                what: "case topology state",
            },
            FlowsheetError::Graph(_) => WfError::InvalidArg { what: "topology" },
            FlowsheetError::Model(_) => WfError::InvalidArg { what: "model" },
            _ => WfError::InvalidArg {
                what: "flowsheet configuration",
            },
        }
    }
}

/// Collapse a flowsheet error onto the solver boundary used by optimize
/// callables; convergence and model errors keep their identity.
impl From<FlowsheetError> for SolverError {
    fn from(e: FlowsheetError) -> Self {
        match e {
            FlowsheetError::Solver(inner) => inner,
            FlowsheetError::Model(inner) => SolverError::Model(inner),
            other => SolverError::ProblemSetup {
                what: other.to_string(),
            },
        }
    }
}
