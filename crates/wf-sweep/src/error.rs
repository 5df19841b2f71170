//! Error types for sweep setup and execution.

use thiserror::Error;
use wf_core::WfError;
use wf_solver::SolverError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SweepError {
    #[error("Sweep declares no input fields")]
    EmptySpec,

    #[error("Field name '{name}' is declared more than once")]
    DuplicateField { name: String },

    #[error("Invalid sampling for field '{field}': {what}")]
    InvalidSampling { field: String, what: String },

    #[error("Paired field '{field}' has {found} samples, expected {expected}")]
    PairedLength {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("Sweep target '{reference}' of field '{field}' does not exist in the case")]
    UnresolvedTarget { field: String, reference: String },

    #[error("Sweep target '{reference}' of field '{field}' is not a variable")]
    NotAVariable { field: String, reference: String },

    #[error("Variable '{reference}' is targeted by more than one field (second: '{field}')")]
    DuplicateTarget { field: String, reference: String },

    #[error("Output '{reference}' of field '{field}' does not exist in the case")]
    UnresolvedOutput { field: String, reference: String },

    #[error("Optimize failed on sample {sample}: {source}")]
    Optimize {
        sample: usize,
        #[source]
        source: SolverError,
    },

    #[error("I/O error writing {path}: {message}")]
    Io { path: String, message: String },
}

pub type SweepResult<T> = Result<T, SweepError>;

impl SweepError {
    /// True for errors raised before any sample runs.
    pub fn is_setup_error(&self) -> bool {
        !matches!(self, SweepError::Optimize { .. } | SweepError::Io { .. })
    }
}

impl From<SweepError> for WfError {
    fn from(e: SweepError) -> Self {
        match e {
            SweepError::Optimize { source, .. } => source.into(),
            SweepError::Io { .. } => WfError::InvalidArg { what: "sweep output" },
            _ => WfError::InvalidArg {
                what: "sweep specification",
            },
        }
    }
}
