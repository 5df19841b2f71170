//! Error types for the wf-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Study error: {0}")]
    Study(String),

    #[error("Study file not found: {0}")]
    StudyNotFound(PathBuf),

    #[error("Study validation failed: {0}")]
    Validation(String),

    #[error("Flowsheet error: {0}")]
    Flowsheet(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Sweep error: {0}")]
    Sweep(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for wf-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<wf_project::ProjectError> for AppError {
    fn from(err: wf_project::ProjectError) -> Self {
        match err {
            wf_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Study(other.to_string()),
        }
    }
}

impl From<wf_flowsheet::FlowsheetError> for AppError {
    fn from(err: wf_flowsheet::FlowsheetError) -> Self {
        match err {
            wf_flowsheet::FlowsheetError::Solver(e) => AppError::Solver(e.to_string()),
            other => AppError::Flowsheet(other.to_string()),
        }
    }
}

impl From<wf_solver::SolverError> for AppError {
    fn from(err: wf_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<wf_sweep::SweepError> for AppError {
    fn from(err: wf_sweep::SweepError) -> Self {
        AppError::Sweep(err.to_string())
    }
}

impl From<wf_results::ResultsError> for AppError {
    fn from(err: wf_results::ResultsError) -> Self {
        match err {
            wf_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
