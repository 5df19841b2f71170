//! On-disk cache of solve and sweep runs.
//!
//! Runs live next to the study file under `.waterflow/runs/<run_id>/`, keyed by a
//! hash of the study content and solver version so an unchanged study is
//! never solved twice.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("run store I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed run manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no stored run with id {run_id}")]
    RunNotFound { run_id: String },

    #[error("invalid run store location: {message}")]
    InvalidPath { message: String },
}
