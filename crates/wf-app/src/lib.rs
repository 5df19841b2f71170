//! Shared application service layer for waterflow.
//!
//! Centralizes what the CLI does with a study file: loading and validating
//! it, building the treatment train, solving it or sweeping it, and caching
//! the outcome in the study's run store.

pub mod error;
pub mod run_service;
pub mod study_service;

pub use error::{AppError, AppResult};
pub use run_service::{
    RunOptions, SolveResponse, StoredRun, SweepResponse, build_case, list_runs, load_run,
    solve_study, sweep_study, train_config,
};
pub use wf_solver::SOLVER_VERSION;
pub use study_service::{StudySummary, load_study, summarize, validate_study};
