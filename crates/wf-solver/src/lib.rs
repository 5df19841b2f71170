//! Nonlinear solve driver for waterflow case models.
//!
//! Variables and constraints come from [`wf_model::Model`]; this crate picks
//! the free variables and active constraints, optionally rescales them, and
//! runs a bounded, damped Newton iteration behind the [`NonlinearSolver`]
//! trait. The [`solve`] entry point adds the degrees-of-freedom check and
//! the `fail_flag` contract.

pub mod error;
pub mod jacobian;
pub mod newton;
pub mod options;
pub mod scaling;
pub mod solve;
pub mod system;

pub use error::{SolverError, SolverResult};
pub use newton::{NewtonConfig, NewtonResult, TerminationCondition};
pub use options::SolverOptions;
pub use scaling::{ScalingReport, calculate_scaling_factors};
pub use solve::{NewtonSolver, NonlinearSolver, SolveStatus, solve, solve_subsystem, solve_with};
pub use system::SubSystem;

/// Version string recorded with persisted runs.
pub const SOLVER_VERSION: &str = concat!("wf-solver ", env!("CARGO_PKG_VERSION"));
