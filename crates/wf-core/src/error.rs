use thiserror::Error;

pub type WfResult<T> = Result<T, WfError>;

/// Crate-agnostic failure kinds that every layer of the toolkit can map onto.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WfError {
    #[error("{what} is not finite: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid {what}")]
    InvalidArg { what: &'static str },

    /// A nonlinear solve stopped before reaching tolerance.
    #[error("No converged solution for {what}")]
    Unconverged { what: &'static str },

    #[error("Broken invariant: {what}")]
    Invariant { what: &'static str },
}
