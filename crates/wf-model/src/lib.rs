//! wf-model: equation-oriented case model for waterflow.
//!
//! A [`Model`] owns named variables, equality constraints and named
//! expressions. Values, bounds and fixed status change between solves; the
//! set of variables and constraints only grows while a flowsheet is built.

pub mod error;
pub mod expr;
pub mod model;
pub mod variable;

pub use error::{ModelError, ModelResult};
pub use expr::Expr;
pub use model::{Handle, Model};
pub use variable::{Constraint, NamedExpr, Variable};
