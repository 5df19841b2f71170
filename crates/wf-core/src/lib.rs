//! Shared building blocks for the waterflow crates: SI quantities and the
//! flow/pressure helpers built on them, float tolerances, typed handles for
//! variables and units, and the common error kinds.

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{WfError, WfResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
