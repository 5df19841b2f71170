//! wf-sweep: parameter sweeps over a case.
//!
//! A [`SweepSpec`] names sampled input fields (a target variable plus a
//! [`Sampling`] rule) and recorded output fields. The engine resolves every
//! name once, runs the caller's optimize callable per sample and collects a
//! [`ResultTable`] with NaN outputs for samples that did not converge.
//!
//! The engine only needs model access through [`SweepCase`], so it runs on a
//! bare [`wf_model::Model`] as well as on a flowsheet case.

pub mod case;
pub mod engine;
pub mod error;
pub mod sampling;
pub mod spec;
pub mod table;

pub use case::SweepCase;
pub use engine::{run_sweep, run_sweep_parallel, run_sweep_with_retry};
pub use error::{SweepError, SweepResult};
pub use sampling::{Grid, SampleMode, Sampling};
pub use spec::{InputField, OutputField, SweepSpec};
pub use table::{ResultRow, ResultTable};
