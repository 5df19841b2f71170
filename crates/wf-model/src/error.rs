//! Error types for model construction and evaluation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Name '{name}' is already defined in the model")]
    DuplicateName { name: String },

    #[error("No model component named '{name}'")]
    UnknownName { name: String },

    #[error("'{name}' is not a variable")]
    NotAVariable { name: String },

    #[error("Variable '{name}' was used before it was initialized")]
    Uninitialized { name: String },

    #[error("Variable '{name}' is fixed but has no value")]
    FixedWithoutValue { name: String },

    #[error("Handle {what} does not belong to this model")]
    InvalidHandle { what: String },
}

pub type ModelResult<T> = Result<T, ModelError>;
