//! Graph-specific error types.

use crate::graph::PortKind;

pub type GraphResult<T> = Result<T, GraphError>;

/// Flowsheet construction and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two blocks were given the same name.
    DuplicateBlock { name: String },

    /// A block declares the same port name twice.
    DuplicatePort { block: String, port: String },

    /// A block handle does not belong to this builder.
    UnknownBlock { name: String },

    /// The named port does not exist on the block for this configuration.
    UnknownPort { block: String, port: String },

    /// The port already carries an arc.
    PortAlreadyConnected { block: String, port: String },

    /// An arc was requested from an inlet or into an outlet.
    DirectionMismatch {
        block: String,
        port: String,
        expected: PortKind,
    },

    /// No block without inlets exists.
    NoFeed,

    /// More than one block without inlets exists.
    MultipleFeeds { blocks: Vec<String> },

    /// No block without outlets exists.
    NoSink,

    /// A port was declared but never connected.
    DanglingPort { block: String, port: String },

    /// A directed cycle exists that is not broken by a tear arc.
    CycleWithoutTear { blocks: Vec<String> },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::DuplicateBlock { name } => write!(f, "Duplicate block name '{}'", name),
            GraphError::DuplicatePort { block, port } => {
                write!(f, "Block '{}' declares port '{}' twice", block, port)
            }
            GraphError::UnknownBlock { name } => write!(f, "Unknown block '{}'", name),
            GraphError::UnknownPort { block, port } => {
                write!(f, "Block '{}' has no port named '{}'", block, port)
            }
            GraphError::PortAlreadyConnected { block, port } => {
                write!(f, "Port '{}.{}' is already connected", block, port)
            }
            GraphError::DirectionMismatch {
                block,
                port,
                expected,
            } => {
                write!(f, "Port '{}.{}' is not an {:?} port", block, port, expected)
            }
            GraphError::NoFeed => write!(f, "Flowsheet has no feed source"),
            GraphError::MultipleFeeds { blocks } => {
                write!(f, "Flowsheet has more than one feed source: {}", blocks.join(", "))
            }
            GraphError::NoSink => write!(f, "Flowsheet has no terminal sink"),
            GraphError::DanglingPort { block, port } => {
                write!(f, "Port '{}.{}' is not connected", block, port)
            }
            GraphError::CycleWithoutTear { blocks } => {
                write!(
                    f,
                    "Cycle through [{}] has no tear arc",
                    blocks.join(" -> ")
                )
            }
        }
    }
}

impl std::error::Error for GraphError {}
