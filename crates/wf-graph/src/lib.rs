//! wf-graph: flowsheet topology for waterflow.
//!
//! Provides:
//! - Unit blocks with named inlet/outlet ports
//! - Directed arcs from an outlet port to an inlet port (optionally torn)
//! - Incremental builder with validation into an immutable `Graph`
//! - Deterministic topological ordering for sequential initialization
//!
//! # Example
//!
//! ```
//! use wf_graph::GraphBuilder;
//!
//! let mut builder = GraphBuilder::new();
//! let feed = builder.add_block("feed", &[], &["outlet"]).unwrap();
//! let unit = builder.add_block("unit", &["inlet"], &["treated", "byproduct"]).unwrap();
//! let product = builder.add_block("product", &["inlet"], &[]).unwrap();
//! let waste = builder.add_block("waste", &["inlet"], &[]).unwrap();
//! builder.connect(feed, "outlet", unit, "inlet").unwrap();
//! builder.connect(unit, "treated", product, "inlet").unwrap();
//! builder.connect(unit, "byproduct", waste, "inlet").unwrap();
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.topological_order()[0], feed);
//! assert_eq!(graph.sinks().len(), 2);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub(crate) mod validate;

pub use builder::GraphBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{Arc, Block, Graph, Port, PortKind};
