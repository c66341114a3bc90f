//! Trellis: an embeddable in-memory property graph engine
//!
//! Vertices, edges, hyperedges and multiedges each carry an identity, a
//! label and an open set of key/value properties. Every property mutation
//! passes through a synchronous vote: registered voters may deny it, and
//! observers hear about it only once it has been applied.
//!
//! # Core Concepts
//!
//! - **PropertyGraph**: sole owner of every element, keyed by id
//! - **Vertex**: holds non-owning references to its incident edges
//! - **Edge / HyperEdge**: directed relations with fixed endpoints
//! - **MultiEdge**: a virtual grouping of the edges a selector accepts
//!
//! # Example
//!
//! ```
//! use trellis::{GraphElement, NewEdge, NewVertex, PropertyGraph};
//!
//! let graph = PropertyGraph::new();
//! let alice = graph.add_vertex(NewVertex::new().with_label("Person")).unwrap();
//! let bob = graph.add_vertex(NewVertex::new().with_label("Person")).unwrap();
//! graph
//!     .add_edge(NewEdge::new(alice.id(), bob.id()).with_label("knows"))
//!     .unwrap();
//!
//! alice.set_property("name", "alice").unwrap();
//! assert_eq!(graph.out_edges(alice.id(), Some("knows")).unwrap().len(), 1);
//! ```

pub mod config;
mod graph;
pub mod snapshot;

pub use config::GraphConfig;
pub use graph::*;
pub use snapshot::GraphSnapshot;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
