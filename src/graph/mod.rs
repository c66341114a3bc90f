//! Core graph data structures

mod builder;
mod edge;
mod element;
mod engine;
mod error;
mod events;
mod factory;
mod hyperedge;
mod id;
mod multiedge;
mod property;
mod vertex;
mod vote;


pub use builder::{Initializer, NewEdge, NewHyperEdge, NewMultiEdge, NewVertex};
pub use edge::Edge;
pub use element::{ElementCore, GraphElement};
pub use engine::PropertyGraph;
pub use error::{GraphError, GraphResult};
pub use events::{GraphEvent, GraphObserver, RemovalReason};
pub use factory::{GraphFactory, IdGenerators};
pub use hyperedge::HyperEdge;
pub use id::{
    EdgeId, ElementKind, ElementRef, GraphId, HyperEdgeId, Identity, IdentityGenerator, Label,
    MultiEdgeId, RawId, RevisionId, VertexId, MAX_RAW_ID,
};
pub use multiedge::{label_selector, EdgeSelector, MultiEdge};
pub use property::{FromProperty, PropertyBag, PropertyKey, PropertyValue, ReservedKeys};
pub use vertex::{AdjacencyPolicy, AdjacentEdge, Direction, EdgeRef, Vertex};
pub use vote::{
    MutationOutcome, MutationState, PropertyChange, PropertyEvent, PropertyHandlers,
    PropertyObserver, PropertyTarget, PropertyVoter, Vote,
};
