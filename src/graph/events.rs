//! Graph events fired after a structural mutation is committed
//!
//! One event per element kind and direction. Observers receive them
//! synchronously, after the mutation is visible in the graph and with no
//! graph lock held.

use super::edge::Edge;
use super::engine::PropertyGraph;
use super::hyperedge::HyperEdge;
use super::multiedge::MultiEdge;
use super::vertex::Vertex;
use std::sync::Arc;

/// Why an element left the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Removed by an explicit call
    Direct,
    /// Removed because an endpoint vertex was removed
    Cascade,
}

/// A committed structural change
#[derive(Debug, Clone)]
pub enum GraphEvent {
    VertexAdded {
        vertex: Arc<Vertex>,
    },
    VertexRemoved {
        vertex: Arc<Vertex>,
    },
    EdgeAdded {
        edge: Arc<Edge>,
    },
    EdgeRemoved {
        edge: Arc<Edge>,
        reason: RemovalReason,
    },
    HyperEdgeAdded {
        hyperedge: Arc<HyperEdge>,
    },
    HyperEdgeRemoved {
        hyperedge: Arc<HyperEdge>,
        reason: RemovalReason,
    },
    MultiEdgeAdded {
        multi_edge: Arc<MultiEdge>,
    },
    MultiEdgeRemoved {
        multi_edge: Arc<MultiEdge>,
    },
}

impl GraphEvent {
    pub fn is_addition(&self) -> bool {
        matches!(
            self,
            Self::VertexAdded { .. }
                | Self::EdgeAdded { .. }
                | Self::HyperEdgeAdded { .. }
                | Self::MultiEdgeAdded { .. }
        )
    }

    /// Short name of the event, for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::VertexAdded { .. } => "vertex_added",
            Self::VertexRemoved { .. } => "vertex_removed",
            Self::EdgeAdded { .. } => "edge_added",
            Self::EdgeRemoved { .. } => "edge_removed",
            Self::HyperEdgeAdded { .. } => "hyperedge_added",
            Self::HyperEdgeRemoved { .. } => "hyperedge_removed",
            Self::MultiEdgeAdded { .. } => "multiedge_added",
            Self::MultiEdgeRemoved { .. } => "multiedge_removed",
        }
    }
}

/// Read-only consumer of committed graph events (schema learners,
/// indexers, adapters).
pub trait GraphObserver: Send + Sync {
    fn on_graph_event(&self, graph: &PropertyGraph, event: &GraphEvent);
}

pub(crate) struct FnGraphObserver<F>(pub(crate) F);

impl<F> GraphObserver for FnGraphObserver<F>
where
    F: Fn(&PropertyGraph, &GraphEvent) + Send + Sync,
{
    fn on_graph_event(&self, graph: &PropertyGraph, event: &GraphEvent) {
        (self.0)(graph, event)
    }
}
