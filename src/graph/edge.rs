//! Directed binary edges

use super::element::{element_identity, ElementCore, GraphElement};
use super::id::{EdgeId, VertexId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// A directed edge from its out (tail) vertex to its in (head) vertex.
///
/// Endpoints and label are fixed at construction.
pub struct Edge {
    core: ElementCore<EdgeId>,
    out_vertex: VertexId,
    in_vertex: VertexId,
    removed: AtomicBool,
}

impl Edge {
    pub(crate) fn new(core: ElementCore<EdgeId>, out_vertex: VertexId, in_vertex: VertexId) -> Self {
        Self {
            core,
            out_vertex,
            in_vertex,
            removed: AtomicBool::new(false),
        }
    }

    /// Whether the owning graph has dropped this edge. Handles held past
    /// removal stay readable but are no longer aggregated by multiedges.
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_removed(&self) {
        self.removed.store(true, Ordering::SeqCst);
    }

    /// The tail vertex the edge leaves from
    pub fn out_vertex(&self) -> VertexId {
        self.out_vertex
    }

    /// The head vertex the edge points to
    pub fn in_vertex(&self) -> VertexId {
        self.in_vertex
    }

    pub fn is_self_loop(&self) -> bool {
        self.out_vertex == self.in_vertex
    }

    pub fn touches(&self, vertex: VertexId) -> bool {
        self.out_vertex == vertex || self.in_vertex == vertex
    }

    /// The endpoint opposite `vertex`, if `vertex` is an endpoint at all
    pub fn other_end(&self, vertex: VertexId) -> Option<VertexId> {
        if vertex == self.out_vertex {
            Some(self.in_vertex)
        } else if vertex == self.in_vertex {
            Some(self.out_vertex)
        } else {
            None
        }
    }
}

impl GraphElement for Edge {
    type Id = EdgeId;

    fn core(&self) -> &ElementCore<EdgeId> {
        &self.core
    }
}

element_identity!(Edge);

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("id", self.core.id())
            .field("label", self.core.label())
            .field("out", &self.out_vertex)
            .field("in", &self.in_vertex)
            .finish()
    }
}
