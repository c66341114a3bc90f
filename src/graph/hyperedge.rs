//! Hyperedges: one tail vertex, many head vertices

use super::element::{element_identity, ElementCore, GraphElement};
use super::id::{HyperEdgeId, VertexId};
use std::fmt;

/// An N-ary directed relation from a tail vertex to an ordered list of
/// head vertices. Endpoints and label are fixed at construction.
pub struct HyperEdge {
    core: ElementCore<HyperEdgeId>,
    tail: VertexId,
    heads: Vec<VertexId>,
}

impl HyperEdge {
    pub(crate) fn new(core: ElementCore<HyperEdgeId>, tail: VertexId, heads: Vec<VertexId>) -> Self {
        Self { core, tail, heads }
    }

    pub fn tail(&self) -> VertexId {
        self.tail
    }

    /// Head vertices in the order they were given
    pub fn heads(&self) -> &[VertexId] {
        &self.heads
    }

    pub fn arity(&self) -> usize {
        self.heads.len()
    }

    pub fn touches(&self, vertex: VertexId) -> bool {
        self.tail == vertex || self.heads.contains(&vertex)
    }

    /// Every distinct endpoint, sorted
    pub fn vertices(&self) -> Vec<VertexId> {
        let mut all: Vec<VertexId> = std::iter::once(self.tail)
            .chain(self.heads.iter().copied())
            .collect();
        all.sort();
        all.dedup();
        all
    }
}

impl GraphElement for HyperEdge {
    type Id = HyperEdgeId;

    fn core(&self) -> &ElementCore<HyperEdgeId> {
        &self.core
    }
}

element_identity!(HyperEdge);

impl fmt::Debug for HyperEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperEdge")
            .field("id", self.core.id())
            .field("label", self.core.label())
            .field("tail", &self.tail)
            .field("heads", &self.heads)
            .finish()
    }
}
