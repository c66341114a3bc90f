//! Vertices and their adjacency bookkeeping

use super::element::{element_identity, ElementCore, GraphElement};
use super::id::{EdgeId, HyperEdgeId, Label, VertexId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Non-owning reference from a vertex to an incident edge or hyperedge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EdgeRef {
    Edge(EdgeId),
    HyperEdge(HyperEdgeId),
}

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edge(id) => write!(f, "edge {}", id),
            Self::HyperEdge(id) => write!(f, "hyperedge {}", id),
        }
    }
}

impl From<EdgeId> for EdgeRef {
    fn from(id: EdgeId) -> Self {
        Self::Edge(id)
    }
}

impl From<HyperEdgeId> for EdgeRef {
    fn from(id: HyperEdgeId) -> Self {
        Self::HyperEdge(id)
    }
}

/// One adjacency entry. Edge labels never change, so caching the label
/// here keeps label filtering local to the vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacentEdge {
    pub edge: EdgeRef,
    pub label: Label,
}

/// How a vertex stores repeated references to the same edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjacencyPolicy {
    /// Keep every reference, duplicates included
    #[default]
    List,
    /// Collapse duplicate references
    Set,
}

/// Direction of traversal relative to a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Out,
    In,
    Both,
}

/// Both adjacency collections of a vertex, guarded together by one lock
#[derive(Debug)]
pub(crate) struct Adjacency {
    policy: AdjacencyPolicy,
    outgoing: Vec<AdjacentEdge>,
    incoming: Vec<AdjacentEdge>,
    /// Set once removal of the vertex has begun; no edge may attach after
    detached: bool,
}

impl Adjacency {
    fn new(policy: AdjacencyPolicy) -> Self {
        Self {
            policy,
            outgoing: Vec::new(),
            incoming: Vec::new(),
            detached: false,
        }
    }

    fn push(policy: AdjacencyPolicy, list: &mut Vec<AdjacentEdge>, entry: AdjacentEdge) -> bool {
        if policy == AdjacencyPolicy::Set && list.iter().any(|e| e.edge == entry.edge) {
            return false;
        }
        list.push(entry);
        true
    }

    fn drop_ref(list: &mut Vec<AdjacentEdge>, edge: EdgeRef) -> bool {
        let before = list.len();
        list.retain(|e| e.edge != edge);
        list.len() != before
    }

    fn select(list: &[AdjacentEdge], label: Option<&str>) -> Vec<EdgeRef> {
        list.iter()
            .filter(|e| label.map_or(true, |l| e.label == l))
            .map(|e| e.edge)
            .collect()
    }

    pub(crate) fn add_out(&mut self, edge: EdgeRef, label: Label) -> bool {
        Self::push(self.policy, &mut self.outgoing, AdjacentEdge { edge, label })
    }

    pub(crate) fn add_in(&mut self, edge: EdgeRef, label: Label) -> bool {
        Self::push(self.policy, &mut self.incoming, AdjacentEdge { edge, label })
    }

    /// Remove every outgoing reference to `edge`
    pub(crate) fn remove_out(&mut self, edge: EdgeRef) -> bool {
        Self::drop_ref(&mut self.outgoing, edge)
    }

    /// Remove every incoming reference to `edge`
    pub(crate) fn remove_in(&mut self, edge: EdgeRef) -> bool {
        Self::drop_ref(&mut self.incoming, edge)
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached
    }

    /// Mark the vertex as being removed and return every distinct
    /// incident reference, outgoing first.
    pub(crate) fn detach(&mut self) -> Vec<EdgeRef> {
        self.detached = true;
        let mut refs: Vec<EdgeRef> = Vec::with_capacity(self.outgoing.len() + self.incoming.len());
        for entry in self.outgoing.iter().chain(self.incoming.iter()) {
            if !refs.contains(&entry.edge) {
                refs.push(entry.edge);
            }
        }
        refs
    }
}

/// A vertex in the property graph.
///
/// Holds only non-owning references to incident edges; the graph owns
/// every element. Adjacency is mutated by the graph, which keeps both
/// endpoints of an edge consistent with its edge maps.
pub struct Vertex {
    core: ElementCore<VertexId>,
    adjacency: Mutex<Adjacency>,
}

impl Vertex {
    pub(crate) fn new(core: ElementCore<VertexId>, policy: AdjacencyPolicy) -> Self {
        Self {
            core,
            adjacency: Mutex::new(Adjacency::new(policy)),
        }
    }

    pub(crate) fn lock_adjacency(&self) -> MutexGuard<'_, Adjacency> {
        self.adjacency.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Outgoing references, optionally restricted to one label
    pub fn out_edges(&self, label: Option<&str>) -> Vec<EdgeRef> {
        Adjacency::select(&self.lock_adjacency().outgoing, label)
    }

    /// Incoming references, optionally restricted to one label
    pub fn in_edges(&self, label: Option<&str>) -> Vec<EdgeRef> {
        Adjacency::select(&self.lock_adjacency().incoming, label)
    }

    pub fn edges(&self, direction: Direction, label: Option<&str>) -> Vec<EdgeRef> {
        match direction {
            Direction::Out => self.out_edges(label),
            Direction::In => self.in_edges(label),
            Direction::Both => {
                let adjacency = self.lock_adjacency();
                let mut refs = Adjacency::select(&adjacency.outgoing, label);
                refs.extend(Adjacency::select(&adjacency.incoming, label));
                refs
            }
        }
    }

    pub fn out_degree(&self) -> usize {
        self.lock_adjacency().outgoing.len()
    }

    pub fn in_degree(&self) -> usize {
        self.lock_adjacency().incoming.len()
    }

    pub fn degree(&self) -> usize {
        let adjacency = self.lock_adjacency();
        adjacency.outgoing.len() + adjacency.incoming.len()
    }

    pub fn policy(&self) -> AdjacencyPolicy {
        self.lock_adjacency().policy
    }
}

impl GraphElement for Vertex {
    type Id = VertexId;

    fn core(&self) -> &ElementCore<VertexId> {
        &self.core
    }
}

element_identity!(Vertex);

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vertex")
            .field("id", self.core.id())
            .field("label", self.core.label())
            .field("revision", &self.core.revision())
            .finish()
    }
}
