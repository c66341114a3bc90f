//! PropertyGraph: the container owning every vertex, edge, hyperedge and
//! multiedge, and the entry point for structural mutation.
//!
//! Lock order is fixed: vertex adjacency locks in ascending vertex id,
//! then element map shards. No map guard is held while an adjacency lock
//! is taken, and no lock at all is held while observers or initializers
//! run.

use super::builder::{Initializer, NewEdge, NewHyperEdge, NewMultiEdge, NewVertex};
use super::edge::Edge;
use super::element::{check_property_key, element_identity, ElementCore, GraphElement};
use super::error::{GraphError, GraphResult};
use super::events::{FnGraphObserver, GraphEvent, GraphObserver, RemovalReason};
use super::factory::IdGenerators;
use super::hyperedge::HyperEdge;
use super::id::{
    EdgeId, GraphId, HyperEdgeId, Identity, IdentityGenerator, Label, MultiEdgeId, RawId,
    RevisionId, VertexId, MAX_RAW_ID,
};
use super::multiedge::MultiEdge;
use super::property::{PropertyKey, PropertyValue, ReservedKeys};
use super::vertex::{Adjacency, Direction, EdgeRef, Vertex};
use super::vote::{
    PropertyChange, PropertyEvent, PropertyHandlers, PropertyObserver, PropertyTarget,
    PropertyVoter, Vote,
};
use crate::config::GraphConfig;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, MutexGuard, PoisonError, RwLock};
use tracing::{debug, trace, warn};

/// Adjacency guards of a set of vertices, taken in ascending id order
struct AdjacencyLocks<'a> {
    guards: Vec<(VertexId, MutexGuard<'a, Adjacency>)>,
}

impl<'a> AdjacencyLocks<'a> {
    fn acquire(vertices: &'a [Arc<Vertex>]) -> Self {
        let mut ordered: Vec<&'a Arc<Vertex>> = vertices.iter().collect();
        ordered.sort_by_key(|vertex| vertex.id());
        ordered.dedup_by_key(|vertex| vertex.id());
        Self {
            guards: ordered
                .into_iter()
                .map(|vertex| (vertex.id(), vertex.lock_adjacency()))
                .collect(),
        }
    }

    /// Fail if any locked vertex is already being removed
    fn ensure_attached(&self) -> GraphResult<()> {
        match self.guards.iter().find(|(_, adjacency)| adjacency.is_detached()) {
            Some((id, _)) => Err(GraphError::unknown(id)),
            None => Ok(()),
        }
    }

    /// Drop every reference to `edge` from every locked vertex
    fn unlink(&mut self, edge: EdgeRef) {
        for (_, adjacency) in &mut self.guards {
            adjacency.remove_out(edge);
            adjacency.remove_in(edge);
        }
    }
}

/// Reject the default identity and ids past `MAX_RAW_ID` when a caller
/// supplies an id
fn check_requested<I: RawId + Identity>(requested: Option<I>) -> GraphResult<()> {
    match requested {
        Some(id) if id.is_default() => Err(GraphError::InvalidArgument(format!(
            "{} id must not be 0",
            I::kind()
        ))),
        Some(id) if id.as_raw() > MAX_RAW_ID => Err(GraphError::InvalidArgument(format!(
            "{} id {} exceeds the largest id {}",
            I::kind(),
            id,
            MAX_RAW_ID
        ))),
        _ => Ok(()),
    }
}

/// Register a new element under a requested or generated id.
///
/// An occupied requested id fails with `DuplicateIdentifier`; a generated
/// id that collides with an explicit one is skipped.
fn claim_slot<I, T>(
    map: &DashMap<I, Arc<T>>,
    generator: &IdentityGenerator<I>,
    requested: Option<I>,
    build: impl FnOnce(I) -> T,
) -> GraphResult<Arc<T>>
where
    I: RawId + Identity,
{
    check_requested(requested)?;
    if let Some(id) = requested {
        return match map.entry(id) {
            Entry::Occupied(_) => Err(GraphError::duplicate(&id)),
            Entry::Vacant(slot) => {
                generator.observe(id);
                let element = Arc::new(build(id));
                slot.insert(Arc::clone(&element));
                Ok(element)
            }
        };
    }
    loop {
        let id = generator.next_id().ok_or_else(GraphError::exhausted::<I>)?;
        if let Entry::Vacant(slot) = map.entry(id) {
            let element = Arc::new(build(id));
            slot.insert(Arc::clone(&element));
            return Ok(element);
        }
    }
}

fn snapshot<K, T: GraphElement>(map: &DashMap<K, Arc<T>>) -> Vec<Arc<T>>
where
    K: Eq + std::hash::Hash,
{
    let mut all: Vec<Arc<T>> = map.iter().map(|entry| Arc::clone(entry.value())).collect();
    all.sort_by(|a, b| a.core().id().cmp(b.core().id()));
    all
}

/// An in-memory property graph.
///
/// The graph is itself an element: it has an id, a label and a property
/// bag governed by the same vote protocol as the elements it owns.
pub struct PropertyGraph {
    core: ElementCore<GraphId>,
    config: GraphConfig,
    reserved: Arc<ReservedKeys>,
    generators: Arc<IdGenerators>,
    revisions: IdentityGenerator<RevisionId>,
    /// Graph-wide handlers consulted after each element's own
    property_handlers: Arc<PropertyHandlers>,
    observers: RwLock<Vec<Arc<dyn GraphObserver>>>,
    vertices: DashMap<VertexId, Arc<Vertex>>,
    edges: DashMap<EdgeId, Arc<Edge>>,
    hyperedges: DashMap<HyperEdgeId, Arc<HyperEdge>>,
    multi_edges: DashMap<MultiEdgeId, Arc<MultiEdge>>,
}

impl PropertyGraph {
    /// Create an empty graph with a random id and default configuration
    pub fn new() -> Self {
        let config = GraphConfig::default();
        let generators = Arc::new(IdGenerators::from_config(&config.id_start));
        Self::assemble(GraphId::new(), config, generators)
    }

    /// Create an empty graph with a random id and the given configuration
    pub fn with_config(config: GraphConfig) -> GraphResult<Self> {
        config.validate()?;
        let generators = Arc::new(IdGenerators::from_config(&config.id_start));
        Ok(Self::assemble(GraphId::new(), config, generators))
    }

    /// Wire up a graph from a configuration that was already validated
    pub(crate) fn assemble(id: GraphId, config: GraphConfig, generators: Arc<IdGenerators>) -> Self {
        let reserved = Arc::new(config.reserved_keys());
        let property_handlers = Arc::new(PropertyHandlers::new());
        // The graph takes the first revision
        let revisions = IdentityGenerator::starting_at(2);
        let core = ElementCore::new(
            id,
            RevisionId::new(1),
            config.labels.graph.clone(),
            Arc::clone(&reserved),
            Arc::clone(&property_handlers),
        );
        debug!(graph = %core.id(), "graph created");

        Self {
            core,
            config,
            reserved,
            generators,
            revisions,
            property_handlers,
            observers: RwLock::new(Vec::new()),
            vertices: DashMap::new(),
            edges: DashMap::new(),
            hyperedges: DashMap::new(),
            multi_edges: DashMap::new(),
        }
    }

    /// Get the configuration this graph was built from
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Get the property keys that hold each element's identity
    pub fn reserved_keys(&self) -> &ReservedKeys {
        &self.reserved
    }

    /// The id sources this graph draws from; possibly shared with other
    /// graphs built by the same factory
    pub fn generators(&self) -> &Arc<IdGenerators> {
        &self.generators
    }

    fn element_core<I: Identity>(&self, id: I, revision: RevisionId, label: Label) -> ElementCore<I> {
        ElementCore::new(
            id,
            revision,
            label,
            Arc::clone(&self.reserved),
            Arc::clone(&self.property_handlers),
        )
    }

    fn next_revision(&self) -> GraphResult<RevisionId> {
        self.revisions
            .next_id()
            .ok_or_else(|| GraphError::IdsExhausted("revision".to_string()))
    }

    fn check_new_properties(&self, properties: &[(PropertyKey, PropertyValue)]) -> GraphResult<()> {
        properties
            .iter()
            .try_for_each(|(key, _)| check_property_key(&self.reserved, key))
    }

    /// Apply initial properties and the initializer to a registered element.
    ///
    /// Initial properties go through the vote protocol; a veto drops the
    /// value without failing the creation.
    fn initialize<T: GraphElement>(
        &self,
        element: &T,
        properties: Vec<(PropertyKey, PropertyValue)>,
        initializer: Option<Initializer<T>>,
    ) {
        for (key, value) in properties {
            match element.core().set(key, value) {
                Ok(outcome) if !outcome.is_applied() => {
                    trace!(element = %element.core().element_ref(), "initial property vetoed")
                }
                Ok(_) => {}
                Err(err) => warn!(element = %element.core().element_ref(), %err, "initial property rejected"),
            }
        }
        if let Some(initializer) = initializer {
            initializer(element);
        }
    }

    fn require_vertex(&self, id: VertexId) -> GraphResult<Arc<Vertex>> {
        self.vertex(id).ok_or_else(|| GraphError::unknown(&id))
    }

    fn emit(&self, event: GraphEvent) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        trace!(event = event.name(), observers = observers.len());
        for observer in &observers {
            observer.on_graph_event(self, &event);
        }
    }

    // === Graph observers ===

    /// Register an observer for structural events
    pub fn subscribe(&self, observer: Arc<dyn GraphObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Subscribe a closure to every committed structural change
    pub fn on_event<F>(&self, f: F)
    where
        F: Fn(&PropertyGraph, &GraphEvent) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnGraphObserver(f)));
    }

    // === Graph-wide property handlers ===

    /// Handlers consulted for every element of this graph
    pub fn property_handlers(&self) -> &PropertyHandlers {
        &self.property_handlers
    }

    /// Register a voter consulted for every element's property changes
    pub fn add_global_voter(&self, voter: Arc<dyn PropertyVoter>) {
        self.property_handlers.add_voter(voter);
    }

    /// Register a closure voter for every element's property changes
    pub fn on_any_property_vote<F>(&self, f: F)
    where
        F: Fn(&PropertyTarget<'_>, &PropertyChange<'_>) -> Vote + Send + Sync + 'static,
    {
        self.property_handlers.add_voter_fn(f);
    }

    /// Register an observer told about every applied property change
    pub fn add_global_property_observer(&self, observer: Arc<dyn PropertyObserver>) {
        self.property_handlers.add_observer(observer);
    }

    /// Register a closure observer for every applied property change
    pub fn on_any_property_event<F>(&self, f: F)
    where
        F: Fn(&PropertyTarget<'_>, &PropertyEvent) + Send + Sync + 'static,
    {
        self.property_handlers.add_observer_fn(f);
    }

    // === Vertices ===

    /// Add a vertex under a requested or generated id
    pub fn add_vertex(&self, request: NewVertex) -> GraphResult<Arc<Vertex>> {
        let NewVertex {
            id,
            label,
            properties,
            initializer,
        } = request;
        self.check_new_properties(&properties)?;
        let label = label.unwrap_or_else(|| self.config.labels.vertex.clone());
        let revision = self.next_revision()?;

        let vertex = claim_slot(&self.vertices, &self.generators.vertex, id, |id| {
            Vertex::new(self.element_core(id, revision, label), self.config.adjacency)
        })?;

        self.initialize(&*vertex, properties, initializer);
        debug!(vertex = %vertex.id(), label = %vertex.label(), "vertex added");
        self.emit(GraphEvent::VertexAdded {
            vertex: Arc::clone(&vertex),
        });
        Ok(vertex)
    }

    /// Remove a vertex and, first, every edge and hyperedge touching it.
    ///
    /// Returns `None` if the vertex is unknown or already being removed.
    pub fn remove_vertex(&self, id: VertexId) -> Option<Arc<Vertex>> {
        let vertex = self.vertex(id)?;
        let incident = {
            let mut adjacency = vertex.lock_adjacency();
            if adjacency.is_detached() {
                return None;
            }
            adjacency.detach()
        };

        for edge_ref in incident {
            match edge_ref {
                EdgeRef::Edge(edge) => {
                    self.unregister_edge(edge, RemovalReason::Cascade);
                }
                EdgeRef::HyperEdge(hyperedge) => {
                    self.unregister_hyperedge(hyperedge, RemovalReason::Cascade);
                }
            }
        }

        let (_, removed) = self.vertices.remove(&id)?;
        debug!(vertex = %id, "vertex removed");
        self.emit(GraphEvent::VertexRemoved {
            vertex: Arc::clone(&removed),
        });
        Some(removed)
    }

    /// Get a vertex by ID
    pub fn vertex(&self, id: VertexId) -> Option<Arc<Vertex>> {
        self.vertices.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a vertex exists
    pub fn has_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Every vertex, ordered by id
    pub fn vertices(&self) -> Vec<Arc<Vertex>> {
        snapshot(&self.vertices)
    }

    /// Every vertex carrying `label`, ordered by id
    pub fn vertices_by_label(&self, label: &str) -> Vec<Arc<Vertex>> {
        self.vertices()
            .into_iter()
            .filter(|vertex| vertex.label() == label)
            .collect()
    }

    // === Edges ===

    /// Add an edge between two existing vertices and link both endpoints
    pub fn add_edge(&self, request: NewEdge) -> GraphResult<Arc<Edge>> {
        let NewEdge {
            out_vertex,
            in_vertex,
            id,
            label,
            properties,
            initializer,
        } = request;
        self.check_new_properties(&properties)?;
        check_requested(id)?;
        let endpoints = [self.require_vertex(out_vertex)?, self.require_vertex(in_vertex)?];
        let label = label.unwrap_or_else(|| self.config.labels.edge.clone());
        let revision = self.next_revision()?;

        let edge = {
            let mut locks = AdjacencyLocks::acquire(&endpoints);
            locks.ensure_attached()?;
            let edge = claim_slot(&self.edges, &self.generators.edge, id, |id| {
                Edge::new(self.element_core(id, revision, label.clone()), out_vertex, in_vertex)
            })?;
            let edge_ref = EdgeRef::Edge(edge.id());
            for (vertex, adjacency) in &mut locks.guards {
                let vertex = *vertex;
                if vertex == out_vertex {
                    adjacency.add_out(edge_ref, label.clone());
                }
                if vertex == in_vertex {
                    adjacency.add_in(edge_ref, label.clone());
                }
            }
            edge
        };

        self.initialize(&*edge, properties, initializer);
        for multi_edge in self.multi_edges() {
            multi_edge.add_if_matches(&edge);
        }
        debug!(edge = %edge.id(), from = %out_vertex, to = %in_vertex, label = %edge.label(), "edge added");
        self.emit(GraphEvent::EdgeAdded {
            edge: Arc::clone(&edge),
        });
        Ok(edge)
    }

    /// Remove an edge, unlinking its endpoints and pruning it from every multiedge
    pub fn remove_edge(&self, id: EdgeId) -> Option<Arc<Edge>> {
        self.unregister_edge(id, RemovalReason::Direct)
    }

    fn unregister_edge(&self, id: EdgeId, reason: RemovalReason) -> Option<Arc<Edge>> {
        let edge = self.edge(id)?;
        let endpoints = self.vertex_handles(&[edge.out_vertex(), edge.in_vertex()]);
        let removed = {
            let mut locks = AdjacencyLocks::acquire(&endpoints);
            let (_, removed) = self.edges.remove(&id)?;
            removed.mark_removed();
            locks.unlink(EdgeRef::Edge(id));
            removed
        };

        for multi_edge in self.multi_edges() {
            multi_edge.forget(id);
        }
        debug!(edge = %id, ?reason, "edge removed");
        self.emit(GraphEvent::EdgeRemoved {
            edge: Arc::clone(&removed),
            reason,
        });
        Some(removed)
    }

    /// Get an edge by ID
    pub fn edge(&self, id: EdgeId) -> Option<Arc<Edge>> {
        self.edges.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if an edge exists
    pub fn has_edge(&self, id: EdgeId) -> bool {
        self.edges.contains_key(&id)
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Every edge, ordered by id
    pub fn edges(&self) -> Vec<Arc<Edge>> {
        snapshot(&self.edges)
    }

    /// Every edge carrying `label`, ordered by id
    pub fn edges_by_label(&self, label: &str) -> Vec<Arc<Edge>> {
        self.edges()
            .into_iter()
            .filter(|edge| edge.label() == label)
            .collect()
    }

    // === Hyperedges ===

    /// Add a hyperedge from `tail` to one or more existing head vertices
    pub fn add_hyperedge(&self, request: NewHyperEdge) -> GraphResult<Arc<HyperEdge>> {
        let NewHyperEdge {
            tail,
            heads,
            id,
            label,
            properties,
            initializer,
        } = request;
        if heads.is_empty() {
            return Err(GraphError::InvalidArgument(
                "a hyperedge needs at least one head vertex".to_string(),
            ));
        }
        self.check_new_properties(&properties)?;
        check_requested(id)?;
        let endpoints = std::iter::once(tail)
            .chain(heads.iter().copied())
            .map(|vertex| self.require_vertex(vertex))
            .collect::<GraphResult<Vec<_>>>()?;
        let label = label.unwrap_or_else(|| self.config.labels.hyperedge.clone());
        let revision = self.next_revision()?;

        let hyperedge = {
            let mut locks = AdjacencyLocks::acquire(&endpoints);
            locks.ensure_attached()?;
            let hyperedge = claim_slot(&self.hyperedges, &self.generators.hyperedge, id, |id| {
                HyperEdge::new(self.element_core(id, revision, label.clone()), tail, heads.clone())
            })?;
            let edge_ref = EdgeRef::HyperEdge(hyperedge.id());
            for (vertex, adjacency) in &mut locks.guards {
                let vertex = *vertex;
                if vertex == tail {
                    adjacency.add_out(edge_ref, label.clone());
                }
                for _ in heads.iter().filter(|head| **head == vertex) {
                    adjacency.add_in(edge_ref, label.clone());
                }
            }
            hyperedge
        };

        self.initialize(&*hyperedge, properties, initializer);
        debug!(hyperedge = %hyperedge.id(), tail = %tail, arity = hyperedge.arity(), "hyperedge added");
        self.emit(GraphEvent::HyperEdgeAdded {
            hyperedge: Arc::clone(&hyperedge),
        });
        Ok(hyperedge)
    }

    /// Remove a hyperedge and unlink its tail and heads
    pub fn remove_hyperedge(&self, id: HyperEdgeId) -> Option<Arc<HyperEdge>> {
        self.unregister_hyperedge(id, RemovalReason::Direct)
    }

    fn unregister_hyperedge(&self, id: HyperEdgeId, reason: RemovalReason) -> Option<Arc<HyperEdge>> {
        let hyperedge = self.hyperedge(id)?;
        let endpoints = self.vertex_handles(&hyperedge.vertices());
        let removed = {
            let mut locks = AdjacencyLocks::acquire(&endpoints);
            let (_, removed) = self.hyperedges.remove(&id)?;
            locks.unlink(EdgeRef::HyperEdge(id));
            removed
        };

        debug!(hyperedge = %id, ?reason, "hyperedge removed");
        self.emit(GraphEvent::HyperEdgeRemoved {
            hyperedge: Arc::clone(&removed),
            reason,
        });
        Some(removed)
    }

    /// Get a hyperedge by ID
    pub fn hyperedge(&self, id: HyperEdgeId) -> Option<Arc<HyperEdge>> {
        self.hyperedges.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a hyperedge exists
    pub fn has_hyperedge(&self, id: HyperEdgeId) -> bool {
        self.hyperedges.contains_key(&id)
    }

    /// Get the number of hyperedges
    pub fn hyperedge_count(&self) -> usize {
        self.hyperedges.len()
    }

    /// Every hyperedge, ordered by id
    pub fn hyperedges(&self) -> Vec<Arc<HyperEdge>> {
        snapshot(&self.hyperedges)
    }

    // === Multiedges ===

    /// Register a multiedge and aggregate every existing edge its selector
    /// accepts
    pub fn add_multi_edge(&self, request: NewMultiEdge) -> GraphResult<Arc<MultiEdge>> {
        let NewMultiEdge {
            selector,
            id,
            label,
            properties,
            initializer,
        } = request;
        self.check_new_properties(&properties)?;
        let label = label.unwrap_or_else(|| self.config.labels.multi_edge.clone());
        let revision = self.next_revision()?;

        let multi_edge = claim_slot(&self.multi_edges, &self.generators.multi_edge, id, |id| {
            MultiEdge::new(self.element_core(id, revision, label), selector)
        })?;

        self.initialize(&*multi_edge, properties, initializer);
        for edge in self.edges() {
            multi_edge.add_if_matches(&edge);
        }
        debug!(
            multi_edge = %multi_edge.id(),
            edges = multi_edge.number_of_edges(),
            "multiedge added"
        );
        self.emit(GraphEvent::MultiEdgeAdded {
            multi_edge: Arc::clone(&multi_edge),
        });
        Ok(multi_edge)
    }

    /// Aggregate `edge` if it matches, undoing the aggregation when the
    /// edge was removed concurrently

    /// Remove a multiedge; the edges it aggregated are untouched
    pub fn remove_multi_edge(&self, id: MultiEdgeId) -> Option<Arc<MultiEdge>> {
        let (_, removed) = self.multi_edges.remove(&id)?;
        debug!(multi_edge = %id, "multiedge removed");
        self.emit(GraphEvent::MultiEdgeRemoved {
            multi_edge: Arc::clone(&removed),
        });
        Some(removed)
    }

    /// Get a multiedge by ID
    pub fn multi_edge(&self, id: MultiEdgeId) -> Option<Arc<MultiEdge>> {
        self.multi_edges.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a multiedge exists
    pub fn has_multi_edge(&self, id: MultiEdgeId) -> bool {
        self.multi_edges.contains_key(&id)
    }

    /// Get the number of multiedges
    pub fn multi_edge_count(&self) -> usize {
        self.multi_edges.len()
    }

    /// Every multiedge, ordered by id
    pub fn multi_edges(&self) -> Vec<Arc<MultiEdge>> {
        snapshot(&self.multi_edges)
    }

    // === Traversal ===

    fn vertex_handles(&self, ids: &[VertexId]) -> Vec<Arc<Vertex>> {
        ids.iter().filter_map(|id| self.vertex(*id)).collect()
    }

    fn resolve_edges(&self, refs: Vec<EdgeRef>) -> Vec<Arc<Edge>> {
        refs.into_iter()
            .filter_map(|edge_ref| match edge_ref {
                EdgeRef::Edge(id) => self.edge(id),
                EdgeRef::HyperEdge(_) => None,
            })
            .collect()
    }

    fn resolve_hyperedges(&self, refs: Vec<EdgeRef>) -> Vec<Arc<HyperEdge>> {
        refs.into_iter()
            .filter_map(|edge_ref| match edge_ref {
                EdgeRef::HyperEdge(id) => self.hyperedge(id),
                EdgeRef::Edge(_) => None,
            })
            .collect()
    }

    /// Edges leaving `vertex`, optionally restricted to one label
    pub fn out_edges(&self, vertex: VertexId, label: Option<&str>) -> GraphResult<Vec<Arc<Edge>>> {
        let vertex = self.require_vertex(vertex)?;
        Ok(self.resolve_edges(vertex.out_edges(label)))
    }

    /// Edges entering `vertex`, optionally restricted to one label
    pub fn in_edges(&self, vertex: VertexId, label: Option<&str>) -> GraphResult<Vec<Arc<Edge>>> {
        let vertex = self.require_vertex(vertex)?;
        Ok(self.resolve_edges(vertex.in_edges(label)))
    }

    /// Hyperedges whose tail is `vertex`
    pub fn out_hyperedges(&self, vertex: VertexId, label: Option<&str>) -> GraphResult<Vec<Arc<HyperEdge>>> {
        let vertex = self.require_vertex(vertex)?;
        Ok(self.resolve_hyperedges(vertex.out_edges(label)))
    }

    /// Hyperedges listing `vertex` among their heads
    pub fn in_hyperedges(&self, vertex: VertexId, label: Option<&str>) -> GraphResult<Vec<Arc<HyperEdge>>> {
        let vertex = self.require_vertex(vertex)?;
        Ok(self.resolve_hyperedges(vertex.in_edges(label)))
    }

    /// Vertices one hop away through edges and hyperedges, each listed
    /// once in first-seen order
    pub fn neighbors(&self, vertex: VertexId, direction: Direction) -> GraphResult<Vec<Arc<Vertex>>> {
        let origin = self.require_vertex(vertex)?;
        let mut found: Vec<VertexId> = Vec::new();
        let mut push = |id: VertexId| {
            if !found.contains(&id) {
                found.push(id);
            }
        };

        if matches!(direction, Direction::Out | Direction::Both) {
            for edge_ref in origin.out_edges(None) {
                match edge_ref {
                    EdgeRef::Edge(id) => self.edge(id).into_iter().for_each(|e| push(e.in_vertex())),
                    EdgeRef::HyperEdge(id) => self
                        .hyperedge(id)
                        .into_iter()
                        .for_each(|h| h.heads().iter().copied().for_each(&mut push)),
                }
            }
        }
        if matches!(direction, Direction::In | Direction::Both) {
            for edge_ref in origin.in_edges(None) {
                match edge_ref {
                    EdgeRef::Edge(id) => self.edge(id).into_iter().for_each(|e| push(e.out_vertex())),
                    EdgeRef::HyperEdge(id) => self.hyperedge(id).into_iter().for_each(|h| push(h.tail())),
                }
            }
        }

        Ok(self.vertex_handles(&found))
    }

    /// Remove every element, firing the usual removal events
    pub fn clear(&self) {
        for multi_edge in self.multi_edges() {
            self.remove_multi_edge(multi_edge.id());
        }
        for vertex in self.vertices() {
            self.remove_vertex(vertex.id());
        }
        debug!(graph = %self.core.id(), "graph cleared");
    }

    /// Check if the graph holds no elements
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.multi_edges.is_empty()
    }
}

impl Default for PropertyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphElement for PropertyGraph {
    type Id = GraphId;

    fn core(&self) -> &ElementCore<GraphId> {
        &self.core
    }
}

element_identity!(PropertyGraph);

impl fmt::Debug for PropertyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyGraph")
            .field("id", self.core.id())
            .field("label", self.core.label())
            .field("vertices", &self.vertex_count())
            .field("edges", &self.edge_count())
            .field("hyperedges", &self.hyperedge_count())
            .field("multi_edges", &self.multi_edge_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::vote::MutationOutcome;
    use std::sync::Mutex;

    fn vid(raw: u64) -> VertexId {
        VertexId::new(raw)
    }

    fn pair() -> (PropertyGraph, Arc<Vertex>, Arc<Vertex>) {
        let graph = PropertyGraph::new();
        let a = graph.add_vertex(NewVertex::new().with_id(vid(1))).unwrap();
        let b = graph.add_vertex(NewVertex::new().with_id(vid(2))).unwrap();
        (graph, a, b)
    }

    #[test]
    fn test_new_graph_is_empty() {
        let graph = PropertyGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.vertex_count(), 0);
        assert_eq!(graph.label(), "graph");
        assert_eq!(graph.revision(), RevisionId::new(1));
    }

    #[test]
    fn test_generated_ids_skip_explicit_ones() {
        let graph = PropertyGraph::new();
        graph.add_vertex(NewVertex::new().with_id(vid(5))).unwrap();
        let generated = graph.add_vertex(NewVertex::new()).unwrap();
        assert_eq!(generated.id(), vid(6));
    }

    #[test]
    fn test_default_id_is_rejected() {
        let graph = PropertyGraph::new();
        let result = graph.add_vertex(NewVertex::new().with_id(vid(0)));
        assert!(matches!(result, Err(GraphError::InvalidArgument(_))));
        assert_eq!(graph.vertex_count(), 0);
    }

    #[test]
    fn test_id_past_max_raw_id_is_rejected() {
        let graph = PropertyGraph::new();
        let result = graph.add_vertex(NewVertex::new().with_id(vid(u64::MAX)));
        assert!(matches!(result, Err(GraphError::InvalidArgument(_))));
        assert_eq!(graph.vertex_count(), 0);
    }

    #[test]
    fn test_generated_ids_stop_at_max_raw_id() {
        let graph = PropertyGraph::new();
        let top = graph
            .add_vertex(NewVertex::new().with_id(vid(MAX_RAW_ID)))
            .unwrap();
        assert_eq!(top.property("Id"), Some(PropertyValue::Int(i64::MAX)));

        let result = graph.add_vertex(NewVertex::new());
        assert!(matches!(result, Err(GraphError::IdsExhausted(_))));
        assert_eq!(graph.vertex_count(), 1);
        assert!(!graph.has_vertex(vid(0)));

        // Explicit ids below the top are still accepted
        assert!(graph.add_vertex(NewVertex::new().with_id(vid(7))).is_ok());
    }

    #[test]
    fn test_reserved_initial_property_is_rejected() {
        let graph = PropertyGraph::new();
        let result = graph.add_vertex(NewVertex::new().with_property("Id", 9i64));
        assert!(matches!(result, Err(GraphError::IdentityImmutable(_))));
        assert_eq!(graph.vertex_count(), 0);
    }

    #[test]
    fn test_revisions_are_unique_across_kinds() {
        let (graph, a, b) = pair();
        let edge = graph.add_edge(NewEdge::new(a.id(), b.id())).unwrap();
        let mut revisions = vec![graph.revision(), a.revision(), b.revision(), edge.revision()];
        revisions.sort();
        revisions.dedup();
        assert_eq!(revisions.len(), 4);
    }

    #[test]
    fn test_edge_with_unknown_endpoint_fails() {
        let (graph, a, _) = pair();
        let result = graph.add_edge(NewEdge::new(a.id(), vid(99)));
        assert!(matches!(result, Err(GraphError::UnknownElement { .. })));
        assert_eq!(a.out_degree(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_duplicate_edge_id_leaves_adjacency_untouched() {
        let (graph, a, b) = pair();
        let id = EdgeId::new(10);
        graph.add_edge(NewEdge::new(a.id(), b.id()).with_id(id)).unwrap();
        let result = graph.add_edge(NewEdge::new(b.id(), a.id()).with_id(id));
        assert!(matches!(result, Err(GraphError::DuplicateIdentifier { .. })));
        assert_eq!(b.out_degree(), 0);
        assert_eq!(a.in_degree(), 0);
    }

    #[test]
    fn test_self_loop_is_in_both_lists() {
        let (graph, a, _) = pair();
        let edge = graph.add_edge(NewEdge::new(a.id(), a.id())).unwrap();
        assert_eq!(a.out_edges(None), vec![EdgeRef::Edge(edge.id())]);
        assert_eq!(a.in_edges(None), vec![EdgeRef::Edge(edge.id())]);

        graph.remove_edge(edge.id()).unwrap();
        assert_eq!(a.degree(), 0);
    }

    #[test]
    fn test_empty_hyperedge_is_invalid() {
        let (graph, a, _) = pair();
        let result = graph.add_hyperedge(NewHyperEdge::new(a.id(), Vec::new()));
        assert!(matches!(result, Err(GraphError::InvalidArgument(_))));
    }

    #[test]
    fn test_hyperedge_links_tail_and_heads() {
        let (graph, a, b) = pair();
        let c = graph.add_vertex(NewVertex::new()).unwrap();
        let meeting = graph
            .add_hyperedge(NewHyperEdge::new(a.id(), [b.id(), c.id()]).with_label("meeting"))
            .unwrap();

        assert_eq!(graph.out_hyperedges(a.id(), None).unwrap().len(), 1);
        assert_eq!(graph.in_hyperedges(c.id(), Some("meeting")).unwrap().len(), 1);
        assert!(graph.out_edges(a.id(), None).unwrap().is_empty());

        let neighbors: Vec<_> = graph
            .neighbors(a.id(), Direction::Out)
            .unwrap()
            .iter()
            .map(|v| v.id())
            .collect();
        assert_eq!(neighbors, vec![b.id(), c.id()]);

        graph.remove_hyperedge(meeting.id()).unwrap();
        assert_eq!(a.degree() + b.degree() + c.degree(), 0);
    }

    #[test]
    fn test_initial_properties_go_through_voters() {
        let graph = PropertyGraph::new();
        graph.on_any_property_vote(|_, change| match change {
            PropertyChange::Adding { key: "secret", .. } => Vote::Deny,
            _ => Vote::Approve,
        });
        let vertex = graph
            .add_vertex(
                NewVertex::new()
                    .with_property("name", "alice")
                    .with_property("secret", "x"),
            )
            .unwrap();
        assert_eq!(vertex.try_get_property::<String>("name"), Some("alice".into()));
        assert!(!vertex.contains_key("secret"));
    }

    #[test]
    fn test_initializer_runs_before_added_event() {
        let graph = PropertyGraph::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        graph.on_event(move |_, event| {
            if let GraphEvent::VertexAdded { vertex } = event {
                *sink.lock().unwrap() = vertex.try_get_property::<i64>("rank");
            }
        });
        graph
            .add_vertex(NewVertex::new().with_initializer(|v| {
                v.set_property("rank", 3i64).unwrap();
            }))
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(3));
    }

    #[test]
    fn test_graph_is_its_own_element() {
        let graph = PropertyGraph::new();
        graph.set_property("name", "social").unwrap();
        graph.on_vote(|_, _| Vote::Deny);
        assert_eq!(graph.try_set_property("name", "other").unwrap(), MutationOutcome::Vetoed);
        assert_eq!(graph.try_get_property::<String>("name"), Some("social".into()));
    }

    #[test]
    fn test_clear_removes_everything() {
        let (graph, a, b) = pair();
        graph.add_edge(NewEdge::new(a.id(), b.id())).unwrap();
        graph.add_multi_edge(NewMultiEdge::matching(|_| true)).unwrap();
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }
}
