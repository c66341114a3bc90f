//! Common test utilities for graph integration tests
//!
//! Builders for small graphs, an event recorder and a structural
//! consistency check run after concurrent workloads.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use trellis::{
    EdgeRef, GraphElement, GraphEvent, GraphObserver, NewVertex, PropertyGraph, Vertex, VertexId,
};

/// A graph holding `count` vertices labeled "Person", ids 1..=count
pub fn person_graph(count: u64) -> PropertyGraph {
    let graph = PropertyGraph::new();
    for raw in 1..=count {
        graph
            .add_vertex(
                NewVertex::new()
                    .with_id(VertexId::new(raw))
                    .with_label("Person")
                    .with_property("name", format!("person-{}", raw)),
            )
            .expect("Failed to add vertex");
    }
    graph
}

pub fn vertex_ids(vertices: &[Arc<Vertex>]) -> Vec<VertexId> {
    vertices.iter().map(|v| v.id()).collect()
}

/// Records the name of every graph event it receives
#[derive(Default)]
pub struct EventLog {
    names: Mutex<Vec<&'static str>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.names.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names.lock().unwrap().iter().filter(|n| **n == name).count()
    }
}

impl GraphObserver for EventLog {
    fn on_graph_event(&self, _graph: &PropertyGraph, event: &GraphEvent) {
        self.names.lock().unwrap().push(event.name());
    }
}

/// Every edge and hyperedge endpoint exists and lists the element, and
/// every adjacency reference resolves to an element touching the vertex.
pub fn assert_consistent(graph: &PropertyGraph) {
    for edge in graph.edges() {
        let tail = graph
            .vertex(edge.out_vertex())
            .unwrap_or_else(|| panic!("edge {} has a missing out vertex", edge.id()));
        let head = graph
            .vertex(edge.in_vertex())
            .unwrap_or_else(|| panic!("edge {} has a missing in vertex", edge.id()));
        assert!(tail.out_edges(None).contains(&EdgeRef::Edge(edge.id())));
        assert!(head.in_edges(None).contains(&EdgeRef::Edge(edge.id())));
    }

    for hyperedge in graph.hyperedges() {
        let tail = graph
            .vertex(hyperedge.tail())
            .unwrap_or_else(|| panic!("hyperedge {} has a missing tail", hyperedge.id()));
        assert!(tail.out_edges(None).contains(&EdgeRef::HyperEdge(hyperedge.id())));
        for head in hyperedge.heads() {
            let head = graph
                .vertex(*head)
                .unwrap_or_else(|| panic!("hyperedge {} has a missing head", hyperedge.id()));
            assert!(head.in_edges(None).contains(&EdgeRef::HyperEdge(hyperedge.id())));
        }
    }

    for vertex in graph.vertices() {
        for edge_ref in vertex.out_edges(None) {
            match edge_ref {
                EdgeRef::Edge(id) => {
                    let edge = graph.edge(id).expect("dangling outgoing edge reference");
                    assert_eq!(edge.out_vertex(), vertex.id());
                }
                EdgeRef::HyperEdge(id) => {
                    let hyperedge = graph.hyperedge(id).expect("dangling outgoing hyperedge reference");
                    assert_eq!(hyperedge.tail(), vertex.id());
                }
            }
        }
        for edge_ref in vertex.in_edges(None) {
            match edge_ref {
                EdgeRef::Edge(id) => {
                    let edge = graph.edge(id).expect("dangling incoming edge reference");
                    assert_eq!(edge.in_vertex(), vertex.id());
                }
                EdgeRef::HyperEdge(id) => {
                    let hyperedge = graph.hyperedge(id).expect("dangling incoming hyperedge reference");
                    assert!(hyperedge.heads().contains(&vertex.id()));
                }
            }
        }
    }
}
