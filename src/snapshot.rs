//! JSON snapshots of a graph, built from the public read surface
//!
//! A snapshot records every element's id, label and non-reserved, non-null
//! properties. Restoring replays it through the ordinary `add_*` calls, so
//! voters, observers and id validation all apply. Multiedge selectors are
//! code and cannot be recorded; restore skips multiedges.

use crate::graph::{
    EdgeId, GraphElement, GraphFactory, GraphId, GraphResult, HyperEdgeId, Identity, Label,
    MultiEdgeId, NewEdge, NewHyperEdge, NewVertex, PropertyGraph, PropertyKey, PropertyValue,
    VertexId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Identity, label and ordinary properties of one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord<I> {
    pub id: I,
    pub label: Label,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<PropertyKey, PropertyValue>,
}

impl<I: Identity> ElementRecord<I> {
    fn capture<T>(element: &T) -> Self
    where
        T: GraphElement<Id = I>,
    {
        let reserved = element.core().reserved_keys();
        Self {
            id: element.id(),
            label: element.label().clone(),
            properties: element
                .properties_where(|key, _| !reserved.is_reserved(key))
                .into_iter()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(flatten)]
    pub element: ElementRecord<EdgeId>,
    pub out_vertex: VertexId,
    pub in_vertex: VertexId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperEdgeRecord {
    #[serde(flatten)]
    pub element: ElementRecord<HyperEdgeId>,
    pub tail: VertexId,
    pub heads: Vec<VertexId>,
}

/// A multiedge's identity and the edges it aggregated at capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiEdgeRecord {
    #[serde(flatten)]
    pub element: ElementRecord<MultiEdgeId>,
    pub edges: Vec<EdgeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub graph: ElementRecord<GraphId>,
    pub captured_at: DateTime<Utc>,
    pub vertices: Vec<ElementRecord<VertexId>>,
    pub edges: Vec<EdgeRecord>,
    #[serde(default)]
    pub hyperedges: Vec<HyperEdgeRecord>,
    #[serde(default)]
    pub multi_edges: Vec<MultiEdgeRecord>,
}

impl GraphSnapshot {
    /// Record every element of `graph`, each kind ordered by id.
    ///
    /// Elements added or removed while capturing may or may not appear.
    pub fn capture(graph: &PropertyGraph) -> Self {
        let snapshot = Self {
            graph: ElementRecord::capture(graph),
            captured_at: Utc::now(),
            vertices: graph.vertices().iter().map(|v| ElementRecord::capture(&**v)).collect(),
            edges: graph
                .edges()
                .iter()
                .map(|e| EdgeRecord {
                    element: ElementRecord::capture(&**e),
                    out_vertex: e.out_vertex(),
                    in_vertex: e.in_vertex(),
                })
                .collect(),
            hyperedges: graph
                .hyperedges()
                .iter()
                .map(|h| HyperEdgeRecord {
                    element: ElementRecord::capture(&**h),
                    tail: h.tail(),
                    heads: h.heads().to_vec(),
                })
                .collect(),
            multi_edges: graph
                .multi_edges()
                .iter()
                .map(|m| MultiEdgeRecord {
                    element: ElementRecord::capture(&**m),
                    edges: m.edge_ids(),
                })
                .collect(),
        };
        debug!(
            graph = %snapshot.graph.id,
            vertices = snapshot.vertices.len(),
            edges = snapshot.edges.len(),
            "snapshot captured"
        );
        snapshot
    }

    pub fn to_json(&self) -> GraphResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> GraphResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> GraphResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild the recorded graph with `factory`.
    ///
    /// The graph keeps its recorded id; its label comes from the factory's
    /// configuration.
    pub fn restore(&self, factory: &GraphFactory) -> GraphResult<Arc<PropertyGraph>> {
        let graph = factory.create_graph(self.graph.id.clone());
        for (key, value) in &self.graph.properties {
            graph.set_property(key.clone(), value.clone())?;
        }

        for record in &self.vertices {
            let mut request = NewVertex::new()
                .with_id(record.id)
                .with_label(record.label.clone());
            for (key, value) in &record.properties {
                request = request.with_property(key.clone(), value.clone());
            }
            graph.add_vertex(request)?;
        }

        for record in &self.edges {
            let mut request = NewEdge::new(record.out_vertex, record.in_vertex)
                .with_id(record.element.id)
                .with_label(record.element.label.clone());
            for (key, value) in &record.element.properties {
                request = request.with_property(key.clone(), value.clone());
            }
            graph.add_edge(request)?;
        }

        for record in &self.hyperedges {
            let mut request = NewHyperEdge::new(record.tail, record.heads.iter().copied())
                .with_id(record.element.id)
                .with_label(record.element.label.clone());
            for (key, value) in &record.element.properties {
                request = request.with_property(key.clone(), value.clone());
            }
            graph.add_hyperedge(request)?;
        }

        if !self.multi_edges.is_empty() {
            debug!(
                skipped = self.multi_edges.len(),
                "multiedge selectors are not recorded; skipping"
            );
        }
        info!(
            graph = %graph.id(),
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            "snapshot restored"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeRef, GraphError, NewMultiEdge};

    fn sample() -> PropertyGraph {
        let graph = PropertyGraph::new();
        graph.set_property("name", "social").unwrap();
        let alice = graph
            .add_vertex(
                NewVertex::new()
                    .with_id(VertexId::new(1))
                    .with_label("Person")
                    .with_property("name", "alice"),
            )
            .unwrap();
        let bob = graph
            .add_vertex(NewVertex::new().with_id(VertexId::new(2)).with_label("Person"))
            .unwrap();
        graph
            .add_edge(
                NewEdge::new(alice.id(), bob.id())
                    .with_id(EdgeId::new(10))
                    .with_label("knows")
                    .with_property("since", 2020i64),
            )
            .unwrap();
        graph
            .add_hyperedge(NewHyperEdge::new(alice.id(), [bob.id()]).with_label("meeting"))
            .unwrap();
        graph
            .add_multi_edge(NewMultiEdge::with_edge_labels(["knows"]))
            .unwrap();
        graph
    }

    #[test]
    fn test_capture_skips_reserved_keys() {
        let snapshot = GraphSnapshot::capture(&sample());
        assert_eq!(snapshot.vertices.len(), 2);
        let alice = &snapshot.vertices[0];
        assert_eq!(alice.id, VertexId::new(1));
        assert_eq!(alice.properties.len(), 1);
        assert_eq!(alice.properties["name"], PropertyValue::from("alice"));
        assert_eq!(snapshot.multi_edges[0].edges, vec![EdgeId::new(10)]);
    }

    #[test]
    fn test_json_shape() {
        let snapshot = GraphSnapshot::capture(&sample());
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(value["edges"][0]["id"], 10);
        assert_eq!(value["edges"][0]["label"], "knows");
        assert_eq!(value["edges"][0]["out_vertex"], 1);
        assert_eq!(value["edges"][0]["properties"]["since"], 2020);
        assert!(value["vertices"][1].get("properties").is_none());
    }

    #[test]
    fn test_restore_rebuilds_structure() {
        let original = sample();
        let json = GraphSnapshot::capture(&original).to_json_pretty().unwrap();
        let restored = GraphSnapshot::from_json(&json)
            .unwrap()
            .restore(&GraphFactory::default())
            .unwrap();

        assert_eq!(restored.id(), original.id());
        assert_eq!(restored.try_get_property::<String>("name"), Some("social".into()));
        assert_eq!(restored.vertex_count(), 2);
        assert_eq!(restored.hyperedge_count(), 1);
        assert_eq!(restored.multi_edge_count(), 0);

        let alice = restored.vertex(VertexId::new(1)).unwrap();
        assert_eq!(alice.label(), "Person");
        assert!(alice.out_edges(Some("knows")).contains(&EdgeRef::Edge(EdgeId::new(10))));
        let knows = restored.edge(EdgeId::new(10)).unwrap();
        assert_eq!(knows.try_get_property::<i64>("since"), Some(2020));
    }

    #[test]
    fn test_restore_reports_dangling_edge() {
        let mut snapshot = GraphSnapshot::capture(&sample());
        snapshot.vertices.retain(|v| v.id != VertexId::new(2));
        let result = snapshot.restore(&GraphFactory::default());
        assert!(matches!(result, Err(GraphError::UnknownElement { .. })));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        assert!(matches!(
            GraphSnapshot::from_json("{\"graph\": 3}"),
            Err(GraphError::Serialization(_))
        ));
    }
}
