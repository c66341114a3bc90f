//! Creation requests for the graph's `add_*` factories
//!
//! Each request names an optional explicit id, an optional label (the
//! graph's per-kind default otherwise), initial properties and an optional
//! initializer run once the element is registered.

use super::edge::Edge;
use super::hyperedge::HyperEdge;
use super::id::{EdgeId, HyperEdgeId, Label, MultiEdgeId, VertexId};
use super::multiedge::{label_selector, EdgeSelector, MultiEdge};
use super::property::{PropertyKey, PropertyValue};
use super::vertex::Vertex;
use std::sync::Arc;

/// Runs against a freshly registered element, before its added event fires
pub type Initializer<T> = Box<dyn FnOnce(&T)>;

/// Request for [`PropertyGraph::add_vertex`](super::PropertyGraph::add_vertex)
#[derive(Default)]
pub struct NewVertex {
    pub(crate) id: Option<VertexId>,
    pub(crate) label: Option<Label>,
    pub(crate) properties: Vec<(PropertyKey, PropertyValue)>,
    pub(crate) initializer: Option<Initializer<Vertex>>,
}

impl NewVertex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: VertexId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<PropertyKey>, value: impl Into<PropertyValue>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn with_initializer(mut self, initializer: impl FnOnce(&Vertex) + 'static) -> Self {
        self.initializer = Some(Box::new(initializer));
        self
    }
}

/// Request for [`PropertyGraph::add_edge`](super::PropertyGraph::add_edge)
pub struct NewEdge {
    pub(crate) out_vertex: VertexId,
    pub(crate) in_vertex: VertexId,
    pub(crate) id: Option<EdgeId>,
    pub(crate) label: Option<Label>,
    pub(crate) properties: Vec<(PropertyKey, PropertyValue)>,
    pub(crate) initializer: Option<Initializer<Edge>>,
}

impl NewEdge {
    /// An edge leaving `out_vertex` and entering `in_vertex`
    pub fn new(out_vertex: VertexId, in_vertex: VertexId) -> Self {
        Self {
            out_vertex,
            in_vertex,
            id: None,
            label: None,
            properties: Vec::new(),
            initializer: None,
        }
    }

    pub fn with_id(mut self, id: EdgeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<PropertyKey>, value: impl Into<PropertyValue>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn with_initializer(mut self, initializer: impl FnOnce(&Edge) + 'static) -> Self {
        self.initializer = Some(Box::new(initializer));
        self
    }
}

/// Request for [`PropertyGraph::add_hyperedge`](super::PropertyGraph::add_hyperedge)
pub struct NewHyperEdge {
    pub(crate) tail: VertexId,
    pub(crate) heads: Vec<VertexId>,
    pub(crate) id: Option<HyperEdgeId>,
    pub(crate) label: Option<Label>,
    pub(crate) properties: Vec<(PropertyKey, PropertyValue)>,
    pub(crate) initializer: Option<Initializer<HyperEdge>>,
}

impl NewHyperEdge {
    pub fn new(tail: VertexId, heads: impl IntoIterator<Item = VertexId>) -> Self {
        Self {
            tail,
            heads: heads.into_iter().collect(),
            id: None,
            label: None,
            properties: Vec::new(),
            initializer: None,
        }
    }

    pub fn with_id(mut self, id: HyperEdgeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<PropertyKey>, value: impl Into<PropertyValue>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn with_initializer(mut self, initializer: impl FnOnce(&HyperEdge) + 'static) -> Self {
        self.initializer = Some(Box::new(initializer));
        self
    }
}

/// Request for [`PropertyGraph::add_multi_edge`](super::PropertyGraph::add_multi_edge)
pub struct NewMultiEdge {
    pub(crate) selector: EdgeSelector,
    pub(crate) id: Option<MultiEdgeId>,
    pub(crate) label: Option<Label>,
    pub(crate) properties: Vec<(PropertyKey, PropertyValue)>,
    pub(crate) initializer: Option<Initializer<MultiEdge>>,
}

impl NewMultiEdge {
    pub fn new(selector: EdgeSelector) -> Self {
        Self {
            selector,
            id: None,
            label: None,
            properties: Vec::new(),
            initializer: None,
        }
    }

    /// A multiedge grouping every edge `predicate` accepts
    pub fn matching(predicate: impl Fn(&Edge) -> bool + Send + Sync + 'static) -> Self {
        Self::new(Arc::new(predicate))
    }

    /// A multiedge grouping every edge carrying one of `labels`
    pub fn with_edge_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(label_selector(labels))
    }

    pub fn with_id(mut self, id: MultiEdgeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<PropertyKey>, value: impl Into<PropertyValue>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn with_initializer(mut self, initializer: impl FnOnce(&MultiEdge) + 'static) -> Self {
        self.initializer = Some(Box::new(initializer));
        self
    }
}
