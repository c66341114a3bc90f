//! Graph construction with shared configuration and id sources

use super::element::GraphElement;
use super::engine::PropertyGraph;
use super::error::GraphResult;
use super::id::{EdgeId, GraphId, HyperEdgeId, IdentityGenerator, MultiEdgeId, VertexId};
use crate::config::{GraphConfig, IdStart};
use std::sync::Arc;
use tracing::info;

/// One id generator per element kind
#[derive(Debug, Default)]
pub struct IdGenerators {
    pub vertex: IdentityGenerator<VertexId>,
    pub edge: IdentityGenerator<EdgeId>,
    pub hyperedge: IdentityGenerator<HyperEdgeId>,
    pub multi_edge: IdentityGenerator<MultiEdgeId>,
}

impl IdGenerators {
    pub fn from_config(start: &IdStart) -> Self {
        Self {
            vertex: IdentityGenerator::starting_at(start.vertex),
            edge: IdentityGenerator::starting_at(start.edge),
            hyperedge: IdentityGenerator::starting_at(start.hyperedge),
            multi_edge: IdentityGenerator::starting_at(start.multi_edge),
        }
    }
}

/// Builds graphs from one validated configuration.
///
/// By default every graph gets its own generators. Graphs built after
/// [`GraphFactory::with_shared_generators`] draw from one id space, so
/// their element ids never collide.
#[derive(Debug, Clone, Default)]
pub struct GraphFactory {
    config: GraphConfig,
    generators: Option<Arc<IdGenerators>>,
}

impl GraphFactory {
    pub fn new(config: GraphConfig) -> GraphResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            generators: None,
        })
    }

    pub fn with_shared_generators(mut self, generators: Arc<IdGenerators>) -> Self {
        self.generators = Some(generators);
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn create_graph(&self, graph_id: GraphId) -> Arc<PropertyGraph> {
        self.create_graph_with(graph_id, |_| {})
    }

    /// Create a graph and run `initializer` on it before handing it out
    pub fn create_graph_with<F>(&self, graph_id: GraphId, initializer: F) -> Arc<PropertyGraph>
    where
        F: FnOnce(&PropertyGraph),
    {
        let generators = match &self.generators {
            Some(shared) => Arc::clone(shared),
            None => Arc::new(IdGenerators::from_config(&self.config.id_start)),
        };
        let graph = PropertyGraph::assemble(graph_id, self.config.clone(), generators);
        initializer(&graph);
        info!(graph = %graph.id(), "graph ready");
        Arc::new(graph)
    }
}
