//! MultiEdges: virtual relations aggregating edges that satisfy a selector
//!
//! A multiedge never owns the edges it groups. It keeps weak handles keyed
//! by edge id; the graph prunes them when an edge is removed.

use super::edge::Edge;
use super::element::{element_identity, ElementCore, GraphElement};
use super::id::{EdgeId, MultiEdgeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, Weak};

/// Predicate deciding whether an edge belongs to a multiedge
pub type EdgeSelector = Arc<dyn Fn(&Edge) -> bool + Send + Sync>;

/// Build a selector accepting edges whose label is one of `labels`
pub fn label_selector<I, S>(labels: I) -> EdgeSelector
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
    Arc::new(move |edge: &Edge| labels.iter().any(|l| edge.label() == l.as_str()))
}

pub struct MultiEdge {
    core: ElementCore<MultiEdgeId>,
    selector: EdgeSelector,
    edges: RwLock<BTreeMap<EdgeId, Weak<Edge>>>,
}

impl MultiEdge {
    pub(crate) fn new(core: ElementCore<MultiEdgeId>, selector: EdgeSelector) -> Self {
        Self {
            core,
            selector,
            edges: RwLock::new(BTreeMap::new()),
        }
    }

    fn read_edges(&self) -> RwLockReadGuard<'_, BTreeMap<EdgeId, Weak<Edge>>> {
        self.edges.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluate the selector without touching the aggregation
    pub fn check_if_matches(&self, edge: &Edge) -> bool {
        (self.selector)(edge)
    }

    /// Aggregate `edge` if the selector accepts it.
    ///
    /// Returns whether the edge was accepted; an accepted edge that is
    /// already aggregated is not duplicated. An edge its graph has removed
    /// is never accepted.
    pub fn add_if_matches(&self, edge: &Arc<Edge>) -> bool {
        if edge.is_removed() || !self.check_if_matches(edge) {
            return false;
        }
        self.edges
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(edge.id(), Arc::downgrade(edge));
        // Removal marks the edge before pruning multiedges, so a removal
        // racing this insert is either seen here or prunes it afterwards
        if edge.is_removed() {
            self.forget(edge.id());
            return false;
        }
        true
    }

    /// Drop `edge` from the aggregation
    pub(crate) fn forget(&self, edge: EdgeId) -> bool {
        self.edges
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&edge)
            .is_some()
    }

    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        self.read_edges().contains_key(&edge)
    }

    /// Ids of every aggregated edge, ascending
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.read_edges().keys().copied().collect()
    }

    /// Every aggregated edge still alive, ordered by id
    pub fn edges(&self) -> Vec<Arc<Edge>> {
        self.edges_where(|_| true)
    }

    pub fn edges_where<F>(&self, filter: F) -> Vec<Arc<Edge>>
    where
        F: Fn(&Edge) -> bool,
    {
        self.read_edges()
            .values()
            .filter_map(Weak::upgrade)
            .filter(|edge| filter(edge))
            .collect()
    }

    /// Aggregated edges carrying any of `labels`
    pub fn edges_by_label(&self, labels: &[&str]) -> Vec<Arc<Edge>> {
        self.edges_where(|edge| labels.iter().any(|l| edge.label() == l))
    }

    /// Maintained count of aggregated edges
    pub fn number_of_edges(&self) -> usize {
        self.read_edges().len()
    }

    pub fn number_of_edges_where<F>(&self, filter: F) -> usize
    where
        F: Fn(&Edge) -> bool,
    {
        self.edges_where(filter).len()
    }
}

impl GraphElement for MultiEdge {
    type Id = MultiEdgeId;

    fn core(&self) -> &ElementCore<MultiEdgeId> {
        &self.core
    }
}

element_identity!(MultiEdge);

impl fmt::Debug for MultiEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiEdge")
            .field("id", self.core.id())
            .field("label", self.core.label())
            .field("edges", &self.number_of_edges())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::id::{Label, RevisionId, VertexId};
    use crate::graph::property::ReservedKeys;
    use crate::graph::vote::PropertyHandlers;

    fn make_core<I: crate::graph::id::Identity>(id: I, label: &str) -> ElementCore<I> {
        ElementCore::new(
            id,
            RevisionId::new(1),
            Label::from(label),
            Arc::new(ReservedKeys::default()),
            Arc::new(PropertyHandlers::new()),
        )
    }

    fn edge(id: u64, label: &str) -> Arc<Edge> {
        Arc::new(Edge::new(
            make_core(EdgeId::new(id), label),
            VertexId::new(1),
            VertexId::new(2),
        ))
    }

    fn friends() -> MultiEdge {
        MultiEdge::new(make_core(MultiEdgeId::new(1), "friends"), label_selector(["friendOf"]))
    }

    #[test]
    fn check_if_matches_has_no_side_effect() {
        let m = friends();
        assert!(m.check_if_matches(&edge(1, "friendOf")));
        assert_eq!(m.number_of_edges(), 0);
    }

    #[test]
    fn non_matching_edge_is_rejected() {
        let m = friends();
        let other = edge(1, "worksWith");
        assert!(!m.add_if_matches(&other));
        assert!(m.edges().is_empty());
        assert_eq!(m.number_of_edges(), 0);
    }

    #[test]
    fn matching_edge_is_aggregated_once() {
        let m = friends();
        let friend = edge(2, "friendOf");
        assert!(m.add_if_matches(&friend));
        assert!(m.add_if_matches(&friend));
        assert_eq!(m.number_of_edges(), 1);

        let by_label = m.edges_by_label(&["friendOf"]);
        assert_eq!(by_label.len(), 1);
        assert_eq!(by_label[0].id(), EdgeId::new(2));
        assert!(m.edges_by_label(&["worksWith"]).is_empty());
    }

    #[test]
    fn edge_marked_removed_is_rejected() {
        let m = friends();
        let friend = edge(4, "friendOf");
        friend.mark_removed();
        assert!(m.check_if_matches(&friend));
        assert!(!m.add_if_matches(&friend));
        assert!(!m.contains_edge(EdgeId::new(4)));
    }

    #[test]
    fn aggregation_does_not_keep_edges_alive() {
        let m = friends();
        let friend = edge(3, "friendOf");
        m.add_if_matches(&friend);
        drop(friend);
        assert!(m.edges().is_empty());
        assert!(m.forget(EdgeId::new(3)));
        assert_eq!(m.number_of_edges(), 0);
    }

    #[test]
    fn filtered_count_applies_predicate() {
        let m = MultiEdge::new(make_core(MultiEdgeId::new(2), "any"), Arc::new(|_: &Edge| true));
        let heavy = edge(1, "a");
        heavy.set_property("weight", 5i64).unwrap();
        let light = edge(2, "b");
        light.set_property("weight", 1i64).unwrap();
        m.add_if_matches(&heavy);
        m.add_if_matches(&light);

        assert_eq!(m.number_of_edges(), 2);
        assert_eq!(
            m.number_of_edges_where(|e| e.try_get_property::<i64>("weight") > Some(2)),
            1
        );
        assert_eq!(m.edge_ids(), vec![EdgeId::new(1), EdgeId::new(2)]);
    }
}
