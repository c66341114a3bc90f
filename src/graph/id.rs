//! Identity types: per-kind element ids, revisions, labels and the
//! lock-free generators that hand them out

use super::property::PropertyValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// The kind of a graph element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Vertex,
    Edge,
    HyperEdge,
    MultiEdge,
    Graph,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vertex => "vertex",
            Self::Edge => "edge",
            Self::HyperEdge => "hyperedge",
            Self::MultiEdge => "multiedge",
            Self::Graph => "graph",
        };
        f.write_str(name)
    }
}

/// Anything that can identify an element: the four element id types and
/// the graph id.
pub trait Identity:
    Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Element kind this identity belongs to
    fn kind() -> ElementKind;

    /// Value stored under the reserved id key of the element's property bag
    fn to_property(&self) -> PropertyValue;

    /// Kind-tagged reference handed to vote handlers and observers
    fn element_ref(&self) -> ElementRef;
}

/// Largest raw id an element may carry; ids are stored as `Int` under the
/// reserved id key.
pub const MAX_RAW_ID: u64 = i64::MAX as u64;

/// Identities backed by a `u64` sequence, so a generator can produce them.
///
/// Raw value `0` is the default identity and never names an element.
pub trait RawId: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    fn from_raw(raw: u64) -> Self;
    fn as_raw(&self) -> u64;

    fn is_default(&self) -> bool {
        self.as_raw() == 0
    }
}

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl RawId for $name {
            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            fn as_raw(&self) -> u64 {
                self.0
            }
        }

        impl Identity for $name {
            fn kind() -> ElementKind {
                ElementKind::$kind
            }

            fn to_property(&self) -> PropertyValue {
                PropertyValue::Int(self.0 as i64)
            }

            fn element_ref(&self) -> ElementRef {
                ElementRef::$kind(*self)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

element_id!(
    /// Unique identifier for a vertex
    VertexId,
    Vertex
);
element_id!(
    /// Unique identifier for an edge
    EdgeId,
    Edge
);
element_id!(
    /// Unique identifier for a hyperedge
    HyperEdgeId,
    HyperEdge
);
element_id!(
    /// Unique identifier for a multiedge
    MultiEdgeId,
    MultiEdge
);

/// Unique identifier for a graph
///
/// Serializes as a plain string (UUID or a caller-chosen name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(String);

impl GraphId {
    /// Create a new random GraphId (UUID-based)
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a GraphId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GraphId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Identity for GraphId {
    fn kind() -> ElementKind {
        ElementKind::Graph
    }

    fn to_property(&self) -> PropertyValue {
        PropertyValue::String(self.0.clone())
    }

    fn element_ref(&self) -> ElementRef {
        ElementRef::Graph(self.clone())
    }
}

/// Kind-tagged element identity, used wherever any element may be named
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ElementRef {
    Vertex(VertexId),
    Edge(EdgeId),
    HyperEdge(HyperEdgeId),
    MultiEdge(MultiEdgeId),
    Graph(GraphId),
}

impl ElementRef {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Vertex(_) => ElementKind::Vertex,
            Self::Edge(_) => ElementKind::Edge,
            Self::HyperEdge(_) => ElementKind::HyperEdge,
            Self::MultiEdge(_) => ElementKind::MultiEdge,
            Self::Graph(_) => ElementKind::Graph,
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex(id) => write!(f, "vertex {}", id),
            Self::Edge(id) => write!(f, "edge {}", id),
            Self::HyperEdge(id) => write!(f, "hyperedge {}", id),
            Self::MultiEdge(id) => write!(f, "multiedge {}", id),
            Self::Graph(id) => write!(f, "graph {}", id),
        }
    }
}

/// Revision marker stamped on an element when it is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(u64);

impl RevisionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl RawId for RevisionId {
    fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Element label (e.g. "Person", "knows")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for Label {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Label {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Lock-free monotonic id source for one identity space.
///
/// Ids start at the configured value (never below 1). Explicitly supplied
/// ids are reported through [`IdentityGenerator::observe`] so generated ids
/// always land past them.
pub struct IdentityGenerator<T> {
    next: AtomicU64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: RawId> IdentityGenerator<T> {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start.max(1)),
            _marker: PhantomData,
        }
    }

    /// Hand out the next id, or `None` once ids past [`MAX_RAW_ID`] would
    /// be needed
    pub fn next_id(&self) -> Option<T> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |raw| {
                if raw > MAX_RAW_ID {
                    None
                } else {
                    raw.checked_add(1)
                }
            })
            .ok()
            .map(T::from_raw)
    }

    /// Advance past an id that was supplied by a caller
    pub fn observe(&self, id: T) {
        self.next
            .fetch_max(id.as_raw().saturating_add(1), Ordering::Relaxed);
    }

    /// The raw value the next call to `next_id` will return
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl<T: RawId> Default for IdentityGenerator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IdentityGenerator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityGenerator")
            .field("next", &self.next.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn generator_starts_at_one() {
        let generator = IdentityGenerator::<VertexId>::new();
        assert_eq!(generator.next_id(), Some(VertexId::new(1)));
        assert_eq!(generator.next_id(), Some(VertexId::new(2)));
    }

    #[test]
    fn generator_never_hands_out_default_identity() {
        let generator = IdentityGenerator::<EdgeId>::starting_at(0);
        assert!(!generator.next_id().unwrap().is_default());
    }

    #[test]
    fn observe_moves_generator_past_explicit_id() {
        let generator = IdentityGenerator::<VertexId>::new();
        generator.observe(VertexId::new(41));
        assert_eq!(generator.next_id(), Some(VertexId::new(42)));

        // Observing a lower id never moves the generator backwards
        generator.observe(VertexId::new(3));
        assert_eq!(generator.next_id(), Some(VertexId::new(43)));
    }

    #[test]
    fn generator_stops_at_max_raw_id() {
        let generator = IdentityGenerator::<VertexId>::new();
        generator.observe(VertexId::new(MAX_RAW_ID - 1));
        assert_eq!(generator.next_id(), Some(VertexId::new(MAX_RAW_ID)));
        assert_eq!(generator.next_id(), None);
        assert_eq!(generator.next_id(), None);

        // Observing the top of the range does not wrap to the default id
        let generator = IdentityGenerator::<EdgeId>::new();
        generator.observe(EdgeId::new(u64::MAX));
        assert_eq!(generator.next_id(), None);
    }

    #[test]
    fn concurrent_generation_yields_unique_ids() {
        let generator = Arc::new(IdentityGenerator::<HyperEdgeId>::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                thread::spawn(move || {
                    (0..1000)
                        .map(|_| generator.next_id().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 8000);
    }

    #[test]
    fn element_ref_carries_kind() {
        assert_eq!(VertexId::new(7).element_ref().kind(), ElementKind::Vertex);
        assert_eq!(MultiEdgeId::new(7).element_ref().kind(), ElementKind::MultiEdge);
        assert_eq!(
            GraphId::from_string("g").element_ref(),
            ElementRef::Graph(GraphId::from("g"))
        );
    }

    #[test]
    fn graph_id_serializes_as_string() {
        let id = GraphId::from_string("social");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"social\"");
    }

    #[test]
    fn label_compares_with_str() {
        let label = Label::from("knows");
        assert!(label == "knows");
        assert_eq!(label.as_str(), "knows");
    }
}
