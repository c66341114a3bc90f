//! The identity + label + properties bundle shared by every element kind

use super::error::{GraphError, GraphResult};
use super::id::{ElementRef, Identity, Label, RawId, RevisionId};
use super::property::{FromProperty, PropertyBag, PropertyKey, PropertyValue, ReservedKeys};
use super::vote::{
    MutationOutcome, MutationState, PropertyChange, PropertyEvent, PropertyHandlers,
    PropertyObserver, PropertyTarget, PropertyVoter, Vote,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};
use tracing::trace;

/// Reject keys no external caller may mutate
pub(crate) fn check_property_key(reserved: &ReservedKeys, key: &str) -> GraphResult<()> {
    if key.is_empty() {
        return Err(GraphError::InvalidArgument(
            "property key must not be empty".to_string(),
        ));
    }
    if reserved.is_reserved(key) {
        return Err(GraphError::IdentityImmutable(key.to_string()));
    }
    Ok(())
}

/// Identity, revision, label and property bag of one element.
///
/// The identity triple lives inside the bag under the reserved keys and is
/// written once, here. Mutations are serialized per element by `monitor`,
/// which is held across vote, apply and notify. A handler therefore must
/// not mutate the element it is voting on or observing.
pub struct ElementCore<I: Identity> {
    id: I,
    element: ElementRef,
    revision: RevisionId,
    label: Label,
    created_at: DateTime<Utc>,
    reserved: Arc<ReservedKeys>,
    properties: RwLock<PropertyBag>,
    monitor: Mutex<()>,
    handlers: PropertyHandlers,
    shared: Arc<PropertyHandlers>,
}

impl<I: Identity> ElementCore<I> {
    pub(crate) fn new(
        id: I,
        revision: RevisionId,
        label: Label,
        reserved: Arc<ReservedKeys>,
        shared: Arc<PropertyHandlers>,
    ) -> Self {
        let mut bag = PropertyBag::new();
        bag.insert(reserved.id.clone(), id.to_property());
        bag.insert(
            reserved.revision.clone(),
            PropertyValue::Int(revision.as_raw() as i64),
        );
        bag.insert(
            reserved.label.clone(),
            PropertyValue::String(label.as_str().to_string()),
        );

        Self {
            element: id.element_ref(),
            id,
            revision,
            label,
            created_at: Utc::now(),
            reserved,
            properties: RwLock::new(bag),
            monitor: Mutex::new(()),
            handlers: PropertyHandlers::new(),
            shared,
        }
    }

    pub fn id(&self) -> &I {
        &self.id
    }

    pub fn element_ref(&self) -> &ElementRef {
        &self.element
    }

    pub fn revision(&self) -> RevisionId {
        self.revision
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn reserved_keys(&self) -> &ReservedKeys {
        &self.reserved
    }

    /// Handlers registered on this element only
    pub fn handlers(&self) -> &PropertyHandlers {
        &self.handlers
    }

    fn target(&self) -> PropertyTarget<'_> {
        PropertyTarget {
            element: &self.element,
            label: &self.label,
        }
    }

    fn lock_monitor(&self) -> MutexGuard<'_, ()> {
        self.monitor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_bag(&self) -> RwLockReadGuard<'_, PropertyBag> {
        self.properties.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn collect_vote(&self, change: &PropertyChange<'_>) -> Vote {
        let target = self.target();
        match self.handlers.collect_vote(&target, change) {
            Vote::Approve => self.shared.collect_vote(&target, change),
            Vote::Deny => Vote::Deny,
        }
    }

    fn notify(&self, event: &PropertyEvent) {
        let target = self.target();
        self.handlers.notify(&target, event);
        self.shared.notify(&target, event);
    }

    /// Set `key` to `value` through the vote protocol
    pub fn set(&self, key: PropertyKey, value: PropertyValue) -> GraphResult<MutationOutcome> {
        check_property_key(&self.reserved, &key)?;
        let _monitor = self.lock_monitor();
        trace!(element = %self.element, key = %key, state = ?MutationState::Requested);

        let current = self.read_bag().get(&key).cloned();
        let vote = match &current {
            Some(old) => self.collect_vote(&PropertyChange::Changing {
                key: &key,
                old,
                new: &value,
            }),
            None => self.collect_vote(&PropertyChange::Adding {
                key: &key,
                value: &value,
            }),
        };
        trace!(element = %self.element, key = %key, state = ?MutationState::VoteCollected, ?vote);
        if !vote.is_approved() {
            return Ok(MutationOutcome::Vetoed);
        }

        self.properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), value.clone());
        trace!(element = %self.element, key = %key, state = ?MutationState::Applied);

        let event = match current {
            Some(old) => PropertyEvent::Changed { key, old, new: value },
            None => PropertyEvent::Added { key, value },
        };
        self.notify(&event);
        Ok(MutationOutcome::Applied)
    }

    /// Remove `key` through the vote protocol.
    ///
    /// Returns the removed value, or `None` if the key was absent or the
    /// removal was denied.
    pub fn remove(&self, key: &str) -> GraphResult<Option<PropertyValue>> {
        check_property_key(&self.reserved, key)?;
        let _monitor = self.lock_monitor();

        let Some(old) = self.read_bag().get(key).cloned() else {
            return Ok(None);
        };
        let vote = self.collect_vote(&PropertyChange::Removing { key, old: &old });
        if !vote.is_approved() {
            trace!(element = %self.element, key, state = ?MutationState::Denied);
            return Ok(None);
        }

        self.properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        self.notify(&PropertyEvent::Removed {
            key: key.to_string(),
            old: old.clone(),
        });
        Ok(Some(old))
    }

    pub fn get(&self, key: &str) -> Option<PropertyValue> {
        self.read_bag().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read_bag().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read_bag().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_bag().is_empty()
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<_> = self.read_bag().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Non-null entries accepted by `filter`, sorted by key
    pub fn properties_where<F>(&self, filter: F) -> Vec<(PropertyKey, PropertyValue)>
    where
        F: Fn(&str, &PropertyValue) -> bool,
    {
        let mut entries: Vec<_> = self
            .read_bag()
            .iter()
            .filter(|(key, value)| !value.is_null() && filter(key, value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Copy of the whole bag, reserved entries included
    pub fn bag(&self) -> PropertyBag {
        self.read_bag().clone()
    }
}

impl<I: Identity> fmt::Debug for ElementCore<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementCore")
            .field("id", &self.id)
            .field("revision", &self.revision)
            .field("label", &self.label)
            .field("properties", &self.len())
            .finish()
    }
}

/// Property and vote surface shared by vertices, edges, hyperedges,
/// multiedges and the graph itself.
pub trait GraphElement {
    type Id: Identity;

    fn core(&self) -> &ElementCore<Self::Id>;

    fn id(&self) -> Self::Id {
        self.core().id().clone()
    }

    fn element_ref(&self) -> ElementRef {
        self.core().element_ref().clone()
    }

    fn revision(&self) -> RevisionId {
        self.core().revision()
    }

    fn label(&self) -> &Label {
        self.core().label()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.core().created_at()
    }

    /// Set a property, returning the element for chaining.
    ///
    /// A vetoed set is not an error; use [`GraphElement::try_set_property`]
    /// to learn whether it was applied.
    fn set_property(
        &self,
        key: impl Into<PropertyKey>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<&Self> {
        self.core().set(key.into(), value.into())?;
        Ok(self)
    }

    fn try_set_property(
        &self,
        key: impl Into<PropertyKey>,
        value: impl Into<PropertyValue>,
    ) -> GraphResult<MutationOutcome> {
        self.core().set(key.into(), value.into())
    }

    fn remove_property(&self, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.core().remove(key)
    }

    fn property(&self, key: &str) -> Option<PropertyValue> {
        self.core().get(key)
    }

    /// Typed read; `None` on a missing key or a type mismatch
    fn try_get_property<T: FromProperty>(&self, key: &str) -> Option<T> {
        self.core()
            .get(key)
            .and_then(|value| T::from_property(&value))
    }

    /// Every non-null entry, sorted by key
    fn properties(&self) -> Vec<(PropertyKey, PropertyValue)> {
        self.core().properties_where(|_, _| true)
    }

    fn properties_where<F>(&self, filter: F) -> Vec<(PropertyKey, PropertyValue)>
    where
        F: Fn(&str, &PropertyValue) -> bool,
    {
        self.core().properties_where(filter)
    }

    fn keys(&self) -> Vec<PropertyKey> {
        self.core().keys()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.core().contains_key(key)
    }

    fn property_count(&self) -> usize {
        self.core().len()
    }

    fn get_member(&self, name: &str) -> Option<PropertyValue> {
        self.core().get(name)
    }

    fn set_member(&self, name: &str, value: impl Into<PropertyValue>) -> GraphResult<MutationOutcome> {
        self.core().set(name.to_string(), value.into())
    }

    fn delete_member(&self, name: &str) -> GraphResult<Option<PropertyValue>> {
        self.core().remove(name)
    }

    /// Register a voter on this element only
    fn on_vote<F>(&self, f: F)
    where
        F: Fn(&PropertyTarget<'_>, &PropertyChange<'_>) -> Vote + Send + Sync + 'static,
    {
        self.core().handlers().add_voter_fn(f);
    }

    fn add_voter(&self, voter: Arc<dyn PropertyVoter>) {
        self.core().handlers().add_voter(voter);
    }

    /// Register a post-commit observer on this element only
    fn on_property_event<F>(&self, f: F)
    where
        F: Fn(&PropertyTarget<'_>, &PropertyEvent) + Send + Sync + 'static,
    {
        self.core().handlers().add_observer_fn(f);
    }

    fn add_property_observer(&self, observer: Arc<dyn PropertyObserver>) {
        self.core().handlers().add_observer(observer);
    }
}

/// Equality, hashing and ordering by id alone
macro_rules! element_identity {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $crate::graph::GraphElement::core(self).id()
                    == $crate::graph::GraphElement::core(other).id()
            }
        }

        impl Eq for $ty {}

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                $crate::graph::GraphElement::core(self).id().hash(state)
            }
        }

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                $crate::graph::GraphElement::core(self)
                    .id()
                    .cmp($crate::graph::GraphElement::core(other).id())
            }
        }
    };
}

pub(crate) use element_identity;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::id::VertexId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Probe {
        core: ElementCore<VertexId>,
    }

    impl GraphElement for Probe {
        type Id = VertexId;

        fn core(&self) -> &ElementCore<VertexId> {
            &self.core
        }
    }

    fn probe_with(shared: Arc<PropertyHandlers>) -> Probe {
        Probe {
            core: ElementCore::new(
                VertexId::new(1),
                RevisionId::new(1),
                Label::from("Person"),
                Arc::new(ReservedKeys::default()),
                shared,
            ),
        }
    }

    fn probe() -> Probe {
        probe_with(Arc::new(PropertyHandlers::new()))
    }

    #[test]
    fn identity_lives_in_the_bag() {
        let p = probe();
        assert_eq!(p.property("Id"), Some(PropertyValue::Int(1)));
        assert_eq!(p.property("RevId"), Some(PropertyValue::Int(1)));
        assert_eq!(p.try_get_property::<String>("Label"), Some("Person".to_string()));
        assert_eq!(p.keys(), vec!["Id", "Label", "RevId"]);
    }

    #[test]
    fn reserved_keys_reject_set_and_remove() {
        let p = probe();
        for key in ["Id", "RevId", "Label"] {
            assert!(matches!(
                p.set_property(key, 99i64),
                Err(GraphError::IdentityImmutable(k)) if k == key
            ));
            assert!(matches!(
                p.remove_property(key),
                Err(GraphError::IdentityImmutable(_))
            ));
        }
        assert_eq!(p.id(), VertexId::new(1));
        assert_eq!(p.property("Id"), Some(PropertyValue::Int(1)));
        assert_eq!(p.property("RevId"), Some(PropertyValue::Int(1)));
    }

    #[test]
    fn empty_key_is_invalid() {
        let p = probe();
        assert!(matches!(
            p.set_property("", 1i64),
            Err(GraphError::InvalidArgument(_))
        ));
    }

    #[test]
    fn set_is_fluent_and_adds_then_changes() {
        let p = probe();
        p.set_property("name", "alice")
            .unwrap()
            .set_property("age", 30i64)
            .unwrap();
        assert_eq!(p.try_get_property::<i64>("age"), Some(30));

        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = Arc::clone(&events);
        p.on_property_event(move |_, event| log.lock().unwrap().push(event.clone()));

        p.set_property("age", 31i64).unwrap();
        assert_eq!(
            *events.lock().unwrap(),
            vec![PropertyEvent::Changed {
                key: "age".into(),
                old: PropertyValue::Int(30),
                new: PropertyValue::Int(31),
            }]
        );
    }

    #[test]
    fn denied_add_leaves_keys_unchanged() {
        let p = probe();
        p.on_vote(|_, change| match change {
            PropertyChange::Adding { key: "secret", .. } => Vote::Deny,
            _ => Vote::Approve,
        });
        let before = p.keys();

        for value in [PropertyValue::Int(1), "x".into(), PropertyValue::Null] {
            assert_eq!(p.try_set_property("secret", value).unwrap(), MutationOutcome::Vetoed);
        }
        assert_eq!(p.keys(), before);
        assert_eq!(p.try_get_property::<PropertyValue>("secret"), None);
    }

    #[test]
    fn denied_change_keeps_old_value() {
        let p = probe();
        p.set_property("age", 30i64).unwrap();
        p.on_vote(|_, change| match change {
            PropertyChange::Changing { .. } => Vote::Deny,
            _ => Vote::Approve,
        });
        assert_eq!(p.try_set_property("age", 99i64).unwrap(), MutationOutcome::Vetoed);
        assert_eq!(p.try_get_property::<i64>("age"), Some(30));
    }

    #[test]
    fn remove_returns_value_or_none() {
        let p = probe();
        p.set_property("nick", "al").unwrap();
        assert_eq!(p.remove_property("nick").unwrap(), Some("al".into()));
        assert_eq!(p.remove_property("nick").unwrap(), None);
        assert!(!p.contains_key("nick"));
    }

    #[test]
    fn denied_remove_returns_none_and_keeps_value() {
        let p = probe();
        p.set_property("nick", "al").unwrap();
        p.on_vote(|_, change| match change {
            PropertyChange::Removing { .. } => Vote::Deny,
            _ => Vote::Approve,
        });
        assert_eq!(p.remove_property("nick").unwrap(), None);
        assert_eq!(p.property("nick"), Some("al".into()));
    }

    #[test]
    fn type_mismatch_is_not_an_error() {
        let p = probe();
        p.set_property("age", "thirty").unwrap();
        assert_eq!(p.try_get_property::<i64>("age"), None);
        assert_eq!(p.try_get_property::<f64>("missing"), None);
    }

    #[test]
    fn properties_skip_nulls_and_apply_filter() {
        let p = probe();
        p.set_property("name", "alice").unwrap();
        p.set_property("nickname", PropertyValue::Null).unwrap();
        p.set_property("age", 30i64).unwrap();

        let all = p.properties();
        assert!(all.iter().all(|(_, v)| !v.is_null()));
        assert!(all.iter().any(|(k, _)| k == "name"));
        assert!(!all.iter().any(|(k, _)| k == "nickname"));
        assert!(p.contains_key("nickname"));

        let ints = p.properties_where(|_, v| v.as_int().is_some());
        let keys: Vec<_> = ints.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Id", "RevId", "age"]);

        // Restartable: a second pass sees the same entries
        assert_eq!(p.properties(), all);
    }

    #[test]
    fn element_voters_run_before_shared_voters() {
        let shared = Arc::new(PropertyHandlers::new());
        let shared_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&shared_calls);
        shared.add_voter_fn(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Vote::Approve
        });

        let p = probe_with(shared);
        p.set_property("a", 1i64).unwrap();
        assert_eq!(shared_calls.load(Ordering::SeqCst), 1);

        p.on_vote(|_, _| Vote::Deny);
        p.set_property("b", 1i64).unwrap();
        assert_eq!(shared_calls.load(Ordering::SeqCst), 1);
        assert!(!p.contains_key("b"));
    }

    #[test]
    fn member_accessors_follow_property_rules() {
        let p = probe();
        assert!(p.set_member("color", "red").unwrap().is_applied());
        assert_eq!(p.get_member("color"), Some("red".into()));
        assert_eq!(p.delete_member("color").unwrap(), Some("red".into()));
        assert!(matches!(
            p.set_member("Id", 5i64),
            Err(GraphError::IdentityImmutable(_))
        ));
    }
}
