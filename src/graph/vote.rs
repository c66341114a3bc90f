//! Vote-then-apply-then-notify protocol for property mutations
//!
//! Every `Set`/`Remove` on an element is first put to a vote. Voters are
//! called synchronously in registration order and the first `Deny` aborts
//! the mutation before anything is applied. Approved mutations are applied
//! and then announced to observers.

use super::id::{ElementRef, Label};
use super::property::{PropertyKey, PropertyValue};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// A voter's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Approve,
    Deny,
}

impl Vote {
    pub fn is_approved(self) -> bool {
        self == Vote::Approve
    }
}

/// Lifecycle of a single mutation call.
///
/// `Requested -> VoteCollected -> Approved -> Applied -> Notified`, or
/// `Requested -> VoteCollected -> Denied -> NoOp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Requested,
    VoteCollected,
    Approved,
    Applied,
    Notified,
    Denied,
    NoOp,
}

/// Final result of a mutation call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Approved, applied and announced
    Applied,
    /// Denied by a voter; nothing changed
    Vetoed,
}

impl MutationOutcome {
    pub fn is_applied(self) -> bool {
        self == MutationOutcome::Applied
    }

    /// The terminal state the mutation reached
    pub fn final_state(self) -> MutationState {
        match self {
            MutationOutcome::Applied => MutationState::Notified,
            MutationOutcome::Vetoed => MutationState::NoOp,
        }
    }
}

/// The element a mutation is aimed at
#[derive(Debug, Clone, Copy)]
pub struct PropertyTarget<'a> {
    pub element: &'a ElementRef,
    pub label: &'a Label,
}

/// A pending mutation, as presented to voters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyChange<'a> {
    Adding {
        key: &'a str,
        value: &'a PropertyValue,
    },
    Changing {
        key: &'a str,
        old: &'a PropertyValue,
        new: &'a PropertyValue,
    },
    Removing {
        key: &'a str,
        old: &'a PropertyValue,
    },
}

impl PropertyChange<'_> {
    pub fn key(&self) -> &str {
        match self {
            Self::Adding { key, .. } | Self::Changing { key, .. } | Self::Removing { key, .. } => key,
        }
    }
}

/// A committed mutation, as presented to observers
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyEvent {
    Added {
        key: PropertyKey,
        value: PropertyValue,
    },
    Changed {
        key: PropertyKey,
        old: PropertyValue,
        new: PropertyValue,
    },
    Removed {
        key: PropertyKey,
        old: PropertyValue,
    },
}

impl PropertyEvent {
    pub fn key(&self) -> &str {
        match self {
            Self::Added { key, .. } | Self::Changed { key, .. } | Self::Removed { key, .. } => key,
        }
    }
}

/// Pre-commit hook that may deny a pending property mutation.
pub trait PropertyVoter: Send + Sync {
    fn vote(&self, target: &PropertyTarget<'_>, change: &PropertyChange<'_>) -> Vote;
}

/// Post-commit hook for applied property mutations.
pub trait PropertyObserver: Send + Sync {
    fn observe(&self, target: &PropertyTarget<'_>, event: &PropertyEvent);
}

struct FnVoter<F>(F);

impl<F> PropertyVoter for FnVoter<F>
where
    F: Fn(&PropertyTarget<'_>, &PropertyChange<'_>) -> Vote + Send + Sync,
{
    fn vote(&self, target: &PropertyTarget<'_>, change: &PropertyChange<'_>) -> Vote {
        (self.0)(target, change)
    }
}

struct FnObserver<F>(F);

impl<F> PropertyObserver for FnObserver<F>
where
    F: Fn(&PropertyTarget<'_>, &PropertyEvent) + Send + Sync,
{
    fn observe(&self, target: &PropertyTarget<'_>, event: &PropertyEvent) {
        (self.0)(target, event)
    }
}

/// Ordered lists of voters and observers.
///
/// Handler lists are cloned out of their lock before any handler runs, so
/// a handler may register further handlers without deadlocking.
#[derive(Default)]
pub struct PropertyHandlers {
    voters: RwLock<Vec<Arc<dyn PropertyVoter>>>,
    observers: RwLock<Vec<Arc<dyn PropertyObserver>>>,
}

impl PropertyHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_voter(&self, voter: Arc<dyn PropertyVoter>) {
        self.voters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(voter);
    }

    pub fn add_voter_fn<F>(&self, f: F)
    where
        F: Fn(&PropertyTarget<'_>, &PropertyChange<'_>) -> Vote + Send + Sync + 'static,
    {
        self.add_voter(Arc::new(FnVoter(f)));
    }

    pub fn add_observer(&self, observer: Arc<dyn PropertyObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn add_observer_fn<F>(&self, f: F)
    where
        F: Fn(&PropertyTarget<'_>, &PropertyEvent) + Send + Sync + 'static,
    {
        self.add_observer(Arc::new(FnObserver(f)));
    }

    pub fn voter_count(&self) -> usize {
        self.voters.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Ask every voter in order; the first denial wins.
    pub fn collect_vote(&self, target: &PropertyTarget<'_>, change: &PropertyChange<'_>) -> Vote {
        let voters = self
            .voters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for (position, voter) in voters.iter().enumerate() {
            if voter.vote(target, change) == Vote::Deny {
                trace!(
                    element = %target.element,
                    key = change.key(),
                    voter = position,
                    "property mutation denied"
                );
                return Vote::Deny;
            }
        }
        Vote::Approve
    }

    pub fn notify(&self, target: &PropertyTarget<'_>, event: &PropertyEvent) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in &observers {
            observer.observe(target, event);
        }
    }
}

impl fmt::Debug for PropertyHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyHandlers")
            .field("voters", &self.voter_count())
            .field("observers", &self.observer_count())
            .finish()
    }
}
