//! # form_event - Reaction Bus
//!
//! Subscription table for field reactions:
//! - Handlers keyed by (field path, event kind)
//! - Registration-ordered delivery
//! - Per-owner cleanup when a field unmounts
//! - A dispatch guard that breaks reaction cycles
//!
//! The bus stores handler descriptions, not closures that capture the form.
//! The owner looks handlers up and runs them itself, so running a handler can
//! freely mutate the form and dispatch further events.

use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;

/// Lifetime hook fired after a field is mounted
pub const MOUNTED: &str = "mounted";
/// Lifetime hook fired before a field is unmounted
pub const UNMOUNTED: &str = "unmounted";

/// Event category a reaction listens to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The field's value changed
    ValChange,
    /// Named lifecycle hook (`mounted`, `unmounted`, ...)
    Lifetime(String),
    /// Named effect triggered by the host
    Effect(String),
}

impl EventKind {
    /// Category implied by a reaction's `lifetime` / `effect` settings.
    /// `lifetime` wins over `effect`; neither means `ValChange`.
    pub fn select(lifetime: Option<&str>, effect: Option<&str>) -> Self {
        match (lifetime, effect) {
            (Some(name), _) => Self::Lifetime(name.to_string()),
            (None, Some(name)) => Self::Effect(name.to_string()),
            (None, None) => Self::ValChange,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValChange => write!(f, "valChange"),
            Self::Lifetime(name) => write!(f, "lifetime/{}", name),
            Self::Effect(name) => write!(f, "effect/{}", name),
        }
    }
}

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

struct Subscription<H> {
    id: SubscriberId,
    owner: String,
    handler: H,
}

/// Reaction subscriptions for one form
pub struct ReactionBus<H> {
    /// Handlers per (path, kind), in registration order
    handlers: HashMap<(String, EventKind), Vec<Subscription<H>>>,
    /// Next subscriber ID
    next_subscriber_id: u64,
}

impl<H> ReactionBus<H> {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            next_subscriber_id: 1,
        }
    }

    /// Subscribe `handler` to events of `kind` on `path`.
    ///
    /// `owner` is the path of the field that declared the reaction; all of its
    /// subscriptions can be dropped at once with [`unsubscribe_owner`].
    ///
    /// [`unsubscribe_owner`]: ReactionBus::unsubscribe_owner
    pub fn subscribe(
        &mut self,
        path: impl Into<String>,
        kind: EventKind,
        owner: impl Into<String>,
        handler: H,
    ) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber_id);
        self.next_subscriber_id += 1;

        self.handlers
            .entry((path.into(), kind))
            .or_default()
            .push(Subscription {
                id,
                owner: owner.into(),
                handler,
            });

        id
    }

    /// Unsubscribe
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let mut removed = false;
        for subs in self.handlers.values_mut() {
            let before = subs.len();
            subs.retain(|s| s.id != id);
            removed |= subs.len() != before;
        }
        self.handlers.retain(|_, subs| !subs.is_empty());
        removed
    }

    /// Drop every subscription declared by `owner`; returns how many went
    pub fn unsubscribe_owner(&mut self, owner: &str) -> usize {
        let mut removed = 0;
        for subs in self.handlers.values_mut() {
            let before = subs.len();
            subs.retain(|s| s.owner != owner);
            removed += before - subs.len();
        }
        self.handlers.retain(|_, subs| !subs.is_empty());
        removed
    }

    /// Handlers for (path, kind) in registration order
    pub fn handlers(&self, path: &str, kind: &EventKind) -> Vec<(SubscriberId, &H)> {
        self.handlers
            .get(&(path.to_string(), kind.clone()))
            .map(|subs| subs.iter().map(|s| (s.id, &s.handler)).collect())
            .unwrap_or_default()
    }

    /// Check whether anything listens on (path, kind)
    pub fn has_handlers(&self, path: &str, kind: &EventKind) -> bool {
        self.handlers.contains_key(&(path.to_string(), kind.clone()))
    }

    /// Total number of subscriptions
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Remove all subscriptions
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl<H> Default for ReactionBus<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a dispatch was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Reaction cycle: {kind} on '{path}' is already being dispatched")]
    Reentrant { path: String, kind: EventKind },

    #[error("Reaction chain deeper than {0}")]
    DepthExceeded(usize),
}

/// Tracks dispatches in flight so reaction chains terminate.
///
/// Every `enter` that succeeds must be paired with an `exit` for the same key.
#[derive(Debug, Clone)]
pub struct DispatchGuard {
    in_flight: HashSet<(String, EventKind)>,
    depth: usize,
    max_depth: usize,
}

impl DispatchGuard {
    /// Guard allowing chains up to `max_depth` nested dispatches
    pub fn new(max_depth: usize) -> Self {
        Self {
            in_flight: HashSet::new(),
            depth: 0,
            max_depth,
        }
    }

    /// Start dispatching (path, kind)
    pub fn enter(&mut self, path: &str, kind: &EventKind) -> Result<(), DispatchError> {
        let key = (path.to_string(), kind.clone());
        if self.in_flight.contains(&key) {
            let err = DispatchError::Reentrant {
                path: key.0,
                kind: key.1,
            };
            log::warn!("{}", err);
            return Err(err);
        }
        if self.depth >= self.max_depth {
            let err = DispatchError::DepthExceeded(self.max_depth);
            log::warn!("{} while dispatching {} on '{}'", err, kind, path);
            return Err(err);
        }
        self.in_flight.insert(key);
        self.depth += 1;
        Ok(())
    }

    /// Finish dispatching (path, kind)
    pub fn exit(&mut self, path: &str, kind: &EventKind) {
        if self.in_flight.remove(&(path.to_string(), kind.clone())) {
            self.depth = self.depth.saturating_sub(1);
        }
    }

    /// Current chain depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Check if (path, kind) is being dispatched
    pub fn is_active(&self, path: &str, kind: &EventKind) -> bool {
        self.in_flight.contains(&(path.to_string(), kind.clone()))
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{DispatchError, DispatchGuard, EventKind, ReactionBus, SubscriberId};
}
