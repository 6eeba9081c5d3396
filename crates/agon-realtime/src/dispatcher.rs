//! Typed event dispatch.
//!
//! The dispatcher fans each emitted [`GameEvent`] out to handlers registered
//! for its kind, then to wildcard handlers. Handlers run synchronously on the
//! emitting thread, in registration order, against a snapshot taken before
//! the first invocation. Because no lock is held while handlers run, a
//! handler may freely subscribe, unsubscribe or emit again.
//!
//! A panicking handler is caught, logged and skipped; it never interrupts
//! delivery to the remaining handlers.

use agon_types::{rooms_for, EventKind, GameEvent, Room};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;

/// Identifies one registered handler, for later removal.
pub type SubscriptionId = u64;

type EventHandler = Arc<dyn Fn(&GameEvent) + Send + Sync>;
type WildcardHandler = Arc<dyn Fn(&GameEvent, &[Room]) + Send + Sync>;

#[derive(Clone)]
struct TypedEntry {
    id: SubscriptionId,
    handler: EventHandler,
    /// Set for `subscribe_once` registrations; flipped on first delivery.
    fired: Option<Arc<AtomicBool>>,
}

#[derive(Clone)]
struct WildcardEntry {
    id: SubscriptionId,
    handler: WildcardHandler,
}

#[derive(Default)]
struct DispatcherInner {
    next_id: SubscriptionId,
    typed: HashMap<EventKind, Vec<TypedEntry>>,
    wildcard: Vec<WildcardEntry>,
    /// Which list each live subscription sits in. `None` marks a wildcard.
    index: HashMap<SubscriptionId, Option<EventKind>>,
}

/// Central pub/sub switchboard for game events.
#[derive(Default)]
pub struct EventDispatcher {
    inner: RwLock<DispatcherInner>,
    events_emitted: AtomicU64,
}

impl EventDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&GameEvent) + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(handler), None)
    }

    /// Register a handler for one event kind that fires at most once.
    ///
    /// The registration is removed after its first delivery, even when the
    /// handler panics.
    pub fn subscribe_once<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&GameEvent) + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(handler), Some(Arc::new(AtomicBool::new(false))))
    }

    /// Register a handler that receives every event along with its fan-out
    /// rooms.
    ///
    /// Wildcard handlers run after the kind-specific handlers of the event.
    pub fn subscribe_any<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&GameEvent, &[Room]) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.wildcard.push(WildcardEntry {
            id,
            handler: Arc::new(handler),
        });
        inner.index.insert(id, None);
        id
    }

    /// Remove a registration. Returns false when the id is unknown or was
    /// already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.write();
        remove_subscription(&mut inner, id)
    }

    /// Deliver an event to all matching handlers.
    ///
    /// Kind handlers run first in registration order, then wildcard handlers
    /// in registration order. The fan-out rooms are computed once per emit.
    pub fn emit(&self, event: GameEvent) {
        let kind = event.kind();
        let rooms = rooms_for(&event);

        let (typed, wildcard) = {
            let inner = self.inner.read();
            (
                inner.typed.get(&kind).cloned().unwrap_or_default(),
                inner.wildcard.clone(),
            )
        };

        let mut spent = Vec::new();
        for entry in &typed {
            if let Some(fired) = &entry.fired {
                if fired.swap(true, Ordering::SeqCst) {
                    continue;
                }
                spent.push(entry.id);
            }
            invoke_isolated(kind, entry.id, || (entry.handler)(&event));
        }
        for entry in &wildcard {
            invoke_isolated(kind, entry.id, || (entry.handler)(&event, &rooms));
        }

        if !spent.is_empty() {
            let mut inner = self.inner.write();
            for id in spent {
                remove_subscription(&mut inner, id);
            }
        }
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of handlers registered for a kind.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.inner
            .read()
            .typed
            .get(&kind)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Number of wildcard handlers.
    pub fn wildcard_count(&self) -> usize {
        self.inner.read().wildcard.len()
    }

    /// Total events emitted since startup.
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    fn register(
        &self,
        kind: EventKind,
        handler: EventHandler,
        fired: Option<Arc<AtomicBool>>,
    ) -> SubscriptionId {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner
            .typed
            .entry(kind)
            .or_default()
            .push(TypedEntry { id, handler, fired });
        inner.index.insert(id, Some(kind));
        id
    }
}

fn remove_subscription(inner: &mut DispatcherInner, id: SubscriptionId) -> bool {
    match inner.index.remove(&id) {
        Some(Some(kind)) => {
            if let Some(entries) = inner.typed.get_mut(&kind) {
                entries.retain(|entry| entry.id != id);
                if entries.is_empty() {
                    inner.typed.remove(&kind);
                }
            }
            true
        }
        Some(None) => {
            inner.wildcard.retain(|entry| entry.id != id);
            true
        }
        None => false,
    }
}

fn invoke_isolated(kind: EventKind, id: SubscriptionId, call: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(call)).is_err() {
        error!(
            event = %kind,
            subscription = id,
            "event handler panicked; continuing fan-out"
        );
    }
}
