//! In-process collection reference.
//!
//! [`MemoryCollection`] implements the backend reference abstraction
//! entirely in memory, with explicit control over event interleaving: the
//! ordering operations ([`insert`](MemoryCollection::insert),
//! [`remove`](MemoryCollection::remove),
//! [`move_child`](MemoryCollection::move_child),
//! [`complete_initial_load`](MemoryCollection::complete_initial_load)) and
//! value delivery ([`set`](MemoryCollection::set)) are independent calls, so
//! any arrival order the engine must tolerate can be produced. It backs the
//! crate's own tests and suits embedding and examples.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::event::Snapshot;
use crate::sequence::KeySequence;
use crate::source::{
    ChildRef, CollectionRef, OrderingListener, SubscriptionId, ValueWatcher, WatchId,
};

#[derive(Default)]
struct ChildState {
    value: Option<serde_json::Value>,
    watchers: HashMap<u64, Arc<dyn ValueWatcher>>,
}

#[derive(Default)]
struct CollectionState {
    order: KeySequence,
    children: HashMap<String, ChildState>,
    listeners: HashMap<u64, Arc<dyn OrderingListener>>,
    loaded: bool,
}

/// In-memory master ordering reference with per-child value streams.
///
/// Callbacks are always invoked with the internal lock released, so
/// listeners and watchers may call back into the collection.
#[derive(Default)]
pub struct MemoryCollection {
    state: Arc<Mutex<CollectionState>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce a child immediately after `after` (`None` = first).
    ///
    /// Announcement carries no value; deliver one with
    /// [`set`](Self::set). No-op if the key is already announced.
    pub fn insert(&self, key: &str, after: Option<&str>) {
        let listeners = {
            let mut state = self.state.lock();
            if state.order.contains(key) {
                return;
            }
            state.order.insert_after(key, after);
            state.children.entry(key.to_string()).or_default();
            Self::collect_listeners(&state)
        };
        trace!(key, ?after, "child announced");
        for listener in listeners {
            listener.child_added(key, after);
        }
    }

    /// Deliver a value snapshot for `key` to its watchers.
    ///
    /// The latest value is retained for inspection but is never replayed to
    /// watchers registered later; each delivery is an explicit event.
    pub fn set(&self, key: &str, payload: serde_json::Value) {
        let watchers: Vec<Arc<dyn ValueWatcher>> = {
            let mut state = self.state.lock();
            let child = state.children.entry(key.to_string()).or_default();
            child.value = Some(payload.clone());
            child.watchers.values().cloned().collect()
        };
        trace!(key, watchers = watchers.len(), "value delivered");
        for watcher in watchers {
            watcher.value(Snapshot::new(key, payload.clone()));
        }
    }

    /// Drop a child and notify listeners. No-op for unknown keys.
    pub fn remove(&self, key: &str) {
        let listeners = {
            let mut state = self.state.lock();
            if !state.order.remove(key) {
                return;
            }
            state.children.remove(key);
            Self::collect_listeners(&state)
        };
        trace!(key, "child removed");
        for listener in listeners {
            listener.child_removed(key);
        }
    }

    /// Reposition a child immediately after `after` and notify listeners.
    /// No-op for unknown keys.
    pub fn move_child(&self, key: &str, after: Option<&str>) {
        let listeners = {
            let mut state = self.state.lock();
            if !state.order.move_after(key, after) {
                return;
            }
            Self::collect_listeners(&state)
        };
        trace!(key, ?after, "child moved");
        for listener in listeners {
            listener.child_moved(key, after);
        }
    }

    /// Fire the one-shot initial-load signal to current listeners. Later
    /// subscribers get the signal replayed at subscription time. No-op if
    /// already fired.
    pub fn complete_initial_load(&self) {
        let listeners = {
            let mut state = self.state.lock();
            if state.loaded {
                return;
            }
            state.loaded = true;
            Self::collect_listeners(&state)
        };
        trace!("initial load complete");
        for listener in listeners {
            listener.loaded();
        }
    }

    /// Latest value delivered for `key`, if any.
    pub fn latest(&self, key: &str) -> Option<serde_json::Value> {
        self.state
            .lock()
            .children
            .get(key)
            .and_then(|child| child.value.clone())
    }

    /// Number of registered ordering listeners.
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    fn collect_listeners(state: &CollectionState) -> Vec<Arc<dyn OrderingListener>> {
        state.listeners.values().cloned().collect()
    }
}

impl CollectionRef for MemoryCollection {
    fn subscribe(&self, listener: Arc<dyn OrderingListener>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        // Replay existing children in order, each with its predecessor, then
        // the load signal if it already fired.
        let (replay, loaded) = {
            let mut state = self.state.lock();
            state.listeners.insert(id, listener.clone());
            let mut replay: Vec<(String, Option<String>)> = Vec::new();
            let mut prev: Option<String> = None;
            for key in state.order.iter() {
                replay.push((key.to_string(), prev.clone()));
                prev = Some(key.to_string());
            }
            (replay, state.loaded)
        };
        trace!(id, children = replay.len(), "ordering listener subscribed");
        for (key, prev) in &replay {
            listener.child_added(key, prev.as_deref());
        }
        if loaded {
            listener.loaded();
        }
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.state.lock().listeners.remove(&id.0);
        trace!(id = id.0, "ordering listener unsubscribed");
    }

    fn child(&self, key: &str) -> Arc<dyn ChildRef> {
        Arc::new(MemoryChild {
            key: key.to_string(),
            state: self.state.clone(),
            next_id: self.next_id.clone(),
        })
    }
}

/// Value-stream reference for one key of a [`MemoryCollection`].
struct MemoryChild {
    key: String,
    state: Arc<Mutex<CollectionState>>,
    next_id: Arc<AtomicU64>,
}

impl ChildRef for MemoryChild {
    fn watch(&self, watcher: Arc<dyn ValueWatcher>) -> WatchId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        state
            .children
            .entry(self.key.clone())
            .or_default()
            .watchers
            .insert(id, watcher);
        WatchId(id)
    }

    fn unwatch(&self, id: WatchId) {
        let mut state = self.state.lock();
        if let Some(child) = state.children.get_mut(&self.key) {
            child.watchers.remove(&id.0);
        }
    }
}
