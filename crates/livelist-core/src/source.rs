//! Backend reference abstraction.
//!
//! The engine never talks to a concrete backend; it is wired against these
//! traits. [`MemoryCollection`](crate::memory::MemoryCollection) is the
//! in-process implementation; production backends adapt their own streaming
//! client to the same surface.

use std::sync::Arc;

use crate::event::Snapshot;

/// Identifier for one ordering subscription on a [`CollectionRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Identifier for one value watch on a [`ChildRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Listener for ordering events from a master collection reference.
///
/// Implementations of [`CollectionRef`] must deliver a `child_added` for
/// every child existing at subscription time before firing `loaded`; the
/// load-completion algorithm depends on that ordering.
pub trait OrderingListener: Send + Sync {
    /// A key exists; it belongs immediately after `after` (`None` = first).
    fn child_added(&self, key: &str, after: Option<&str>);

    /// A key left the collection.
    fn child_removed(&self, key: &str);

    /// A key was repositioned immediately after `after` (`None` = first).
    fn child_moved(&self, key: &str, after: Option<&str>);

    /// The initial batch of `child_added` events is complete. Fires at most
    /// once per subscription.
    fn loaded(&self);
}

/// Watcher for one child's value stream.
pub trait ValueWatcher: Send + Sync {
    /// A new content snapshot arrived for the watched key.
    fn value(&self, snapshot: Snapshot);
}

/// Master ordering reference for one remote collection.
pub trait CollectionRef: Send + Sync {
    /// Register a listener for ordering events. Existing children are
    /// replayed as `child_added` calls before this subscription sees any
    /// live event, and `loaded` fires once the initial batch is complete.
    fn subscribe(&self, listener: Arc<dyn OrderingListener>) -> SubscriptionId;

    /// Drop a previously registered listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// A reference scoped to one child key.
    fn child(&self, key: &str) -> Arc<dyn ChildRef>;
}

/// Per-key value stream reference.
pub trait ChildRef: Send + Sync {
    /// Start streaming snapshots to `watcher`.
    ///
    /// Implementations must not invoke the watcher from within this call;
    /// every delivery is a separate event.
    fn watch(&self, watcher: Arc<dyn ValueWatcher>) -> WatchId;

    /// Stop a watch. Unknown ids are ignored.
    fn unwatch(&self, id: WatchId);
}
