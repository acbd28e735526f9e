//! Subscription lifecycle management.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::engine::RecordList;
use crate::event::EventSink;
use crate::source::{CollectionRef, OrderingListener, SubscriptionId};

/// Routes raw ordering events from the master reference into the engine.
struct OrderingAdapter {
    list: Weak<RecordList>,
}

impl OrderingListener for OrderingAdapter {
    fn child_added(&self, key: &str, after: Option<&str>) {
        let Some(list) = self.list.upgrade() else {
            return;
        };
        if let Err(err) = list.add(key, after) {
            // The ordering stream announced a tracked key: a caller bug,
            // not a runtime condition to recover from.
            panic!("ordering stream contract violation: {err}");
        }
    }

    fn child_removed(&self, key: &str) {
        if let Some(list) = self.list.upgrade() {
            list.remove(key);
        }
    }

    fn child_moved(&self, key: &str, after: Option<&str>) {
        if let Some(list) = self.list.upgrade() {
            list.move_record(key, after);
        }
    }

    fn loaded(&self) {
        if let Some(list) = self.list.upgrade() {
            list.ordering_loaded();
        }
    }
}

/// Owns start/stop of one watch session against a master ordering reference.
///
/// [`start`](Self::start) and [`stop`](Self::stop) are both idempotent.
/// Stopping unsubscribes the ordering listener and fully resets the engine;
/// a later `start` begins a fresh session with its own initial load.
pub struct ListListener {
    source: Arc<dyn CollectionRef>,
    list: Arc<RecordList>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl ListListener {
    /// Create a listener over `source`, delivering derived events to `sink`.
    /// The session is not started until [`start`](Self::start) is called.
    pub fn new(source: Arc<dyn CollectionRef>, sink: Arc<dyn EventSink>) -> Self {
        let list = RecordList::new(source.clone(), sink);
        Self {
            source,
            list,
            subscription: Mutex::new(None),
        }
    }

    /// Begin the watch session. No-op if already running.
    pub fn start(&self) {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return;
        }
        let adapter = Arc::new(OrderingAdapter {
            list: Arc::downgrade(&self.list),
        });
        let id = self.source.subscribe(adapter);
        *subscription = Some(id);
        debug!(id = id.0, "list listener started");
    }

    /// End the watch session and reset the engine. No-op if not running.
    pub fn stop(&self) {
        let id = self.subscription.lock().take();
        let Some(id) = id else {
            return;
        };
        self.source.unsubscribe(id);
        self.list.reset();
        debug!(id = id.0, "list listener stopped");
    }

    /// Whether a watch session is active.
    pub fn is_running(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// The underlying record list.
    pub fn list(&self) -> &Arc<RecordList> {
        &self.list
    }
}

impl Drop for ListListener {
    fn drop(&mut self) {
        self.stop();
    }
}
