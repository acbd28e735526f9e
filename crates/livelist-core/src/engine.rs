//! The reconciliation engine.
//!
//! [`RecordList`] merges two independently-timed event sources (the master
//! ordering stream and one value stream per child) into a single ordered,
//! eventually-consistent local view, re-emitting normalized collection
//! events to an [`EventSink`].
//!
//! ## Staged loading
//!
//! ```text
//! ordering "add"  → pending record (sibling recorded, value watch started)
//! first value     → promotion: insert into sequence, child_added + value
//! later values    → child_changed + value
//! ordering loaded AND no outstanding initial keys → load complete (once)
//! ```
//!
//! The aggregate `value` event is suppressed until load completes; the
//! completion transition itself emits it exactly once.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::Error;
use crate::event::{EventSink, ListEvent, Snapshot};
use crate::load::LoadState;
use crate::sequence::KeySequence;
use crate::source::{ChildRef, CollectionRef, ValueWatcher, WatchId};

/// A key announced by the ordering stream, awaiting its first value.
struct PendingRecord {
    /// Sibling to insert after once the first value arrives.
    after: Option<String>,
    child: Arc<dyn ChildRef>,
    watch: WatchId,
}

/// A key with at least one delivered snapshot, present in the sequence.
struct ActiveRecord {
    snapshot: Snapshot,
    child: Arc<dyn ChildRef>,
    watch: WatchId,
}

#[derive(Default)]
struct ListState {
    sequence: KeySequence,
    pending: HashMap<String, PendingRecord>,
    active: HashMap<String, ActiveRecord>,
    load: LoadState,
}

impl ListState {
    fn is_tracked(&self, key: &str) -> bool {
        self.pending.contains_key(key) || self.active.contains_key(key)
    }

    /// All active snapshots in sequence order.
    fn ordered_snapshots(&self) -> Vec<Snapshot> {
        self.sequence
            .iter()
            .filter_map(|key| self.active.get(key).map(|rec| rec.snapshot.clone()))
            .collect()
    }
}

/// Routes one child's value stream back into the engine.
struct ChildValueWatcher {
    key: String,
    list: Weak<RecordList>,
}

impl ValueWatcher for ChildValueWatcher {
    fn value(&self, snapshot: Snapshot) {
        if let Some(list) = self.list.upgrade() {
            list.value_arrived(&self.key, snapshot);
        }
    }
}

/// The reconciliation engine: ordered key sequence, per-key snapshot cache,
/// and staged-loading state for one watched collection.
///
/// Every mutation entry point runs to completion under one internal lock;
/// derived events are collected there and emitted to the sink after the lock
/// is released, still within the triggering call stack. A consumer may call
/// the read accessors from its sink, but not the mutation methods.
pub struct RecordList {
    source: Arc<dyn CollectionRef>,
    sink: Arc<dyn EventSink>,
    state: Mutex<ListState>,
    self_ref: Weak<RecordList>,
}

impl RecordList {
    /// Create an engine over `source`, delivering derived events to `sink`.
    pub fn new(source: Arc<dyn CollectionRef>, sink: Arc<dyn EventSink>) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            source,
            sink,
            state: Mutex::new(ListState::default()),
            self_ref: self_ref.clone(),
        })
    }

    /// Track a newly announced key.
    ///
    /// Starts the child's value watch and records the key as pending with
    /// `after` as its eventual insertion sibling; the key enters the ordered
    /// sequence only when its first value arrives. Keys announced before the
    /// ordering stream finishes its initial batch gate load completion.
    ///
    /// Errors with [`Error::AlreadyTracked`] if the key is pending or
    /// active: ordering streams never announce a key twice, so this is a
    /// caller bug rather than a runtime condition.
    pub fn add(&self, key: &str, after: Option<&str>) -> Result<(), Error> {
        if self.state.lock().is_tracked(key) {
            return Err(Error::AlreadyTracked(key.to_string()));
        }

        let child = self.source.child(key);
        let watcher = Arc::new(ChildValueWatcher {
            key: key.to_string(),
            list: self.self_ref.clone(),
        });
        let watch = child.watch(watcher);

        let mut state = self.state.lock();
        debug_assert!(!state.is_tracked(key));
        state.load.track(key);
        state.pending.insert(
            key.to_string(),
            PendingRecord {
                after: after.map(str::to_string),
                child,
                watch,
            },
        );
        debug!(key, ?after, "child announced");
        Ok(())
    }

    /// Stop tracking a key.
    ///
    /// For an active record this emits `ChildRemoved` with the last snapshot
    /// followed by the aggregate value event. A still-pending key is dropped
    /// silently apart from load-completion bookkeeping; an untracked key is
    /// ignored, since ordering events can race with local removal.
    pub fn remove(&self, key: &str) {
        let mut events = Vec::new();
        let mut watch = None;
        {
            let mut state = self.state.lock();
            if let Some(rec) = state.pending.remove(key) {
                watch = Some((rec.child, rec.watch));
                debug!(key, "pending child removed before first value");
                if state.load.resolve(key) {
                    debug!(len = state.sequence.len(), "initial load complete");
                    events.push(Self::value_event(&state));
                }
            } else if let Some(rec) = state.active.remove(key) {
                state.sequence.remove(key);
                watch = Some((rec.child, rec.watch));
                debug!(key, "child removed");
                events.push(ListEvent::ChildRemoved {
                    key: key.to_string(),
                    snapshot: rec.snapshot,
                });
                if state.load.is_complete() {
                    events.push(Self::value_event(&state));
                }
            } else {
                debug!(key, "remove for untracked key ignored");
            }
        }

        if let Some((child, id)) = watch {
            child.unwatch(id);
        }
        self.emit_all(events);
    }

    /// Reposition a key immediately after `after` (`None` = first).
    ///
    /// Emits `ChildMoved` with the key's new predecessor; moves do not emit
    /// the aggregate value event. For a still-pending key only the recorded
    /// insertion sibling is updated; an untracked key is ignored.
    pub fn move_record(&self, key: &str, after: Option<&str>) {
        let mut events = Vec::new();
        {
            let mut state = self.state.lock();
            if state.sequence.move_after(key, after) {
                let prev_key = state.sequence.predecessor(key).map(str::to_string);
                debug!(key, ?prev_key, "child moved");
                events.push(ListEvent::ChildMoved {
                    key: key.to_string(),
                    prev_key,
                });
            } else if let Some(rec) = state.pending.get_mut(key) {
                rec.after = after.map(str::to_string);
                trace!(key, ?after, "move recorded for pending child");
            } else {
                debug!(key, "move for untracked key ignored");
            }
        }
        self.emit_all(events);
    }

    /// Note that the ordering stream's initial batch is fully delivered.
    ///
    /// If every key from that batch has already resolved, this completes the
    /// load and emits the aggregate value event once.
    pub fn ordering_loaded(&self) {
        let mut events = Vec::new();
        {
            let mut state = self.state.lock();
            if state.load.mark_ordering_loaded() {
                debug!(len = state.sequence.len(), "initial load complete");
                events.push(Self::value_event(&state));
            }
        }
        self.emit_all(events);
    }

    /// Handle a snapshot delivered by one child's value stream.
    ///
    /// First value for a pending key promotes it: the key is inserted after
    /// its recorded sibling and `ChildAdded` is emitted. Later values for an
    /// active key replace the snapshot and emit `ChildChanged`. A snapshot
    /// for an untracked key is an expected benign race (the key was removed
    /// locally while the update was in flight) and is discarded.
    pub(crate) fn value_arrived(&self, key: &str, snapshot: Snapshot) {
        let mut events = Vec::new();
        {
            let mut state = self.state.lock();
            if let Some(rec) = state.pending.remove(key) {
                let index = state.sequence.insert_after(key, rec.after.as_deref());
                if state.load.resolve(key) {
                    debug!(len = state.sequence.len(), "initial load complete");
                }
                let prev_key = state.sequence.predecessor(key).map(str::to_string);
                state.active.insert(
                    key.to_string(),
                    ActiveRecord {
                        snapshot: snapshot.clone(),
                        child: rec.child,
                        watch: rec.watch,
                    },
                );
                debug!(key, index, "child promoted");
                events.push(ListEvent::ChildAdded {
                    key: key.to_string(),
                    snapshot,
                    prev_key,
                });
                if state.load.is_complete() {
                    events.push(Self::value_event(&state));
                }
            } else if let Some(rec) = state.active.get_mut(key) {
                rec.snapshot = snapshot.clone();
                trace!(key, "child value updated");
                events.push(ListEvent::ChildChanged {
                    key: key.to_string(),
                    snapshot,
                });
                if state.load.is_complete() {
                    events.push(Self::value_event(&state));
                }
            } else {
                debug!(key, "orphaned value update discarded");
            }
        }
        self.emit_all(events);
    }

    /// Tear down the session.
    ///
    /// Performs the equivalent of [`remove`](Self::remove) for every active
    /// record, cancels all pending value watches, then clears the sequence
    /// and resets the load state. Aggregate value events emitted while
    /// draining are superfluous but well-formed; consumers must tolerate
    /// them.
    pub fn reset(&self) {
        let mut events = Vec::new();
        let mut watches = Vec::new();
        {
            let mut state = self.state.lock();
            let keys: Vec<String> = state.sequence.iter().map(str::to_string).collect();
            for key in keys {
                if let Some(rec) = state.active.remove(&key) {
                    state.sequence.remove(&key);
                    watches.push((rec.child, rec.watch));
                    events.push(ListEvent::ChildRemoved {
                        key,
                        snapshot: rec.snapshot,
                    });
                    if state.load.is_complete() {
                        events.push(Self::value_event(&state));
                    }
                }
            }
            for (_, rec) in state.pending.drain() {
                watches.push((rec.child, rec.watch));
            }
            state.sequence.clear();
            state.load.reset();
            debug!("record list reset");
        }

        for (child, id) in watches {
            child.unwatch(id);
        }
        self.emit_all(events);
    }

    /// All active snapshots in sequence order.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.state.lock().ordered_snapshots()
    }

    /// Keys in sequence order.
    pub fn keys(&self) -> Vec<String> {
        self.state.lock().sequence.iter().map(str::to_string).collect()
    }

    /// Number of records in the ordered sequence.
    pub fn len(&self) -> usize {
        self.state.lock().sequence.len()
    }

    /// Whether the ordered sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.state.lock().sequence.is_empty()
    }

    /// Whether the initial load has completed.
    pub fn is_loaded(&self) -> bool {
        self.state.lock().load.is_complete()
    }

    fn value_event(state: &ListState) -> ListEvent {
        ListEvent::Value {
            snapshots: state.ordered_snapshots(),
        }
    }

    fn emit_all(&self, events: Vec<ListEvent>) {
        for event in events {
            trace!(kind = event.kind(), "emit");
            self.sink.emit(event);
        }
    }
}
