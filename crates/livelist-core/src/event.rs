//! Derived collection events and the consumer surface.

use serde::{Deserialize, Serialize};

/// A point-in-time content snapshot for one record key.
///
/// The payload is opaque to the engine: it is cached and passed through to
/// the consumer but never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    key: String,
    payload: serde_json::Value,
}

impl Snapshot {
    /// Create a snapshot for `key` carrying `payload`.
    pub fn new(key: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }

    /// The record key this snapshot belongs to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The opaque content payload.
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Consume the snapshot, returning the payload.
    pub fn into_payload(self) -> serde_json::Value {
        self.payload
    }
}

/// Normalized collection events delivered to the consumer.
///
/// The event set is closed; consumers match exhaustively. Events are
/// emitted synchronously within the backend callback that triggered them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ListEvent {
    /// A record delivered its first value and entered the ordered sequence.
    /// `prev_key` is its predecessor in the sequence (`None` = first).
    ChildAdded {
        key: String,
        snapshot: Snapshot,
        prev_key: Option<String>,
    },
    /// An active record's snapshot was replaced in place.
    ChildChanged { key: String, snapshot: Snapshot },
    /// An active record left the collection; carries its last snapshot.
    ChildRemoved { key: String, snapshot: Snapshot },
    /// A record was repositioned; `prev_key` is its new predecessor.
    ChildMoved {
        key: String,
        prev_key: Option<String>,
    },
    /// Full-collection snapshot array in sequence order. Suppressed until
    /// the initial load completes.
    Value { snapshots: Vec<Snapshot> },
}

impl ListEvent {
    /// Short name of the event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ListEvent::ChildAdded { .. } => "child_added",
            ListEvent::ChildChanged { .. } => "child_changed",
            ListEvent::ChildRemoved { .. } => "child_removed",
            ListEvent::ChildMoved { .. } => "child_moved",
            ListEvent::Value { .. } => "value",
        }
    }
}

/// Consumer surface receiving derived events.
///
/// Implementations must not call back into the engine's mutation methods
/// from `emit`; read accessors are safe.
pub trait EventSink: Send + Sync {
    /// Deliver one derived event.
    fn emit(&self, event: ListEvent);
}

impl<F> EventSink for F
where
    F: Fn(ListEvent) + Send + Sync,
{
    fn emit(&self, event: ListEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_accessors() {
        let snap = Snapshot::new("a", serde_json::json!({"n": 1}));
        assert_eq!(snap.key(), "a");
        assert_eq!(snap.payload()["n"], 1);
        assert_eq!(snap.into_payload()["n"], 1);
    }

    #[test]
    fn test_event_kind_names() {
        let snap = Snapshot::new("a", serde_json::Value::Null);
        let added = ListEvent::ChildAdded {
            key: "a".into(),
            snapshot: snap.clone(),
            prev_key: None,
        };
        assert_eq!(added.kind(), "child_added");
        assert_eq!(ListEvent::Value { snapshots: vec![snap] }.kind(), "value");
    }

    #[test]
    fn test_closure_sink() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static SEEN: AtomicUsize = AtomicUsize::new(0);

        let sink = |_event: ListEvent| {
            SEEN.fetch_add(1, Ordering::SeqCst);
        };
        sink.emit(ListEvent::Value { snapshots: vec![] });
        assert_eq!(SEEN.load(Ordering::SeqCst), 1);
    }
}
