//! LiveList - Live, ordered local views of remote keyed collections.
//!
//! This crate is the public facade over [`livelist_core`]: a reconciliation
//! engine that merges a master key-ordering stream with one value stream per
//! child into a single ordered, eventually-consistent record list, and
//! re-emits normalized collection events to a consumer.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use livelist::{ListEvent, ListListener, MemoryCollection};
//!
//! // An in-process backend; production code adapts its own streaming
//! // client to the `CollectionRef` traits instead.
//! let collection = Arc::new(MemoryCollection::new());
//!
//! let sink = Arc::new(|event: ListEvent| {
//!     println!("{}", event.kind());
//! });
//! let listener = ListListener::new(collection.clone(), sink);
//! listener.start();
//!
//! // Ordering and value arrivals are independent events.
//! collection.insert("alice", None);
//! collection.set("alice", serde_json::json!({ "score": 10 }));
//! collection.complete_initial_load();
//!
//! assert!(listener.list().is_loaded());
//! assert_eq!(listener.list().keys(), vec!["alice"]);
//! listener.stop();
//! ```

pub use livelist_core::{engine, error, event, listener, load, memory, sequence, source};

pub use livelist_core::{
    ChildRef, CollectionRef, Error, EventSink, KeySequence, ListEvent, ListListener, LoadState,
    MemoryCollection, OrderingListener, RecordList, Snapshot, SubscriptionId, ValueWatcher,
    WatchId,
};
