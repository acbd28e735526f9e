//! Live, ordered, eventually-consistent local views of remote keyed
//! collections.
//!
//! A [`RecordList`] watches one master ordering reference plus one value
//! stream per child key and reconciles the two arrival streams into a single
//! ordered sequence, re-emitting normalized collection events
//! ([`ListEvent`]) to an [`EventSink`]. [`ListListener`] owns the start/stop
//! lifecycle of a watch session.
//!
//! # Modules
//!
//! - [`event`] - Snapshots, derived events, and the consumer sink
//! - [`source`] - The backend reference abstraction (traits)
//! - [`sequence`] - Ordered key sequence maintenance
//! - [`load`] - Initial-load completion tracking
//! - [`engine`] - The reconciliation engine
//! - [`listener`] - Subscription lifecycle management
//! - [`memory`] - In-process reference implementation
//! - [`error`] - Error types

pub mod engine;
pub mod error;
pub mod event;
pub mod listener;
pub mod load;
pub mod memory;
pub mod sequence;
pub mod source;

pub use engine::RecordList;
pub use error::Error;
pub use event::{EventSink, ListEvent, Snapshot};
pub use listener::ListListener;
pub use load::LoadState;
pub use memory::MemoryCollection;
pub use sequence::KeySequence;
pub use source::{
    ChildRef, CollectionRef, OrderingListener, SubscriptionId, ValueWatcher, WatchId,
};
