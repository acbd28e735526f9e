//! End-to-end scenarios driving the full stack (lifecycle listener,
//! reconciliation engine, in-memory backend) through the event
//! interleavings the engine must tolerate.

use std::sync::{Arc, Mutex};

use livelist::{EventSink, ListEvent, ListListener, MemoryCollection, Snapshot};
use serde_json::json;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<ListEvent>>,
}

impl Recorder {
    fn take(&self) -> Vec<ListEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn kinds(&self) -> Vec<&'static str> {
        self.take().iter().map(ListEvent::kind).collect()
    }
}

impl EventSink for Recorder {
    fn emit(&self, event: ListEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn setup() -> (Arc<MemoryCollection>, Arc<Recorder>, ListListener) {
    let collection = Arc::new(MemoryCollection::new());
    let recorder = Arc::new(Recorder::default());
    let listener = ListListener::new(collection.clone(), recorder.clone());
    (collection, recorder, listener)
}

#[test]
fn staged_loading_with_out_of_order_values() {
    let (collection, recorder, listener) = setup();

    // Children announced before the session starts; the subscription replay
    // delivers them in collection order: a, c, b.
    collection.insert("a", None);
    collection.insert("b", Some("a"));
    collection.insert("c", Some("a"));
    listener.start();

    // Values arrive out of announcement order, before the load signal.
    collection.set("a", json!(1));
    collection.set("c", json!(3));
    collection.set("b", json!(2));
    assert!(!listener.list().is_loaded());

    let events = recorder.take();
    let kinds: Vec<_> = events.iter().map(ListEvent::kind).collect();
    assert_eq!(kinds, vec!["child_added", "child_added", "child_added"]);

    collection.complete_initial_load();
    assert!(listener.list().is_loaded());
    assert_eq!(listener.list().keys(), vec!["a", "c", "b"]);
    assert_eq!(
        recorder.take(),
        vec![ListEvent::Value {
            snapshots: vec![
                Snapshot::new("a", json!(1)),
                Snapshot::new("c", json!(3)),
                Snapshot::new("b", json!(2)),
            ],
        }]
    );
}

#[test]
fn load_signal_before_last_value() {
    let (collection, recorder, listener) = setup();
    listener.start();

    collection.insert("a", None);
    collection.complete_initial_load();
    assert!(!listener.list().is_loaded());
    assert!(recorder.take().is_empty());

    collection.set("a", json!(1));
    assert!(listener.list().is_loaded());
    assert_eq!(recorder.kinds(), vec!["child_added", "value"]);
}

#[test]
fn pending_key_removed_before_first_value() {
    let (collection, recorder, listener) = setup();
    listener.start();

    collection.insert("a", None);
    collection.insert("b", Some("a"));
    collection.set("a", json!(1));
    collection.remove("b");
    collection.complete_initial_load();

    assert_eq!(listener.list().keys(), vec!["a"]);
    let events = recorder.take();
    for event in &events {
        match event {
            ListEvent::ChildAdded { key, .. } => assert_eq!(key, "a"),
            ListEvent::Value { snapshots } => {
                assert_eq!(snapshots, &[Snapshot::new("a", json!(1))]);
            }
            other => panic!("unexpected event for removed pending key: {other:?}"),
        }
    }
}

#[test]
fn stray_update_for_unknown_key() {
    let (collection, recorder, listener) = setup();
    listener.start();

    collection.insert("a", None);
    collection.set("a", json!(1));
    collection.complete_initial_load();
    recorder.take();

    collection.set("z", json!(99));
    assert!(recorder.take().is_empty());
    assert_eq!(listener.list().keys(), vec!["a"]);
}

#[test]
fn move_emits_child_moved_without_value() {
    let (collection, recorder, listener) = setup();
    listener.start();

    for (key, after, payload) in [
        ("a", None, json!(1)),
        ("b", Some("a"), json!(2)),
        ("c", Some("b"), json!(3)),
    ] {
        collection.insert(key, after);
        collection.set(key, payload);
    }
    collection.complete_initial_load();
    recorder.take();

    collection.move_child("c", Some("a"));
    assert_eq!(listener.list().keys(), vec!["a", "c", "b"]);
    assert_eq!(
        recorder.take(),
        vec![ListEvent::ChildMoved {
            key: "c".into(),
            prev_key: Some("a".into()),
        }]
    );
}

#[test]
fn stop_tears_down_and_resets() {
    let (collection, recorder, listener) = setup();
    listener.start();

    collection.insert("a", None);
    collection.insert("b", Some("a"));
    collection.set("a", json!(1));
    collection.set("b", json!(2));
    collection.complete_initial_load();
    recorder.take();

    listener.stop();
    assert_eq!(
        recorder.kinds(),
        vec!["child_removed", "value", "child_removed", "value"]
    );
    assert!(!listener.is_running());
    assert!(listener.list().is_empty());
    assert!(!listener.list().is_loaded());

    // Backend updates after stop reach nothing.
    collection.set("a", json!(10));
    assert!(recorder.take().is_empty());
}

#[test]
fn restart_runs_a_fresh_session() {
    let (collection, recorder, listener) = setup();
    listener.start();

    collection.insert("a", None);
    collection.set("a", json!(1));
    collection.complete_initial_load();
    listener.stop();
    recorder.take();

    // New session: replayed child, fresh staged load, its own one-time
    // value transition.
    listener.start();
    assert!(!listener.list().is_loaded());
    collection.set("a", json!(1));
    assert!(listener.list().is_loaded());
    assert_eq!(recorder.kinds(), vec!["child_added", "value"]);
}

#[test]
fn post_load_additions_flow_through() {
    let (collection, recorder, listener) = setup();
    listener.start();
    collection.complete_initial_load();
    assert!(listener.list().is_loaded());
    recorder.take();

    collection.insert("a", None);
    assert!(recorder.take().is_empty());
    collection.set("a", json!(1));
    assert_eq!(recorder.kinds(), vec!["child_added", "value"]);

    collection.insert("b", Some("a"));
    collection.set("b", json!(2));
    assert_eq!(listener.list().keys(), vec!["a", "b"]);
    assert_eq!(
        listener.list().snapshots(),
        vec![Snapshot::new("a", json!(1)), Snapshot::new("b", json!(2))]
    );
}
