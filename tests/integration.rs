//! Integration tests for the capture store.

use capture_store::{Change, RequestId, RequestRecord, Storage, StoreConfig, Token};
use parking_lot::Mutex;
use std::sync::Arc;

fn record(id: u64, url: &str) -> RequestRecord {
    let mut r = RequestRecord::new("GET", url);
    r.id = RequestId(id);
    r
}

type Log = Arc<Mutex<Vec<Change<RequestRecord>>>>;

fn observe_log(store: &Arc<Storage<RequestRecord>>) -> (Token<RequestRecord>, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let token = store.observe(move |change| sink.lock().push(change.clone()));
    (token, log)
}

// --- Capture Lifecycle ---

#[test]
fn test_request_lifecycle_updates_in_place() {
    let store = Storage::new();
    let (_token, log) = observe_log(&store);

    // Request goes out: no status yet.
    let mut req = RequestRecord::new("POST", "https://api.example.com/login");
    store.save(req.clone());
    assert_eq!(store.len(), 1);
    assert!(store.entries()[0].status.is_none());

    // Response lands: same id, stored copy replaced where it sits.
    req.status = Some(200);
    req.duration_ms = Some(41.7);
    req.response_headers
        .insert("content-type".into(), "application/json".into());
    store.save(req.clone());

    assert_eq!(store.len(), 1);
    assert_eq!(store.entries()[0].status, Some(200));

    let log = log.lock();
    assert_eq!(log.len(), 3);
    assert_eq!(log[2], Change::UpdatedAt { entry: req, index: 0 });
}

#[test]
fn test_fresh_records_mint_distinct_ids() {
    let a = RequestRecord::new("GET", "https://example.com/a");
    let b = RequestRecord::new("GET", "https://example.com/b");
    assert_ne!(a.id, b.id);
}

// --- Store Behavior ---

#[test]
fn test_save_update_then_fill_to_capacity() {
    let store = Storage::new();
    let (_token, log) = observe_log(&store);

    // Three distinct requests: three single-element appends.
    for id in 1..=3 {
        store.save(record(id, "https://example.com"));
    }
    assert_eq!(store.len(), 3);
    {
        let log = log.lock();
        assert_eq!(log.len(), 4); // replay + 3 appends
        for change in &log[1..] {
            assert!(matches!(change, Change::Appended { entries } if entries.len() == 1));
        }
    }

    // Saving id 2 again replaces it at index 1, length unchanged.
    let updated = record(2, "https://example.com/retried");
    store.save(updated.clone());
    assert_eq!(store.len(), 3);
    assert_eq!(
        *log.lock().last().unwrap(),
        Change::UpdatedAt { entry: updated, index: 1 }
    );

    // 98 more distinct ids: the 101st distinct entry triggers one eviction.
    for id in 4..=101 {
        store.save(record(id, "https://example.com"));
    }
    assert_eq!(store.len(), 100);

    let log = log.lock();
    let removed: Vec<_> = log
        .iter()
        .filter(|c| matches!(c, Change::Removed { .. }))
        .collect();
    assert_eq!(removed.len(), 1);
    assert_eq!(*removed[0], Change::Removed { range: 0..1 });

    // Eviction follows its append as a separate change in the same save.
    let removed_pos = log
        .iter()
        .position(|c| matches!(c, Change::Removed { .. }))
        .unwrap();
    assert!(matches!(&log[removed_pos - 1], Change::Appended { .. }));
}

#[test]
fn test_replay_on_subscribe_matches_contents() {
    let store = Storage::new();
    for id in 1..=5 {
        store.save(record(id, "https://example.com"));
    }

    let (_token, log) = observe_log(&store);

    let log = log.lock();
    assert_eq!(log.len(), 1);
    assert_eq!(
        log[0],
        Change::Appended { entries: store.entries() }
    );
}

#[test]
fn test_clear_then_observe_replays_empty() {
    let store = Storage::new();
    let (_token, log) = observe_log(&store);

    store.save(record(1, "https://example.com"));
    store.clear();

    assert!(store.is_empty());
    assert_eq!(*log.lock().last().unwrap(), Change::Cleared);

    let (_token2, log2) = observe_log(&store);
    assert_eq!(log2.lock()[0], Change::Appended { entries: vec![] });
}

#[test]
fn test_two_observers_see_identical_sequences() {
    let store = Storage::new();
    let (_token_a, log_a) = observe_log(&store);
    let (_token_b, log_b) = observe_log(&store);

    store.save(record(1, "https://example.com/a"));
    store.save(record(2, "https://example.com/b"));
    store.save(record(1, "https://example.com/a-done"));
    store.clear();
    store.save(record(3, "https://example.com/c"));

    assert_eq!(*log_a.lock(), *log_b.lock());
}

#[test]
fn test_unsubscribed_observer_gets_nothing_further() {
    let store = Storage::new();
    let (token, log) = observe_log(&store);

    store.save(record(1, "https://example.com"));
    let seen = log.lock().len();

    token.stop_observation();
    store.save(record(2, "https://example.com"));
    store.clear();

    assert_eq!(log.lock().len(), seen);
}

// --- Configuration ---

#[test]
fn test_custom_capacity_bounds_store() {
    let store: Arc<Storage<RequestRecord>> =
        Storage::with_config(StoreConfig { capacity: 5 }).unwrap();
    for id in 1..=20 {
        store.save(record(id, "https://example.com"));
    }
    assert_eq!(store.len(), 5);
    assert_eq!(store.capacity(), 5);

    // Oldest-first: the survivors are the five most recent ids.
    let ids: Vec<u64> = store.entries().iter().map(|r| r.id.0).collect();
    assert_eq!(ids, vec![16, 17, 18, 19, 20]);
}

// --- Shared Instance ---

#[test]
fn test_shared_store_is_one_instance() {
    let a = Storage::shared();
    let b = Storage::shared();
    assert!(Arc::ptr_eq(a, b));
    assert_eq!(a.capacity(), 100);
}

// --- Serialization ---

#[test]
fn test_change_serializes_with_type_tag() {
    let appended = Change::Appended { entries: vec![record(1, "https://example.com")] };
    let value = serde_json::to_value(&appended).unwrap();
    assert_eq!(value["type"], "appended");
    assert_eq!(value["entries"][0]["method"], "GET");

    let removed: Change<RequestRecord> = Change::Removed { range: 0..1 };
    let value = serde_json::to_value(&removed).unwrap();
    assert_eq!(value["type"], "removed");
    assert_eq!(value["range"]["start"], 0);
    assert_eq!(value["range"]["end"], 1);

    let cleared: Change<RequestRecord> = Change::Cleared;
    assert_eq!(serde_json::to_value(&cleared).unwrap()["type"], "cleared");
}
