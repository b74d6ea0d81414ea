//! Tests for stores sharing one database file.
//!
//! Tests:
//! - Committed writes are visible to a second store
//! - A blocked writer fails with Busy after its timeout
//! - Readers proceed while a writer holds the lock
//! - Writers on separate threads serialize without losing entries

mod common;

use std::thread;
use std::time::{Duration, Instant};

use common::TestFixture;
use yapdict::Mapping;

/// A committed write by one store is visible to another.
#[test]
fn test_second_store_sees_committed_write() {
    let fixture = TestFixture::new();
    let mut writer = fixture.open();
    let reader = fixture.open();

    writer.set("z", "26").unwrap();

    assert!(reader.contains("z").unwrap());
    assert_eq!(reader.get("z").unwrap(), "26");
}

/// Uncommitted transaction writes stay invisible to other stores.
#[test]
fn test_uncommitted_writes_invisible() {
    let fixture = TestFixture::new();
    let mut writer = fixture.open();
    let reader = fixture.open();

    let mut tx = writer.begin().unwrap();
    tx.set("pending", "1").unwrap();
    assert!(!reader.contains("pending").unwrap());

    tx.commit().unwrap();
    assert!(reader.contains("pending").unwrap());
}

/// A writer blocked by an open transaction gives up after its timeout.
#[test]
fn test_blocked_writer_times_out() {
    let fixture = TestFixture::new();
    let mut holder = fixture.open();
    let mut blocked = fixture.open_with_timeout(Duration::from_millis(100));

    let tx = holder.begin().unwrap();

    let start = Instant::now();
    let err = blocked.set("k", "v").unwrap_err();
    let waited = start.elapsed();

    assert!(err.is_busy(), "expected Busy, got {err:?}");
    assert!(
        waited >= Duration::from_millis(80),
        "writer should wait for the lock, waited {waited:?}"
    );

    // Starting a transaction is also bounded by the timeout
    assert!(blocked.begin().unwrap_err().is_busy());

    tx.commit().unwrap();
    blocked.set("k", "v").unwrap();
}

/// WAL lets readers proceed while a writer holds the lock.
#[test]
fn test_reader_not_blocked_by_writer() {
    let fixture = TestFixture::new();
    let mut writer = fixture.open();
    writer.set("stable", "1").unwrap();

    let reader = fixture.open_with_timeout(Duration::from_millis(50));
    let mut tx = writer.begin().unwrap();
    tx.set("stable", "2").unwrap();

    assert_eq!(reader.get("stable").unwrap(), "1");
    assert_eq!(reader.len().unwrap(), 1);

    tx.commit().unwrap();
    assert_eq!(reader.get("stable").unwrap(), "2");
}

/// Writers on separate threads serialize through the file lock.
#[test]
fn test_threaded_writers_serialize() {
    let fixture = TestFixture::new();
    // Create the schema before the writers race
    drop(fixture.open());

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let path = fixture.db_path.clone();
            thread::spawn(move || {
                let mut store = yapdict::Store::open_with_timeout(&path, Duration::from_secs(10))
                    .expect("failed to open store");
                for i in 0..25 {
                    store
                        .set(format!("w{worker}-{i}").as_str(), "x")
                        .expect("write failed");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer panicked");
    }

    let store = fixture.open();
    assert_eq!(store.len().unwrap(), 100);
}

/// Reopening a file keeps its entries and schema.
#[test]
fn test_reopen_persists() {
    let fixture = TestFixture::new();
    {
        let mut store = fixture.open();
        store.update([("a", "1"), ("b", "2")]).unwrap();
        store.close().unwrap();
    }
    let store = fixture.open();
    assert_eq!(store.len().unwrap(), 2);
    assert_eq!(store.get("b").unwrap(), "2");
}
