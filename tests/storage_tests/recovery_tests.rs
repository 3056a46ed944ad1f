//! Tests for startup recovery
//!
//! These tests verify:
//! - Replaying segments reproduces read-equivalent indexes (idempotence)
//! - Tombstones keep shadowing values across a restart
//! - Creation-order replay converges to last-writer-wins
//! - Corrupt or foreign files abort recovery

use std::fs::{self, OpenOptions};
use std::io::Write as _;

use stratakv::storage::{recover_working_dir, Database, StoreOptions};
use stratakv::StrataError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const OPTIONS: StoreOptions = StoreOptions {
    segment_size_limit: 64,
    cache_capacity: 128,
};

fn seed_database(temp: &TempDir) -> Database {
    let mut db = Database::create("db1", temp.path(), OPTIONS).unwrap();
    db.create_table("t1").unwrap();
    db
}

fn fill_past_rollover(db: &mut Database, table: &str) {
    for i in 0..10 {
        let key = format!("fill{:02}", i);
        db.write(table, key.as_bytes(), Some(b"filler-value")).unwrap();
    }
}

// =============================================================================
// Replay Correctness
// =============================================================================

#[test]
fn test_recovery_reproduces_reads() {
    let temp = TempDir::new().unwrap();
    {
        let mut db = seed_database(&temp);
        db.write("t1", b"a", Some(b"hello")).unwrap();
        db.write("t1", b"b", Some(b"world")).unwrap();
    }

    let mut databases = recover_working_dir(temp.path(), OPTIONS).unwrap();
    let db = databases.get_mut("db1").unwrap();

    assert_eq!(db.read("t1", b"a").unwrap().as_deref(), Some(&b"hello"[..]));
    assert_eq!(db.read("t1", b"b").unwrap().as_deref(), Some(&b"world"[..]));
    assert_eq!(db.read("t1", b"c").unwrap(), None);
}

#[test]
fn test_recovery_last_writer_wins_across_segments() {
    let temp = TempDir::new().unwrap();
    {
        let mut db = seed_database(&temp);
        db.write("t1", b"k", Some(b"v1")).unwrap();
        fill_past_rollover(&mut db, "t1");
        db.write("t1", b"k", Some(b"v2")).unwrap();
    }

    let mut databases = recover_working_dir(temp.path(), OPTIONS).unwrap();
    let db = databases.get_mut("db1").unwrap();

    assert!(db.table("t1").unwrap().inner().segment_count() > 1);
    assert_eq!(db.read("t1", b"k").unwrap().as_deref(), Some(&b"v2"[..]));
}

#[test]
fn test_recovery_keeps_tombstone_shadowing() {
    let temp = TempDir::new().unwrap();
    {
        let mut db = seed_database(&temp);
        db.write("t1", b"k", Some(b"v1")).unwrap();
        fill_past_rollover(&mut db, "t1");
        // The tombstone lands in a newer segment than "v1"
        db.delete("t1", b"k").unwrap();
    }

    let mut databases = recover_working_dir(temp.path(), OPTIONS).unwrap();
    let db = databases.get_mut("db1").unwrap();

    // The stale value in the older segment must not resurface.
    assert_eq!(db.read("t1", b"k").unwrap(), None);
}

#[test]
fn test_recovery_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let keys: Vec<String> = (0..25).map(|i| format!("key{:02}", i)).collect();
    {
        let mut db = seed_database(&temp);
        for (i, key) in keys.iter().enumerate() {
            db.write("t1", key.as_bytes(), Some(format!("v{}", i).as_bytes()))
                .unwrap();
        }
        for key in keys.iter().step_by(3) {
            db.delete("t1", key.as_bytes()).unwrap();
        }
    }

    // Recover twice over the unmodified files; both replays must agree on
    // every key.
    let mut first = recover_working_dir(temp.path(), OPTIONS).unwrap();
    let mut second = recover_working_dir(temp.path(), OPTIONS).unwrap();

    for (i, key) in keys.iter().enumerate() {
        let expected = if i % 3 == 0 {
            None
        } else {
            Some(format!("v{}", i).into_bytes())
        };
        let a = first.get_mut("db1").unwrap().read("t1", key.as_bytes()).unwrap();
        let b = second.get_mut("db1").unwrap().read("t1", key.as_bytes()).unwrap();
        assert_eq!(a.as_deref(), expected.as_deref(), "key {}", key);
        assert_eq!(a, b, "replays disagree on key {}", key);
    }
}

#[test]
fn test_recovered_table_accepts_new_writes() {
    let temp = TempDir::new().unwrap();
    {
        let mut db = seed_database(&temp);
        db.write("t1", b"old", Some(b"before-restart")).unwrap();
    }

    let mut databases = recover_working_dir(temp.path(), OPTIONS).unwrap();
    let db = databases.get_mut("db1").unwrap();
    db.write("t1", b"new", Some(b"after-restart")).unwrap();

    assert_eq!(db.read("t1", b"old").unwrap().as_deref(), Some(&b"before-restart"[..]));
    assert_eq!(db.read("t1", b"new").unwrap().as_deref(), Some(&b"after-restart"[..]));
}

// =============================================================================
// Working Directory Handling
// =============================================================================

#[test]
fn test_missing_working_dir_is_created() {
    let temp = TempDir::new().unwrap();
    let working = temp.path().join("does-not-exist-yet");

    let databases = recover_working_dir(&working, OPTIONS).unwrap();
    assert!(databases.is_empty());
    assert!(working.is_dir());
}

#[test]
fn test_working_path_as_file_is_fatal() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("not-a-dir");
    fs::write(&path, b"oops").unwrap();

    let result = recover_working_dir(&path, OPTIONS);
    assert!(matches!(result, Err(StrataError::Storage(_))));
}

#[test]
fn test_empty_table_directory_gets_active_segment() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("db1").join("t1")).unwrap();

    let mut databases = recover_working_dir(temp.path(), OPTIONS).unwrap();
    let db = databases.get_mut("db1").unwrap();

    assert_eq!(db.table("t1").unwrap().inner().segment_count(), 1);
    db.write("t1", b"k", Some(b"v")).unwrap();
    assert_eq!(db.read("t1", b"k").unwrap().as_deref(), Some(&b"v"[..]));
}

// =============================================================================
// Corruption Handling
// =============================================================================

#[test]
fn test_truncated_trailing_record_aborts_recovery() {
    let temp = TempDir::new().unwrap();
    let segment_path;
    {
        let mut db = seed_database(&temp);
        db.write("t1", b"k", Some(b"a-value-to-mangle")).unwrap();
        let table_dir = temp.path().join("db1").join("t1");
        segment_path = fs::read_dir(&table_dir).unwrap().next().unwrap().unwrap().path();
    }

    // Chop bytes off the tail so the last record's declared lengths cannot
    // be satisfied.
    let len = fs::metadata(&segment_path).unwrap().len();
    let file = OpenOptions::new().write(true).open(&segment_path).unwrap();
    file.set_len(len - 5).unwrap();

    let result = recover_working_dir(temp.path(), OPTIONS);
    assert!(matches!(result, Err(StrataError::CorruptStream(_))));
}

#[test]
fn test_garbage_record_aborts_recovery() {
    let temp = TempDir::new().unwrap();
    {
        let _db = seed_database(&temp);
    }
    let table_dir = temp.path().join("db1").join("t1");
    let segment_path = fs::read_dir(&table_dir).unwrap().next().unwrap().unwrap().path();

    // A negative key length can never be satisfied.
    let mut file = OpenOptions::new().append(true).open(&segment_path).unwrap();
    file.write_all(&(-9i32).to_be_bytes()).unwrap();

    let result = recover_working_dir(temp.path(), OPTIONS);
    assert!(matches!(result, Err(StrataError::CorruptStream(_))));
}

#[test]
fn test_foreign_file_in_table_directory_aborts_recovery() {
    let temp = TempDir::new().unwrap();
    {
        let _db = seed_database(&temp);
    }
    fs::write(temp.path().join("db1").join("t1").join("README"), b"hi").unwrap();

    let result = recover_working_dir(temp.path(), OPTIONS);
    assert!(matches!(result, Err(StrataError::Storage(_))));
}
