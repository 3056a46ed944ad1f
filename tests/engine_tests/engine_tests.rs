//! Tests for the storage engine
//!
//! These tests verify:
//! - Database and table lifecycle through the engine
//! - Set answers with the previous value, Delete with the removed value
//! - Missing databases and tables surface as NotFound
//! - Data written before a restart is readable after reopening
//! - Submission through an EngineHandle preserves per-handle order

use std::thread;

use stratakv::protocol::Command;
use stratakv::{Config, Engine, EngineHandle, StrataError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config(temp: &TempDir) -> Config {
    Config::builder()
        .working_dir(temp.path())
        .segment_size_limit(256)
        .cache_capacity(64)
        .build()
}

fn open_engine(temp: &TempDir) -> Engine {
    Engine::open(test_config(temp)).unwrap()
}

fn seeded_engine(temp: &TempDir) -> Engine {
    let mut engine = open_engine(temp);
    engine.create_database("db1").unwrap();
    engine.create_table("db1", "t1").unwrap();
    engine
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_open_on_empty_dir() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp);
    assert_eq!(engine.database_count(), 0);
}

#[test]
fn test_create_database_and_table() {
    let temp = TempDir::new().unwrap();
    let engine = seeded_engine(&temp);

    assert_eq!(engine.database_count(), 1);
    assert!(engine.database("db1").is_some());
    assert!(temp.path().join("db1").join("t1").is_dir());
}

#[test]
fn test_duplicate_database_is_rejected() {
    let temp = TempDir::new().unwrap();
    let mut engine = seeded_engine(&temp);

    let result = engine.create_database("db1");
    assert!(matches!(result, Err(StrataError::AlreadyExists(_))));
}

#[test]
fn test_duplicate_table_is_rejected() {
    let temp = TempDir::new().unwrap();
    let mut engine = seeded_engine(&temp);

    let result = engine.create_table("db1", "t1");
    assert!(matches!(result, Err(StrataError::AlreadyExists(_))));
}

#[test]
fn test_missing_database_is_not_found() {
    let temp = TempDir::new().unwrap();
    let mut engine = open_engine(&temp);

    assert!(matches!(
        engine.get("nope", "t1", b"k"),
        Err(StrataError::NotFound(_))
    ));
    assert!(matches!(
        engine.create_table("nope", "t1"),
        Err(StrataError::NotFound(_))
    ));
}

#[test]
fn test_missing_table_is_not_found() {
    let temp = TempDir::new().unwrap();
    let mut engine = seeded_engine(&temp);

    assert!(matches!(
        engine.set("db1", "nope", b"k", b"v"),
        Err(StrataError::NotFound(_))
    ));
}

// =============================================================================
// Read / Write Semantics
// =============================================================================

#[test]
fn test_set_answers_previous_value() {
    let temp = TempDir::new().unwrap();
    let mut engine = seeded_engine(&temp);

    assert_eq!(engine.set("db1", "t1", b"k", b"v1").unwrap(), None);
    let previous = engine.set("db1", "t1", b"k", b"v2").unwrap();
    assert_eq!(previous.as_deref(), Some(&b"v1"[..]));
    assert_eq!(
        engine.get("db1", "t1", b"k").unwrap().as_deref(),
        Some(&b"v2"[..])
    );
}

#[test]
fn test_delete_answers_removed_value() {
    let temp = TempDir::new().unwrap();
    let mut engine = seeded_engine(&temp);

    engine.set("db1", "t1", b"k", b"v").unwrap();
    let removed = engine.delete("db1", "t1", b"k").unwrap();
    assert_eq!(removed.as_deref(), Some(&b"v"[..]));
    assert_eq!(engine.get("db1", "t1", b"k").unwrap(), None);
}

#[test]
fn test_delete_of_absent_key_answers_none() {
    let temp = TempDir::new().unwrap();
    let mut engine = seeded_engine(&temp);

    assert_eq!(engine.delete("db1", "t1", b"ghost").unwrap(), None);
}

#[test]
fn test_get_miss_is_none_not_error() {
    let temp = TempDir::new().unwrap();
    let mut engine = seeded_engine(&temp);

    assert_eq!(engine.get("db1", "t1", b"missing").unwrap(), None);
}

#[test]
fn test_reopen_recovers_databases_and_data() {
    let temp = TempDir::new().unwrap();
    {
        let mut engine = seeded_engine(&temp);
        engine.set("db1", "t1", b"persisted", b"yes").unwrap();
        engine.set("db1", "t1", b"doomed", b"no").unwrap();
        engine.delete("db1", "t1", b"doomed").unwrap();
    }

    let mut engine = open_engine(&temp);
    assert_eq!(engine.database_count(), 1);
    assert_eq!(
        engine.get("db1", "t1", b"persisted").unwrap().as_deref(),
        Some(&b"yes"[..])
    );
    assert_eq!(engine.get("db1", "t1", b"doomed").unwrap(), None);
}

// =============================================================================
// Command Execution
// =============================================================================

#[test]
fn test_execute_command_variants() {
    let temp = TempDir::new().unwrap();
    let mut engine = open_engine(&temp);

    let create_db = Command::CreateDatabase {
        database: "db1".to_string(),
    };
    assert_eq!(engine.execute(create_db).unwrap(), None);

    let create_table = Command::CreateTable {
        database: "db1".to_string(),
        table: "t1".to_string(),
    };
    assert_eq!(engine.execute(create_table).unwrap(), None);

    let set = Command::Set {
        database: "db1".to_string(),
        table: "t1".to_string(),
        key: "k".to_string(),
        value: b"v".to_vec(),
    };
    assert_eq!(engine.execute(set).unwrap(), None);

    let get = Command::Get {
        database: "db1".to_string(),
        table: "t1".to_string(),
        key: "k".to_string(),
    };
    assert_eq!(engine.execute(get).unwrap().as_deref(), Some(&b"v"[..]));

    let delete = Command::Delete {
        database: "db1".to_string(),
        table: "t1".to_string(),
        key: "k".to_string(),
    };
    assert_eq!(engine.execute(delete).unwrap().as_deref(), Some(&b"v"[..]));

    assert_eq!(
        engine.execute(Command::Ping).unwrap().as_deref(),
        Some(&b"PONG"[..])
    );
}

// =============================================================================
// Engine Handle
// =============================================================================

fn set_command(key: &str, value: &[u8]) -> Command {
    Command::Set {
        database: "db1".to_string(),
        table: "t1".to_string(),
        key: key.to_string(),
        value: value.to_vec(),
    }
}

fn get_command(key: &str) -> Command {
    Command::Get {
        database: "db1".to_string(),
        table: "t1".to_string(),
        key: key.to_string(),
    }
}

#[test]
fn test_handle_submits_in_order() {
    let temp = TempDir::new().unwrap();
    let engine = seeded_engine(&temp);
    let handle = EngineHandle::spawn(engine);

    handle.submit(set_command("k", b"v1")).unwrap();
    handle.submit(set_command("k", b"v2")).unwrap();

    // A read submitted after both writes observes the second one.
    let value = handle.submit(get_command("k")).unwrap();
    assert_eq!(value.as_deref(), Some(&b"v2"[..]));
}

#[test]
fn test_handle_errors_pass_through() {
    let temp = TempDir::new().unwrap();
    let engine = seeded_engine(&temp);
    let handle = EngineHandle::spawn(engine);

    let result = handle.submit(Command::Get {
        database: "nope".to_string(),
        table: "t1".to_string(),
        key: "k".to_string(),
    });
    assert!(matches!(result, Err(StrataError::NotFound(_))));
}

#[test]
fn test_cloned_handles_share_one_engine() {
    let temp = TempDir::new().unwrap();
    let engine = seeded_engine(&temp);
    let handle = EngineHandle::spawn(engine);

    let writers: Vec<_> = (0..4)
        .map(|i| {
            let handle = handle.clone();
            thread::spawn(move || {
                for j in 0..25 {
                    let key = format!("w{}k{}", i, j);
                    handle.submit(set_command(&key, b"payload")).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    for i in 0..4 {
        for j in 0..25 {
            let key = format!("w{}k{}", i, j);
            let value = handle.submit(get_command(&key)).unwrap();
            assert_eq!(value.as_deref(), Some(&b"payload"[..]), "key {}", key);
        }
    }
}

#[test]
fn test_ping_through_handle() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp);
    let handle = EngineHandle::spawn(engine);

    assert_eq!(
        handle.submit(Command::Ping).unwrap().as_deref(),
        Some(&b"PONG"[..])
    );
}
