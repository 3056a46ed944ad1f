//! Tests for configuration loading

use std::fs;
use std::path::PathBuf;

use stratakv::{Config, StrataError};
use tempfile::TempDir;

fn write_properties(temp: &TempDir, contents: &str) -> PathBuf {
    let path = temp.path().join("server.properties");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.segment_size_limit, 100_000);
    assert_eq!(config.cache_capacity, 5_000);
    assert_eq!(config.listen_addr, "127.0.0.1:6379");
}

#[test]
fn test_builder_overrides() {
    let config = Config::builder()
        .working_dir("/tmp/kv")
        .segment_size_limit(4096)
        .cache_capacity(10)
        .listen_addr("0.0.0.0:9000")
        .max_connections(7)
        .build();

    assert_eq!(config.working_dir, PathBuf::from("/tmp/kv"));
    assert_eq!(config.segment_size_limit, 4096);
    assert_eq!(config.cache_capacity, 10);
    assert_eq!(config.listen_addr, "0.0.0.0:9000");
    assert_eq!(config.max_connections, 7);
}

#[test]
fn test_properties_file() {
    let temp = TempDir::new().unwrap();
    let path = write_properties(
        &temp,
        "# server settings\n\
         kvs.working_path = /var/lib/stratakv\n\
         kvs.listen_addr = 127.0.0.1:7000\n\
         kvs.segment_size_limit = 2048\n\
         \n\
         kvs.cache_capacity = 100\n",
    );

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.working_dir, PathBuf::from("/var/lib/stratakv"));
    assert_eq!(config.listen_addr, "127.0.0.1:7000");
    assert_eq!(config.segment_size_limit, 2048);
    assert_eq!(config.cache_capacity, 100);
    // Unspecified keys keep their defaults.
    assert_eq!(config.max_connections, Config::default().max_connections);
}

#[test]
fn test_unknown_keys_are_ignored() {
    let temp = TempDir::new().unwrap();
    let path = write_properties(&temp, "some.other.tool = whatever\nkvs.cache_capacity = 9\n");

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.cache_capacity, 9);
}

#[test]
fn test_malformed_line_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = write_properties(&temp, "kvs.cache_capacity\n");

    assert!(matches!(
        Config::from_file(&path),
        Err(StrataError::Config(_))
    ));
}

#[test]
fn test_non_numeric_value_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = write_properties(&temp, "kvs.segment_size_limit = lots\n");

    assert!(matches!(
        Config::from_file(&path),
        Err(StrataError::Config(_))
    ));
}

#[test]
fn test_missing_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nope.properties");

    assert!(matches!(
        Config::from_file(&path),
        Err(StrataError::Config(_))
    ));
}
