//! Configuration for StrataKV
//!
//! Centralized configuration with sensible defaults, a builder, and an
//! optional `key=value` properties-file loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};

/// Main configuration for a StrataKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all databases.
    /// Internal structure:
    ///   {working_dir}/
    ///     └── {database}/
    ///           └── {table}/
    ///                 └── {table}_{timestamp_millis}   (one file per segment)
    pub working_dir: PathBuf,

    /// Segment size ceiling in bytes. A segment that has reached this many
    /// written bytes becomes permanently read-only and the table rolls over.
    pub segment_size_limit: u64,

    /// Per-table LRU cache capacity (number of entries)
    pub cache_capacity: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("./stratakv_data"),
            segment_size_limit: 100_000,
            cache_capacity: 5_000,
            listen_addr: "127.0.0.1:6379".to_string(),
            max_connections: 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration from a `key=value` properties file.
    ///
    /// Recognized keys: `kvs.working_path`, `kvs.listen_addr`,
    /// `kvs.segment_size_limit`, `kvs.cache_capacity`, `kvs.max_connections`.
    /// Unknown keys are allowed and ignored; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            StrataError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        let mut config = Config::default();

        for (lineno, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                StrataError::Config(format!(
                    "malformed property on line {}: {:?}",
                    lineno + 1,
                    line
                ))
            })?;

            match key.trim() {
                "kvs.working_path" => config.working_dir = PathBuf::from(value.trim()),
                "kvs.listen_addr" => config.listen_addr = value.trim().to_string(),
                "kvs.segment_size_limit" => {
                    config.segment_size_limit = parse_number(key, value)?;
                }
                "kvs.cache_capacity" => {
                    config.cache_capacity = parse_number(key, value)? as usize;
                }
                "kvs.max_connections" => {
                    config.max_connections = parse_number(key, value)? as usize;
                }
                _ => {} // other properties are permitted in the same file
            }
        }

        Ok(config)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        StrataError::Config(format!("property {} is not a number: {:?}", key, value))
    })
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the working directory (root for all databases)
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.working_dir = path.into();
        self
    }

    /// Set the segment size ceiling (in bytes)
    pub fn segment_size_limit(mut self, bytes: u64) -> Self {
        self.config.segment_size_limit = bytes;
        self
    }

    /// Set the per-table cache capacity (in entries)
    pub fn cache_capacity(mut self, entries: usize) -> Self {
        self.config.cache_capacity = entries;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
