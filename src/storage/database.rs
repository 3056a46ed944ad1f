//! Database
//!
//! A named collection of tables under one directory. A thin router: it
//! resolves a table by name and delegates the read/write/delete to it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::{Result, StrataError};
use crate::storage::caching::CachingTable;
use crate::storage::table::{Table, TableStore};
use crate::storage::StoreOptions;

/// A named set of tables, each fronted by its LRU cache
pub struct Database {
    name: String,

    /// Database directory, `{working_dir}/{db_name}`
    root: PathBuf,

    tables: HashMap<String, CachingTable<TableStore>>,

    options: StoreOptions,
}

impl Database {
    /// Create a new database directory.
    ///
    /// Fails with `AlreadyExists` if the directory is already present.
    pub fn create(name: &str, working_dir: &Path, options: StoreOptions) -> Result<Self> {
        let root = working_dir.join(name);
        if root.exists() {
            return Err(StrataError::AlreadyExists(format!("database {}", name)));
        }
        fs::create_dir(&root)?;

        Ok(Self {
            name: name.to_string(),
            root,
            tables: HashMap::new(),
            options,
        })
    }

    /// Reconstruct a database from recovery with its already-replayed tables
    pub(crate) fn from_recovery(
        name: String,
        root: PathBuf,
        tables: HashMap<String, CachingTable<TableStore>>,
        options: StoreOptions,
    ) -> Self {
        Self {
            name,
            root,
            tables,
            options,
        }
    }

    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the tables in this database
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Create a table, failing with `AlreadyExists` on a duplicate name
    pub fn create_table(&mut self, table_name: &str) -> Result<()> {
        if self.tables.contains_key(table_name) {
            return Err(StrataError::AlreadyExists(format!("table {}", table_name)));
        }

        let store = TableStore::create(table_name, &self.root, self.options.segment_size_limit)?;
        self.tables.insert(
            table_name.to_string(),
            CachingTable::new(store, self.options.cache_capacity),
        );
        Ok(())
    }

    /// Write a value for a key; `None` delegates to delete
    pub fn write(&mut self, table_name: &str, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        self.table_mut(table_name)?.write(key, value)
    }

    /// Read the latest value for a key (`None` when absent or deleted)
    pub fn read(&mut self, table_name: &str, key: &[u8]) -> Result<Option<Bytes>> {
        self.table_mut(table_name)?.read(key)
    }

    /// Delete a key
    pub fn delete(&mut self, table_name: &str, key: &[u8]) -> Result<()> {
        self.table_mut(table_name)?.delete(key)
    }

    /// Direct access to a table (used by tests and recovery assertions)
    pub fn table(&self, table_name: &str) -> Option<&CachingTable<TableStore>> {
        self.tables.get(table_name)
    }

    fn table_mut(&mut self, table_name: &str) -> Result<&mut CachingTable<TableStore>> {
        self.tables.get_mut(table_name).ok_or_else(|| {
            StrataError::NotFound(format!(
                "table {} in database {}",
                table_name, self.name
            ))
        })
    }
}
