//! Caching table decorator
//!
//! Wraps any [`Table`] with an LRU cache. The cache is purely a read
//! accelerator: every entry in it is already (or about to be) persisted by
//! the wrapped table, and it is never consulted as a source of truth.
//!
//! Policy: write-through on writes (cache first, then delegate), cache-aside
//! on reads (miss delegates and populates on a present result), and
//! evict-then-delegate on deletes.

use bytes::Bytes;

use crate::cache::LruCache;
use crate::error::Result;
use crate::storage::table::Table;

/// LRU-cached decorator over a table
pub struct CachingTable<T: Table> {
    inner: T,
    cache: LruCache,
}

impl<T: Table> CachingTable<T> {
    /// Wrap a table with a cache of the given capacity
    pub fn new(inner: T, cache_capacity: usize) -> Self {
        Self {
            inner,
            cache: LruCache::new(cache_capacity),
        }
    }

    /// The wrapped table
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Number of currently cached entries
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Whether a key is currently held in the cache
    pub fn is_cached(&self, key: &[u8]) -> bool {
        self.cache.contains(key)
    }
}

impl<T: Table> Table for CachingTable<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn write(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        match value {
            Some(value) => {
                self.cache
                    .insert(key.to_vec(), Bytes::copy_from_slice(value));
                self.inner.write(key, Some(value))
            }
            None => self.delete(key),
        }
    }

    fn read(&mut self, key: &[u8]) -> Result<Option<Bytes>> {
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value));
        }

        let value = self.inner.read(key)?;
        if let Some(value) = &value {
            self.cache.insert(key.to_vec(), value.clone());
        }
        Ok(value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.cache.remove(key);
        self.inner.delete(key)
    }
}
