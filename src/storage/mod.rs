//! Storage Module
//!
//! The log-structured storage engine: databases contain tables, tables
//! contain append-only segment files, and each table is fronted by an LRU
//! cache.
//!
//! ## Responsibilities
//! - Append-only segment files with a size-bounded write cursor
//! - Per-segment and per-table in-memory indexes (always derived, never persisted)
//! - Startup recovery by replaying segments in creation order
//! - Write-through LRU caching in front of each table
//!
//! ## Segment File Format
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ Record 1                                           │
//! │ ┌────────────┬─────┬──────────────┬──────────────┐ │
//! │ │ KeyLen: i32│ Key │ ValueLen: i32│ Value bytes  │ │
//! │ └────────────┴─────┴──────────────┴──────────────┘ │
//! ├────────────────────────────────────────────────────┤
//! │ Record 2  (ValueLen = -1 → tombstone, no value)    │
//! ├────────────────────────────────────────────────────┤
//! │ ... concatenated records, terminated by EOF ...    │
//! └────────────────────────────────────────────────────┘
//! ```
//! No file-level header, magic number, or checksum; indexes are always
//! rebuilt by scan.
//!
//! ## Filesystem Layout
//! ```text
//! {working_dir}/{database}/{table}/{table}_{timestamp_millis}
//! ```

mod caching;
mod database;
mod index;
mod record;
mod recovery;
mod segment;
mod table;

pub use caching::CachingTable;
pub use database::Database;
pub use index::{SegmentIndex, TableIndex};
pub use record::Record;
pub use recovery::recover_working_dir;
pub use segment::{next_segment_name, parse_segment_timestamp, Segment};
pub use table::{Table, TableStore};

/// Tunables threaded through databases, tables and recovery
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Segment size ceiling in bytes
    pub segment_size_limit: u64,

    /// Per-table LRU cache capacity in entries
    pub cache_capacity: usize,
}

impl From<&crate::config::Config> for StoreOptions {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            segment_size_limit: config.segment_size_limit,
            cache_capacity: config.cache_capacity,
        }
    }
}
