//! In-memory indexes
//!
//! Both indexes are always derived state: they are updated on every append by
//! the write path and rebuilt by replay during recovery. Neither is ever
//! persisted.

use std::collections::HashMap;

/// Maps a key to the byte offset of its most recent record within one segment
#[derive(Debug, Default)]
pub struct SegmentIndex {
    offsets: HashMap<Vec<u8>, u64>,
}

impl SegmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `key`'s latest record in this segment starts at `offset`
    pub fn insert(&mut self, key: Vec<u8>, offset: u64) {
        self.offsets.insert(key, offset);
    }

    /// Offset of the key's most recent record, if the key appears at all
    pub fn get(&self, key: &[u8]) -> Option<u64> {
        self.offsets.get(key).copied()
    }

    /// Iterate over every indexed key (used by recovery to seed the table index)
    pub fn keys(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.offsets.keys()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Maps a key to the position (in creation order) of the segment holding the
/// key's most recent write across the whole table.
///
/// Last-writer-wins: the latest write or delete for a key always supersedes
/// the mapping, even when the key also exists in older segments. The table
/// index is the sole routing source for reads; an index miss is a true
/// absence.
#[derive(Debug, Default)]
pub struct TableIndex {
    segments: HashMap<Vec<u8>, usize>,
}

impl TableIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `key` at the segment in position `position`
    pub fn insert(&mut self, key: Vec<u8>, position: usize) {
        self.segments.insert(key, position);
    }

    /// Position of the segment authoritative for `key`
    pub fn get(&self, key: &[u8]) -> Option<usize> {
        self.segments.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
