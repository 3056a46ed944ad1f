//! Table
//!
//! An ordered collection of segments under one directory. All appends go to
//! the single active (last-created) segment; when it fills up the table rolls
//! over to a fresh timestamp-named segment. Reads are routed exclusively
//! through the table index; older segments are never scanned.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::{Result, StrataError};
use crate::storage::index::TableIndex;
use crate::storage::segment::{next_segment_name, Segment};

/// Read/write/delete contract shared by the file-backed table and the caching
/// decorator in front of it.
pub trait Table {
    /// Table name
    fn name(&self) -> &str;

    /// Write a value for a key; `None` delegates to [`delete`].
    ///
    /// [`delete`]: Table::delete
    fn write(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()>;

    /// Read the latest value for a key (`None` when absent or deleted)
    fn read(&mut self, key: &[u8]) -> Result<Option<Bytes>>;

    /// Delete a key by appending a tombstone
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

/// File-backed table: a directory of append-only segments plus the table
/// index routing each key to the segment that last wrote it.
pub struct TableStore {
    name: String,

    /// Table directory, `{db_root}/{table_name}`
    root: PathBuf,

    /// key → position of the authoritative segment in `segments`
    index: TableIndex,

    /// Segments in creation order; the last one is the active segment
    segments: Vec<Segment>,

    segment_size_limit: u64,
}

impl TableStore {
    /// Create a new table directory with an initial empty active segment.
    ///
    /// Fails with `AlreadyExists` if the directory is already present.
    pub fn create(name: &str, db_root: &Path, segment_size_limit: u64) -> Result<Self> {
        let root = db_root.join(name);
        if root.exists() {
            return Err(StrataError::AlreadyExists(format!("table {}", name)));
        }
        fs::create_dir(&root)?;

        let segment = Segment::create(&next_segment_name(name), &root, segment_size_limit)?;

        Ok(Self {
            name: name.to_string(),
            root,
            index: TableIndex::new(),
            segments: vec![segment],
            segment_size_limit,
        })
    }

    /// Reconstruct a table from recovery.
    ///
    /// `segments` must be in creation order and non-empty; the last one
    /// becomes the active segment. The table index has already been populated
    /// by segment replay.
    pub(crate) fn from_recovery(
        name: String,
        root: PathBuf,
        index: TableIndex,
        segments: Vec<Segment>,
        segment_size_limit: u64,
    ) -> Result<Self> {
        if segments.is_empty() {
            return Err(StrataError::InvariantViolation(format!(
                "recovered table {} has no segments",
                name
            )));
        }
        Ok(Self {
            name,
            root,
            index,
            segments,
            segment_size_limit,
        })
    }

    /// Number of segments (read-only ones plus the active one)
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Name of the current active segment
    pub fn active_segment_name(&self) -> Result<&str> {
        Ok(self.active()?.name())
    }

    /// Name of the segment the table index routes `key` to, if any
    pub fn routed_segment_name(&self, key: &[u8]) -> Option<&str> {
        self.index
            .get(key)
            .and_then(|pos| self.segments.get(pos))
            .map(|s| s.name())
    }

    fn active(&self) -> Result<&Segment> {
        self.segments.last().ok_or_else(|| {
            StrataError::InvariantViolation(format!("table {} has no active segment", self.name))
        })
    }

    fn active_mut(&mut self) -> Result<&mut Segment> {
        let name = self.name.clone();
        self.segments.last_mut().ok_or_else(|| {
            StrataError::InvariantViolation(format!("table {} has no active segment", name))
        })
    }

    /// Create a fresh segment and make it the active one
    fn roll_over(&mut self) -> Result<()> {
        let segment = Segment::create(
            &next_segment_name(&self.name),
            &self.root,
            self.segment_size_limit,
        )?;
        tracing::debug!(
            table = %self.name,
            segment = %segment.name(),
            "rolled over to new active segment"
        );
        self.segments.push(segment);
        Ok(())
    }

    /// Append through the active segment, rolling over once if it is full,
    /// then point the table index at the (possibly new) active segment.
    fn append_with_rollover(
        &mut self,
        key: &[u8],
        append: impl Fn(&mut Segment, &[u8]) -> Result<bool>,
    ) -> Result<()> {
        if !append(self.active_mut()?, key)? {
            self.roll_over()?;
            if !append(self.active_mut()?, key)? {
                // A freshly created segment always accepts at least one record.
                return Err(StrataError::InvariantViolation(format!(
                    "table {}: fresh segment refused an append",
                    self.name
                )));
            }
        }

        let active_position = self.segments.len() - 1;
        self.index.insert(key.to_vec(), active_position);
        Ok(())
    }
}

impl Table for TableStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        let value = match value {
            Some(value) => value,
            None => return self.delete(key),
        };
        self.append_with_rollover(key, |segment, key| segment.write(key, value))
    }

    fn read(&mut self, key: &[u8]) -> Result<Option<Bytes>> {
        let position = match self.index.get(key) {
            Some(position) => position,
            None => return Ok(None),
        };

        let segment = self.segments.get(position).ok_or_else(|| {
            StrataError::InvariantViolation(format!(
                "table {}: index points at missing segment {}",
                self.name, position
            ))
        })?;

        segment.read(key)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.append_with_rollover(key, |segment, key| segment.delete(key))
    }
}
