//! Segment
//!
//! An append-only file of records with a size-bounded write cursor and an
//! in-memory offset index. A segment accepts appends until its written size
//! reaches the ceiling, at which point it becomes permanently read-only.
//! Segments are never truncated, rewritten, or compacted.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::error::{Result, StrataError};
use crate::storage::index::SegmentIndex;
use crate::storage::record::Record;

/// Last timestamp handed out by [`next_segment_name`]. Segment names must be
/// strictly increasing within a process so that filesystem sort order equals
/// creation order.
static LAST_TIMESTAMP_MILLIS: AtomicU64 = AtomicU64::new(0);

/// Build a unique segment name for a table: `"<table>_<timestamp_millis>"`.
///
/// The embedded timestamp is forced strictly monotonic even when two segments
/// are created within the same millisecond.
pub fn next_segment_name(table_name: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let mut last = LAST_TIMESTAMP_MILLIS.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_TIMESTAMP_MILLIS.compare_exchange(
            last,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return format!("{}_{}", table_name, candidate),
            Err(actual) => last = actual,
        }
    }
}

/// Parse the creation timestamp out of a segment file name
/// (`"users_1700000000123"` → `Some(1700000000123)`).
pub fn parse_segment_timestamp(name: &str) -> Option<u64> {
    let (_, suffix) = name.rsplit_once('_')?;
    suffix.parse().ok()
}

/// An append-only segment file
pub struct Segment {
    /// File name, `"<table>_<timestamp_millis>"`
    name: String,

    /// Full path of the segment file
    path: PathBuf,

    /// Append cursor: total bytes written so far
    bytes_written: u64,

    /// Size ceiling; reaching it freezes the segment
    size_limit: u64,

    /// key → offset of the key's latest record in this file
    index: SegmentIndex,
}

impl Segment {
    /// Create a new empty segment file.
    ///
    /// Fails with `AlreadyExists` if a file of that name is already present
    /// in the table directory.
    pub fn create(name: &str, table_root: &Path, size_limit: u64) -> Result<Self> {
        let path = table_root.join(name);

        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    StrataError::AlreadyExists(format!("segment {}", name))
                } else {
                    StrataError::Io(e)
                }
            })?;

        Ok(Self {
            name: name.to_string(),
            path,
            bytes_written: 0,
            size_limit,
            index: SegmentIndex::new(),
        })
    }

    /// Reconstruct a segment from recovery: the file already exists and the
    /// index has been rebuilt by replay.
    pub(crate) fn from_recovery(
        name: String,
        path: PathBuf,
        bytes_written: u64,
        size_limit: u64,
        index: SegmentIndex,
    ) -> Self {
        Self {
            name,
            path,
            bytes_written,
            size_limit,
            index,
        }
    }

    /// Segment name (embeds the table name and creation timestamp)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the segment has reached its ceiling and refuses appends
    pub fn is_read_only(&self) -> bool {
        self.bytes_written >= self.size_limit
    }

    /// Total bytes appended so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Append a key/value record.
    ///
    /// Returns `Ok(false)` without touching anything when the segment is
    /// read-only; the caller must roll over to a fresh segment.
    pub fn write(&mut self, key: &[u8], value: &[u8]) -> Result<bool> {
        self.append(Record::Set {
            key: key.to_vec(),
            value: Bytes::copy_from_slice(value),
        })
    }

    /// Append a tombstone for a key. Same rollover contract as [`write`].
    ///
    /// [`write`]: Segment::write
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        self.append(Record::Remove { key: key.to_vec() })
    }

    /// Read the latest value for a key from this segment.
    ///
    /// Opens a fresh read handle, seeks to the indexed offset and decodes
    /// exactly one record. A tombstone reads as `None`; a key absent from the
    /// segment index is a true absence.
    pub fn read(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let offset = match self.index.get(key) {
            Some(offset) => offset,
            None => return Ok(None),
        };

        let file = File::open(&self.path)?;
        let file_len = file.metadata()?.len();
        if offset >= file_len {
            // Index and file have desynchronized; nothing can repair this.
            return Err(StrataError::InvariantViolation(format!(
                "segment {}: index offset {} past end of file ({} bytes)",
                self.name, offset, file_len
            )));
        }

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(offset))?;

        match Record::decode(&mut reader)? {
            Some(Record::Set { value, .. }) => Ok(Some(value)),
            Some(Record::Remove { .. }) => Ok(None),
            None => Err(StrataError::InvariantViolation(format!(
                "segment {}: no record at indexed offset {}",
                self.name, offset
            ))),
        }
    }

    /// Append one record, index it at the pre-write offset, advance the
    /// cursor, and flush durably before returning.
    fn append(&mut self, record: Record) -> Result<bool> {
        if self.is_read_only() {
            return Ok(false);
        }

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        record.encode(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;

        self.index.insert(record.key().to_vec(), self.bytes_written);
        self.bytes_written += record.encoded_size();

        Ok(true)
    }
}
