//! Startup recovery
//!
//! Rebuilds every in-memory index by replaying the on-disk segment files,
//! bottom-up: segments before tables before databases. Replay populates the
//! same index structures that live writes would have populated, without
//! re-executing the writes.
//!
//! Each recovery level is an immutable context struct holding what the level
//! above established; a level only ever adds information for the one below.
//!
//! Any failure (an unlistable directory, a truncated or corrupt trailing
//! record, an unexpected I/O error) aborts the whole startup. There is no
//! partial repair and no truncation of a corrupt segment.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};
use crate::storage::caching::CachingTable;
use crate::storage::database::Database;
use crate::storage::index::{SegmentIndex, TableIndex};
use crate::storage::record::Record;
use crate::storage::segment::{next_segment_name, parse_segment_timestamp, Segment};
use crate::storage::table::TableStore;
use crate::storage::StoreOptions;

/// Server-level context: the root everything lives under
struct ServerRecovery<'a> {
    working_dir: &'a Path,
    options: StoreOptions,
}

/// Database-level context: server context plus one database directory
struct DatabaseRecovery<'a> {
    server: &'a ServerRecovery<'a>,
    db_name: String,
    db_path: PathBuf,
}

/// Table-level context: database context plus one table directory
struct TableRecovery<'a> {
    database: &'a DatabaseRecovery<'a>,
    table_name: String,
    table_path: PathBuf,
}

/// Recover every database under the working directory.
///
/// Creates the working directory when absent; a working path that exists as
/// a plain file is fatal.
pub fn recover_working_dir(
    working_dir: &Path,
    options: StoreOptions,
) -> Result<HashMap<String, Database>> {
    if !working_dir.exists() {
        fs::create_dir_all(working_dir)?;
    } else if !working_dir.is_dir() {
        return Err(StrataError::Storage(format!(
            "working path {} exists but is not a directory",
            working_dir.display()
        )));
    }

    let server = ServerRecovery {
        working_dir,
        options,
    };

    let mut databases = HashMap::new();
    for entry in fs::read_dir(working_dir)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let db_name = dir_name(&entry.path())?;
        let database = DatabaseRecovery {
            server: &server,
            db_name: db_name.clone(),
            db_path: entry.path(),
        }
        .run()?;
        databases.insert(db_name, database);
    }

    tracing::info!(
        databases = databases.len(),
        working_dir = %working_dir.display(),
        "recovery complete"
    );

    Ok(databases)
}

impl DatabaseRecovery<'_> {
    /// Replay every table directory, then assemble the database
    fn run(self) -> Result<Database> {
        let mut tables = HashMap::new();

        for entry in fs::read_dir(&self.db_path)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let table_name = dir_name(&entry.path())?;
            let table = TableRecovery {
                database: &self,
                table_name: table_name.clone(),
                table_path: entry.path(),
            }
            .run()?;
            tables.insert(table_name, table);
        }

        tracing::debug!(database = %self.db_name, tables = tables.len(), "database recovered");

        Ok(Database::from_recovery(
            self.db_name,
            self.db_path,
            tables,
            self.server.options,
        ))
    }
}

impl TableRecovery<'_> {
    /// Replay every segment in creation order, then assemble the table with
    /// the last segment active.
    fn run(self) -> Result<CachingTable<TableStore>> {
        let options = self.database.server.options;

        // Sort segment files ascending by the timestamp embedded in the name;
        // that order is both the original write order and the required replay
        // order.
        let mut segment_files: Vec<(u64, String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.table_path)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let file_name = dir_name(&path)?;
            let timestamp = parse_segment_timestamp(&file_name).ok_or_else(|| {
                StrataError::Storage(format!(
                    "unexpected file in table directory: {}",
                    path.display()
                ))
            })?;
            segment_files.push((timestamp, file_name, path));
        }
        segment_files.sort_by_key(|(timestamp, _, _)| *timestamp);

        let mut table_index = TableIndex::new();
        let mut segments = Vec::with_capacity(segment_files.len());

        for (position, (_, file_name, path)) in segment_files.into_iter().enumerate() {
            let segment = replay_segment(
                &path,
                file_name,
                options.segment_size_limit,
                &mut table_index,
                position,
            )?;
            segments.push(segment);
        }

        // An empty table directory still needs an active segment to append to.
        if segments.is_empty() {
            segments.push(Segment::create(
                &next_segment_name(&self.table_name),
                &self.table_path,
                options.segment_size_limit,
            )?);
        }

        let store = TableStore::from_recovery(
            self.table_name,
            self.table_path,
            table_index,
            segments,
            options.segment_size_limit,
        )?;

        Ok(CachingTable::new(store, options.cache_capacity))
    }
}

/// Replay one segment file: scan it sequentially, rebuilding the segment
/// index (each key's latest offset), then route every key seen in this
/// segment to it in the table index.
///
/// Tombstoned keys are routed too, exactly as the live delete path routes
/// them. Replaying segments in creation order therefore converges the table
/// index to last-writer-wins globally, and a key whose latest record anywhere
/// is a tombstone resolves to that tombstone and reads as absent.
fn replay_segment(
    path: &Path,
    name: String,
    size_limit: u64,
    table_index: &mut TableIndex,
    position: usize,
) -> Result<Segment> {
    let file = File::open(path).map_err(|e| {
        StrataError::Storage(format!("cannot open segment {}: {}", path.display(), e))
    })?;
    let mut reader = BufReader::new(file);

    let mut index = SegmentIndex::new();
    let mut offset = 0u64;

    while let Some(record) = Record::decode(&mut reader).map_err(|e| match e {
        StrataError::CorruptStream(msg) => {
            StrataError::CorruptStream(format!("segment {}: {}", name, msg))
        }
        other => other,
    })? {
        let size = record.encoded_size();
        index.insert(record.key().to_vec(), offset);
        offset += size;
    }

    for key in index.keys() {
        table_index.insert(key.clone(), position);
    }

    tracing::trace!(
        segment = %name,
        keys = index.len(),
        bytes = offset,
        "segment replayed"
    );

    Ok(Segment::from_recovery(
        name,
        path.to_path_buf(),
        offset,
        size_limit,
        index,
    ))
}

/// Final path component as a UTF-8 string
fn dir_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            StrataError::Storage(format!("unusable path name: {}", path.display()))
        })
}
