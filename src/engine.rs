//! Engine Module
//!
//! The storage engine entry point: recovers every database at startup, then
//! routes commands to databases, tables and segments.
//!
//! ## Concurrency Model: Single Execution Lane
//!
//! All operations that reach the storage engine, reads included, are
//! serialized through one dedicated worker thread. Callers submit a command
//! over a channel and block on a per-request reply channel acting as the
//! promise. Consequences:
//!
//! - Operations observe a total order equal to submission order; a read
//!   submitted after a write for the same key is guaranteed to observe it
//! - No locking is needed anywhere inside the engine: `Database`, `Table`
//!   and `Segment` methods assume they run without concurrent mutation
//! - A started operation runs to completion or failure; there is no
//!   mid-operation cancellation
//!
//! The cost is that every database in the server shares the one lane.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use bytes::Bytes;
use crossbeam::channel::{self, Sender};

use crate::config::Config;
use crate::error::{Result, StrataError};
use crate::protocol::Command;
use crate::storage::{recover_working_dir, Database, StoreOptions};

/// The synchronous storage engine core
pub struct Engine {
    config: Config,
    databases: HashMap<String, Database>,
}

impl Engine {
    /// Open the engine: run recovery over the working directory and stand up
    /// every database found there.
    pub fn open(config: Config) -> Result<Self> {
        let options = StoreOptions::from(&config);
        let databases = recover_working_dir(&config.working_dir, options)?;

        Ok(Self { config, databases })
    }

    /// Execute one command.
    ///
    /// `Set` answers with the previous value for the key (if any), `Delete`
    /// with the removed value, `Get` with the current value or `None`.
    pub fn execute(&mut self, command: Command) -> Result<Option<Bytes>> {
        match command {
            Command::CreateDatabase { database } => {
                self.create_database(&database)?;
                Ok(None)
            }
            Command::CreateTable { database, table } => {
                self.create_table(&database, &table)?;
                Ok(None)
            }
            Command::Get {
                database,
                table,
                key,
            } => self.get(&database, &table, key.as_bytes()),
            Command::Set {
                database,
                table,
                key,
                value,
            } => self.set(&database, &table, key.as_bytes(), &value),
            Command::Delete {
                database,
                table,
                key,
            } => self.delete(&database, &table, key.as_bytes()),
            Command::Ping => Ok(Some(Bytes::from_static(b"PONG"))),
        }
    }

    /// Create a database directory under the working dir
    pub fn create_database(&mut self, name: &str) -> Result<()> {
        if self.databases.contains_key(name) {
            return Err(StrataError::AlreadyExists(format!("database {}", name)));
        }

        let options = StoreOptions::from(&self.config);
        let database = Database::create(name, &self.config.working_dir, options)?;
        self.databases.insert(name.to_string(), database);

        tracing::info!(database = name, "database created");
        Ok(())
    }

    /// Create a table inside a database
    pub fn create_table(&mut self, db_name: &str, table_name: &str) -> Result<()> {
        self.database_mut(db_name)?.create_table(table_name)?;
        tracing::info!(database = db_name, table = table_name, "table created");
        Ok(())
    }

    /// Read the latest value for a key
    pub fn get(&mut self, db_name: &str, table: &str, key: &[u8]) -> Result<Option<Bytes>> {
        self.database_mut(db_name)?.read(table, key)
    }

    /// Write a value, answering with the previous value for the key
    pub fn set(
        &mut self,
        db_name: &str,
        table: &str,
        key: &[u8],
        value: &[u8],
    ) -> Result<Option<Bytes>> {
        let database = self.database_mut(db_name)?;
        let previous = database.read(table, key)?;
        database.write(table, key, Some(value))?;
        Ok(previous)
    }

    /// Delete a key, answering with the value it had
    pub fn delete(&mut self, db_name: &str, table: &str, key: &[u8]) -> Result<Option<Bytes>> {
        let database = self.database_mut(db_name)?;
        let removed = database.read(table, key)?;
        database.delete(table, key)?;
        Ok(removed)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// The configuration the engine was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Look up a recovered or created database
    pub fn database(&self, name: &str) -> Option<&Database> {
        self.databases.get(name)
    }

    /// Number of databases
    pub fn database_count(&self) -> usize {
        self.databases.len()
    }

    fn database_mut(&mut self, name: &str) -> Result<&mut Database> {
        self.databases
            .get_mut(name)
            .ok_or_else(|| StrataError::NotFound(format!("database {}", name)))
    }
}

// =============================================================================
// Submission queue + single worker
// =============================================================================

struct Request {
    command: Command,
    reply: Sender<Result<Option<Bytes>>>,
}

/// Joins the worker thread once the last handle is dropped
struct WorkerGuard {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.handle.lock() {
            if let Some(handle) = guard.take() {
                let _ = handle.join();
            }
        }
    }
}

/// Cloneable handle to an engine running on its own worker thread.
///
/// Commands submitted through any clone of the handle execute strictly
/// one-at-a-time in submission order. Dropping the last handle closes the
/// queue and joins the worker.
#[derive(Clone)]
pub struct EngineHandle {
    tx: Sender<Request>,
    _worker: Arc<WorkerGuard>,
}

impl EngineHandle {
    /// Move an engine onto a dedicated worker thread and return a handle
    pub fn spawn(mut engine: Engine) -> Self {
        let (tx, rx) = channel::unbounded::<Request>();

        let handle = std::thread::Builder::new()
            .name("stratakv-engine".to_string())
            .spawn(move || {
                while let Ok(request) = rx.recv() {
                    let result = engine.execute(request.command);
                    // The submitter may have given up waiting; that is not
                    // the worker's problem.
                    let _ = request.reply.send(result);
                }
                tracing::debug!("engine worker stopped");
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!("failed to spawn engine worker: {}", e);
                None
            }
        };

        Self {
            tx,
            _worker: Arc::new(WorkerGuard {
                handle: Mutex::new(handle),
            }),
        }
    }

    /// Submit a command and block until the worker has executed it
    pub fn submit(&self, command: Command) -> Result<Option<Bytes>> {
        let (reply_tx, reply_rx) = channel::bounded(1);
        self.tx
            .send(Request {
                command,
                reply: reply_tx,
            })
            .map_err(|_| StrataError::Storage("engine worker is gone".to_string()))?;

        reply_rx
            .recv()
            .map_err(|_| StrataError::Storage("engine worker dropped the request".to_string()))?
    }
}
