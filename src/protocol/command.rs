//! Command definitions
//!
//! Represents commands from clients. Every data command names the database
//! and table it targets; the engine does the routing.

/// Command tags on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    CreateDatabase = 0x01,
    CreateTable = 0x02,
    Get = 0x03,
    Set = 0x04,
    Delete = 0x05,
    Ping = 0x06,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a database
    CreateDatabase { database: String },

    /// Create a table inside a database
    CreateTable { database: String, table: String },

    /// Get a value by key
    Get {
        database: String,
        table: String,
        key: String,
    },

    /// Set a key to a value (answers with the previous value)
    Set {
        database: String,
        table: String,
        key: String,
        value: Vec<u8>,
    },

    /// Delete a key (answers with the removed value)
    Delete {
        database: String,
        table: String,
        key: String,
    },

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::CreateDatabase { .. } => CommandType::CreateDatabase,
            Command::CreateTable { .. } => CommandType::CreateTable,
            Command::Get { .. } => CommandType::Get,
            Command::Set { .. } => CommandType::Set,
            Command::Delete { .. } => CommandType::Delete,
            Command::Ping => CommandType::Ping,
        }
    }
}
