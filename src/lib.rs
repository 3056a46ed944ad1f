//! # StrataKV
//!
//! An embeddable log-structured key-value store:
//! - Databases contain tables, tables contain append-only segment files
//! - Per-segment and per-table in-memory indexes route every read
//! - Startup recovery rebuilds indexes by replaying segments in creation order
//! - Each table is fronted by a write-through LRU cache
//! - All storage operations run on a single execution lane (submission order)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │                  (Multiple Clients)                         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Engine Handle                              │
//! │         (Submission Queue / Single Worker)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!               ┌───────▼────────┐
//!               │    Database    │  routes by table name
//!               └───────┬────────┘
//!                       │
//!               ┌───────▼────────┐
//!               │  CachingTable  │  LRU in front of the table
//!               └───────┬────────┘
//!                       │
//!               ┌───────▼────────┐
//!               │   TableStore   │  table index + rollover
//!               └───────┬────────┘
//!                       │
//!               ┌───────▼────────┐
//!               │    Segment     │  append-only records
//!               └────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod cache;
pub mod engine;
pub mod network;
pub mod protocol;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::{Engine, EngineHandle};
pub use error::{Result, StrataError};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StrataKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
