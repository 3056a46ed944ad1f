//! Engine test suite
//!
//! Covers database/table lifecycle, read/write/delete semantics, recovery on
//! reopen, and the single-lane engine handle.

mod engine_tests;
