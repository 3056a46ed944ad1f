//! Protocol Module
//!
//! Defines the framed binary wire protocol for client-server communication.
//!
//! ## Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: CREATE_DB    - Payload: db
//! - 0x02: CREATE_TABLE - Payload: db + table
//! - 0x03: GET          - Payload: db + table + key
//! - 0x04: SET          - Payload: db + table + key + value
//! - 0x05: DELETE       - Payload: db + table + key
//! - 0x06: PING         - Payload: empty
//!
//! String fields (db, table, key) are u32-length-prefixed UTF-8; the SET
//! value is whatever bytes remain after the key.
//!
//! ## Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: ERROR

mod codec;
mod command;
mod response;

pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use command::{Command, CommandType};
pub use response::{Response, Status};
