//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol. See the module doc
//! of [`crate::protocol`] for the frame layout.

use std::io::{Read, Write};

use crate::error::{Result, StrataError};

use super::{Command, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let cmd_type = command.command_type() as u8;

    let mut payload = Vec::new();
    match command {
        Command::CreateDatabase { database } => {
            put_field(&mut payload, database.as_bytes());
        }
        Command::CreateTable { database, table } => {
            put_field(&mut payload, database.as_bytes());
            put_field(&mut payload, table.as_bytes());
        }
        Command::Get {
            database,
            table,
            key,
        }
        | Command::Delete {
            database,
            table,
            key,
        } => {
            put_field(&mut payload, database.as_bytes());
            put_field(&mut payload, table.as_bytes());
            put_field(&mut payload, key.as_bytes());
        }
        Command::Set {
            database,
            table,
            key,
            value,
        } => {
            put_field(&mut payload, database.as_bytes());
            put_field(&mut payload, table.as_bytes());
            put_field(&mut payload, key.as_bytes());
            payload.extend_from_slice(value);
        }
        Command::Ping => {}
    }

    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(cmd_type);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(&payload);

    message
}

/// Decode a command from a complete message (header + payload)
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (tag, payload) = split_frame(bytes, "command")?;
    let mut cursor = payload;

    let command = match tag {
        0x01 => Command::CreateDatabase {
            database: take_string(&mut cursor, "database")?,
        },
        0x02 => Command::CreateTable {
            database: take_string(&mut cursor, "database")?,
            table: take_string(&mut cursor, "table")?,
        },
        0x03 => Command::Get {
            database: take_string(&mut cursor, "database")?,
            table: take_string(&mut cursor, "table")?,
            key: take_string(&mut cursor, "key")?,
        },
        0x04 => Command::Set {
            database: take_string(&mut cursor, "database")?,
            table: take_string(&mut cursor, "table")?,
            key: take_string(&mut cursor, "key")?,
            value: cursor.to_vec(),
        },
        0x05 => Command::Delete {
            database: take_string(&mut cursor, "database")?,
            table: take_string(&mut cursor, "table")?,
            key: take_string(&mut cursor, "key")?,
        },
        0x06 => {
            if !cursor.is_empty() {
                return Err(StrataError::Protocol(format!(
                    "PING command: unexpected payload of {} bytes",
                    cursor.len()
                )));
            }
            Command::Ping
        }
        _ => {
            return Err(StrataError::Protocol(format!(
                "Unknown command type: 0x{:02x}",
                tag
            )))
        }
    };

    // SET legitimately consumes the rest of the payload as its value.
    if !matches!(command, Command::Set { .. } | Command::Ping) && !cursor.is_empty() {
        return Err(StrataError::Protocol(format!(
            "{} trailing bytes after command payload",
            cursor.len()
        )));
    }

    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);

    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(response.status as u8);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);

    message
}

/// Decode a response from a complete message (header + payload)
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::NotFound,
        0x02 => Status::Error,
        _ => {
            return Err(StrataError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader)?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader)?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Append a u32-length-prefixed field
fn put_field(payload: &mut Vec<u8>, bytes: &[u8]) {
    payload.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    payload.extend_from_slice(bytes);
}

/// Consume a u32-length-prefixed field from the cursor
fn take_field<'a>(cursor: &mut &'a [u8], what: &str) -> Result<&'a [u8]> {
    if cursor.len() < 4 {
        return Err(StrataError::Protocol(format!("missing {} length", what)));
    }
    let len = u32::from_be_bytes([cursor[0], cursor[1], cursor[2], cursor[3]]) as usize;
    let rest = &cursor[4..];

    if rest.len() < len {
        return Err(StrataError::Protocol(format!(
            "incomplete {} (expected {}, got {})",
            what,
            len,
            rest.len()
        )));
    }

    let (field, remaining) = rest.split_at(len);
    *cursor = remaining;
    Ok(field)
}

/// Consume a length-prefixed UTF-8 string field
fn take_string(cursor: &mut &[u8], what: &str) -> Result<String> {
    let field = take_field(cursor, what)?;
    String::from_utf8(field.to_vec())
        .map_err(|_| StrataError::Protocol(format!("{} is not valid UTF-8", what)))
}

/// Validate the frame header of a complete message, returning tag + payload
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(StrataError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let tag = bytes[0];
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(StrataError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(StrataError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[HEADER_SIZE..total_len]))
}

/// Read one complete frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(StrataError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}
