//! Record codec
//!
//! Binary layout of a single key/value (or tombstone) record. This module is
//! the single authority for the wire layout; nothing else in the crate knows
//! how a record is laid out on disk.
//!
//! ## Wire Format
//! ```text
//! ┌────────────┬───────────┬──────────────┬─────────────┐
//! │ KeyLen: i32│ Key bytes │ ValueLen: i32│ Value bytes │
//! └────────────┴───────────┴──────────────┴─────────────┘
//! ```
//! `ValueLen == -1` encodes a tombstone and the value bytes are omitted
//! entirely. Records are concatenated with no separators; a clean end-of-file
//! terminates the stream.

use std::io::{Read, Write};

use bytes::Bytes;

use crate::error::{Result, StrataError};

/// Sentinel value length marking a tombstone
const TOMBSTONE_LEN: i32 = -1;

/// A single storage record: a key/value pair or a deletion marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A live key/value pair
    Set { key: Vec<u8>, value: Bytes },

    /// A tombstone marking the key as deleted
    Remove { key: Vec<u8> },
}

impl Record {
    /// The key this record is about
    pub fn key(&self) -> &[u8] {
        match self {
            Record::Set { key, .. } => key,
            Record::Remove { key } => key,
        }
    }

    /// Whether this record carries a value (i.e. is not a tombstone)
    pub fn is_set(&self) -> bool {
        matches!(self, Record::Set { .. })
    }

    /// Encoded size in bytes: two i32 length fields plus key and value bytes
    /// (a tombstone contributes no value bytes).
    pub fn encoded_size(&self) -> u64 {
        let (key_len, value_len) = match self {
            Record::Set { key, value } => (key.len(), value.len()),
            Record::Remove { key } => (key.len(), 0),
        };
        8 + key_len as u64 + value_len as u64
    }

    /// Encode this record onto a byte stream
    pub fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Record::Set { key, value } => {
                writer.write_all(&(key.len() as i32).to_be_bytes())?;
                writer.write_all(key)?;
                writer.write_all(&(value.len() as i32).to_be_bytes())?;
                writer.write_all(value)?;
            }
            Record::Remove { key } => {
                writer.write_all(&(key.len() as i32).to_be_bytes())?;
                writer.write_all(key)?;
                writer.write_all(&TOMBSTONE_LEN.to_be_bytes())?;
            }
        }
        Ok(())
    }

    /// Decode the next record from a byte stream.
    ///
    /// Returns `Ok(None)` at a clean end-of-stream (zero bytes before the
    /// next record). A record cut off mid-way, or one whose declared lengths
    /// cannot be satisfied by the remaining bytes, is a `CorruptStream` error.
    /// Decoding a tombstone never allocates a value buffer.
    pub fn decode<R: Read>(reader: &mut R) -> Result<Option<Record>> {
        let key_len = match read_leading_i32(reader)? {
            Some(len) => len,
            None => return Ok(None), // end of stream
        };

        if key_len < 0 {
            return Err(StrataError::CorruptStream(format!(
                "negative key length: {}",
                key_len
            )));
        }

        let mut key = vec![0u8; key_len as usize];
        read_exact_or_corrupt(reader, &mut key, "key bytes")?;

        let mut len_buf = [0u8; 4];
        read_exact_or_corrupt(reader, &mut len_buf, "value length")?;
        let value_len = i32::from_be_bytes(len_buf);

        if value_len == TOMBSTONE_LEN {
            return Ok(Some(Record::Remove { key }));
        }
        if value_len < 0 {
            return Err(StrataError::CorruptStream(format!(
                "negative value length: {}",
                value_len
            )));
        }

        let mut value = vec![0u8; value_len as usize];
        read_exact_or_corrupt(reader, &mut value, "value bytes")?;

        Ok(Some(Record::Set {
            key,
            value: Bytes::from(value),
        }))
    }
}

/// Read the leading i32 of a record, distinguishing a clean end-of-stream
/// (no bytes at all) from a truncated length field.
fn read_leading_i32<R: Read>(reader: &mut R) -> Result<Option<i32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;

    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(StrataError::CorruptStream(format!(
                "stream ended inside key length ({} of 4 bytes)",
                filled
            )));
        }
        filled += n;
    }

    Ok(Some(i32::from_be_bytes(buf)))
}

fn read_exact_or_corrupt<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            StrataError::CorruptStream(format!("stream ended inside {}", what))
        } else {
            StrataError::Io(e)
        }
    })
}
