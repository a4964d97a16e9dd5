//! Streaming RLOG frame decoder.
//!
//! The decoder is a state machine over a byte buffer: a one-byte revision
//! header (checked once per decoder instance), then timestamp-delimited
//! frames of key declarations and field updates. Decoder state — the
//! revision, the last valid timestamp and the key-ID table — persists
//! across `decode()` calls so a live stream can be fed chunk by chunk.
//!
//! Corrupted timestamps are recovered by rewinding the cursor seven bytes
//! and rescanning byte-by-byte for the next plausible frame boundary.
//! Truncated records abort the decode with a failure result, keeping all
//! writes applied so far.

use std::collections::HashMap;

use log::{debug, warn};

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::registry::Log;

pub const SUPPORTED_LOG_REVISION: u8 = 1;

/// Step size less than this many seconds indicates corrupted data.
const MIN_TIMESTAMP_STEP: f64 = 0.0001;
/// Step size greater than this many seconds indicates corrupted data.
const MAX_TIMESTAMP_STEP: f64 = 15.0;
/// One less than the timestamp width, so the resync scan advances one
/// byte per attempt.
const TIMESTAMP_REWIND: usize = 7;

const RECORD_TERMINATOR: u8 = 0;
const RECORD_KEY: u8 = 1;
const RECORD_FIELD: u8 = 2;

const VALUE_NULL: u8 = 0;
const VALUE_BOOLEAN: u8 = 1;
const VALUE_BOOLEAN_ARRAY: u8 = 2;
const VALUE_INTEGER: u8 = 3;
const VALUE_INTEGER_ARRAY: u8 = 4;
const VALUE_DOUBLE: u8 = 5;
const VALUE_DOUBLE_ARRAY: u8 = 6;
const VALUE_STRING: u8 = 7;
const VALUE_STRING_ARRAY: u8 = 8;
const VALUE_BYTE: u8 = 9;
const VALUE_BYTE_ARRAY: u8 = 10;

/// Decoder for the RLOG framed binary format.
#[derive(Debug, Default)]
pub struct RlogDecoder {
    revision: Option<u8>,
    last_timestamp: Option<f64>,
    last_timestamp_corrupted: Option<f64>,
    key_ids: HashMap<i16, String>,
}

impl RlogDecoder {
    pub fn new() -> Self {
        RlogDecoder::default()
    }

    /// Decodes one buffer into the registry.
    ///
    /// Returns `false` when the revision is unsupported or the buffer ends
    /// mid-record; everything written before the failure point is kept.
    pub fn decode(&mut self, log: &mut Log, data: &[u8]) -> bool {
        match self.run(log, data) {
            Ok(()) => true,
            Err(err) => {
                debug!("rlog decode failed: {err}");
                false
            }
        }
    }

    fn run(&mut self, log: &mut Log, data: &[u8]) -> Result<()> {
        let mut cursor = Cursor::new(data);

        if self.revision.is_none() {
            let revision = cursor.read_u8()?;
            if revision != SUPPORTED_LOG_REVISION {
                return Err(Error::UnsupportedRevision(revision));
            }
            self.revision = Some(revision);
        }
        // Every chunk carries one spare header byte before the frames.
        let _ = cursor.try_read_u8();

        'frames: while !cursor.is_empty() {
            let timestamp = cursor.read_f64()?;
            if let Some(last) = self.last_timestamp {
                let invalid = timestamp.is_nan()
                    || timestamp < last + MIN_TIMESTAMP_STEP
                    || timestamp > last + MAX_TIMESTAMP_STEP;
                if invalid {
                    if self.last_timestamp_corrupted != Some(last) {
                        warn!(
                            "corrupted log data skipped near {last:.2} seconds (byte {})",
                            cursor.position() - 8
                        );
                    }
                    self.last_timestamp_corrupted = Some(last);
                    cursor.rewind(TIMESTAMP_REWIND);
                    continue 'frames;
                }
            }
            self.last_timestamp = Some(timestamp);

            loop {
                // End of buffer between records is a clean finish.
                let Some(record) = cursor.try_read_u8() else {
                    break 'frames;
                };
                match record {
                    RECORD_TERMINATOR => break,
                    RECORD_KEY => {
                        let key_id = cursor.read_i16()?;
                        let length = cursor.read_u16()? as usize;
                        let key =
                            String::from_utf8_lossy(cursor.read_bytes(length)?).into_owned();
                        self.key_ids.insert(key_id, key);
                    }
                    RECORD_FIELD => {
                        let key_id = cursor.read_i16()?;
                        let key = self.key_ids.get(&key_id).cloned();
                        read_field_value(log, &mut cursor, key.as_deref(), timestamp)?;
                    }
                    _ => {
                        // Unknown record tag. The payload length is
                        // unknowable, so leave recovery to the timestamp
                        // gate on the next frame boundary.
                    }
                }
            }
        }
        Ok(())
    }
}

/// Reads one field-update payload and writes it to the registry.
///
/// The payload is always consumed, even when `key` is `None` (an update
/// referencing an undeclared key ID), so the cursor stays aligned.
fn read_field_value(
    log: &mut Log,
    cursor: &mut Cursor<'_>,
    key: Option<&str>,
    timestamp: f64,
) -> Result<()> {
    match cursor.read_u8()? {
        VALUE_NULL => {
            // Recognized but unsupported.
        }
        VALUE_BOOLEAN => {
            let value = cursor.read_u8()? != 0;
            if let Some(key) = key {
                log.put_boolean(key, timestamp, value);
            }
        }
        VALUE_BYTE => {
            let value = cursor.read_u8()?;
            if let Some(key) = key {
                log.put_raw(key, timestamp, vec![value]);
            }
        }
        VALUE_INTEGER => {
            let value = cursor.read_i32()?;
            if let Some(key) = key {
                log.put_number(key, timestamp, value as f64);
            }
        }
        VALUE_DOUBLE => {
            let value = cursor.read_f64()?;
            if let Some(key) = key {
                log.put_number(key, timestamp, value);
            }
        }
        VALUE_STRING => {
            let length = cursor.read_u16()? as usize;
            let value = String::from_utf8_lossy(cursor.read_bytes(length)?).into_owned();
            if let Some(key) = key {
                log.put_string(key, timestamp, value);
            }
        }
        VALUE_BOOLEAN_ARRAY => {
            let count = cursor.read_u16()? as usize;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(cursor.read_u8()? != 0);
            }
            if let Some(key) = key {
                log.put_boolean_array(key, timestamp, values);
            }
        }
        VALUE_BYTE_ARRAY => {
            let count = cursor.read_u16()? as usize;
            let values = cursor.read_bytes(count)?.to_vec();
            if let Some(key) = key {
                log.put_raw(key, timestamp, values);
            }
        }
        VALUE_INTEGER_ARRAY => {
            let count = cursor.read_u16()? as usize;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(cursor.read_i32()? as f64);
            }
            if let Some(key) = key {
                log.put_number_array(key, timestamp, values);
            }
        }
        VALUE_DOUBLE_ARRAY => {
            let count = cursor.read_u16()? as usize;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                values.push(cursor.read_f64()?);
            }
            if let Some(key) = key {
                log.put_number_array(key, timestamp, values);
            }
        }
        VALUE_STRING_ARRAY => {
            let count = cursor.read_u16()? as usize;
            let mut values = Vec::with_capacity(count);
            for _ in 0..count {
                let length = cursor.read_u16()? as usize;
                values.push(String::from_utf8_lossy(cursor.read_bytes(length)?).into_owned());
            }
            if let Some(key) = key {
                log.put_string_array(key, timestamp, values);
            }
        }
        _ => {
            // Unknown value tag with an unknowable payload size; skipped.
        }
    }
    Ok(())
}
