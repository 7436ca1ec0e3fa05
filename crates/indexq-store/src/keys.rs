//! Key encoding and decoding for the RocksDB entry store.
//!
//! Entries are keyed by their record identity so a coalescing upsert is
//! a single-key read-modify-write:
//!
//! Key format: `{record_type}\x00{tag}{record_id}`
//! - record_type: UTF-8 model name; must not contain NUL
//! - tag: `i` for integer ids, `s` for string ids
//! - record_id: decimal text for integers, raw UTF-8 for strings
//!
//! The tag keeps `RecordId::Int(1)` and `RecordId::Str("1")` distinct so
//! a record's primary key type round-trips exactly.

use indexq_types::RecordId;

use crate::error::StoreError;

const SEPARATOR: u8 = 0x00;
const TAG_INT: u8 = b'i';
const TAG_STR: u8 = b's';

/// Key identifying one record's queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey {
    pub record_type: String,
    pub record_id: RecordId,
}

impl RecordKey {
    pub fn new(record_type: impl Into<String>, record_id: RecordId) -> Self {
        Self {
            record_type: record_type.into(),
            record_id,
        }
    }

    /// Encode key to bytes for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        if self.record_type.as_bytes().contains(&SEPARATOR) {
            return Err(StoreError::Key(format!(
                "record_type must not contain NUL: {:?}",
                self.record_type
            )));
        }

        let mut bytes = Vec::with_capacity(self.record_type.len() + 16);
        bytes.extend_from_slice(self.record_type.as_bytes());
        bytes.push(SEPARATOR);
        match &self.record_id {
            RecordId::Int(id) => {
                bytes.push(TAG_INT);
                bytes.extend_from_slice(id.to_string().as_bytes());
            }
            RecordId::Str(id) => {
                bytes.push(TAG_STR);
                bytes.extend_from_slice(id.as_bytes());
            }
        }
        Ok(bytes)
    }

    /// Decode key from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        let sep = bytes
            .iter()
            .position(|b| *b == SEPARATOR)
            .ok_or_else(|| StoreError::Key("missing separator in record key".to_string()))?;

        let record_type = std::str::from_utf8(&bytes[..sep])
            .map_err(|e| StoreError::Key(format!("invalid UTF-8 in record_type: {}", e)))?
            .to_string();

        let rest = &bytes[sep + 1..];
        let (tag, id_bytes) = rest
            .split_first()
            .ok_or_else(|| StoreError::Key("missing record_id tag".to_string()))?;
        let id_text = std::str::from_utf8(id_bytes)
            .map_err(|e| StoreError::Key(format!("invalid UTF-8 in record_id: {}", e)))?;

        let record_id = match *tag {
            TAG_INT => RecordId::Int(
                id_text
                    .parse()
                    .map_err(|e| StoreError::Key(format!("invalid integer id: {}", e)))?,
            ),
            TAG_STR => RecordId::Str(id_text.to_string()),
            other => {
                return Err(StoreError::Key(format!(
                    "unknown record_id tag: {}",
                    other as char
                )))
            }
        };

        Ok(Self {
            record_type,
            record_id,
        })
    }
}
