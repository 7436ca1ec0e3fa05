//! Document types crossing the search-client boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entry::RecordId;

/// Identity of a document at the search backend.
///
/// The (record_type, record_id) pair is the document key; redelivering
/// an operation for the same ref must be a last-write-wins no-op there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub record_type: String,
    pub record_id: RecordId,
}

impl DocumentRef {
    pub fn new(record_type: impl Into<String>, record_id: impl Into<RecordId>) -> Self {
        Self {
            record_type: record_type.into(),
            record_id: record_id.into(),
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.record_type, self.record_id)
    }
}

/// A rendered search document ready for a bulk index call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identity at the backend
    pub id: DocumentRef,

    /// Searchable field payload
    pub fields: serde_json::Value,
}

impl Document {
    pub fn new(id: DocumentRef, fields: serde_json::Value) -> Self {
        Self { id, fields }
    }
}
