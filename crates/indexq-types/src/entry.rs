//! Queue entry types.
//!
//! A `QueueEntry` records one pending index or delete operation for a
//! single application record. Entries are coalesced per record: a new
//! mutation for an already-queued record updates the existing entry in
//! place instead of adding a second row.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentRef;

/// Baseline priority assigned to entries created without an override.
///
/// Higher values are claimed first.
pub const DEFAULT_PRIORITY: i32 = 0;

/// What should happen to the record's search document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Add or update the record's document in the search index
    Index,
    /// Remove the record's document from the search index
    Delete,
}

/// Primary key of an application record.
///
/// Kept as either an integer or a string so that the key round-trips
/// exactly for whichever type the application uses. Serialized untagged:
/// `42` stays an integer, `"42"` stays a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Str(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Str(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::Str(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::Str(id)
    }
}

/// Failure detail recorded on an entry after a failed attempt.
///
/// Kept for diagnostics until the entry is deleted; later failures
/// overwrite it, success removes the whole entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFailure {
    /// Human-readable rejection or failure message
    pub message: String,

    /// Backend-provided trace, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl EntryFailure {
    /// Create a failure record with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: None,
        }
    }

    /// Attach a trace to the failure record.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }
}

/// One pending or retrying unit of index work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Store-assigned identifier, stable across coalescing updates
    pub id: String,

    /// Domain model the record belongs to
    pub record_type: String,

    /// Primary key of the record
    pub record_id: RecordId,

    /// Pending operation
    pub operation: Operation,

    /// Higher value = claimed earlier
    pub priority: i32,

    /// Entry is eligible for claiming once `run_at <= now`
    pub run_at: DateTime<Utc>,

    /// Failed attempts so far
    pub attempt_count: u32,

    /// Last recorded failure, kept until the entry is deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<EntryFailure>,

    /// Insertion time; secondary sort key within equal priority
    pub created_at: DateTime<Utc>,
}

impl QueueEntry {
    /// Identity of the record's document at the search backend.
    pub fn document_ref(&self) -> DocumentRef {
        DocumentRef::new(&self.record_type, self.record_id.clone())
    }

    /// Whether the entry is eligible for claiming at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.run_at <= now
    }

    /// Serialize to JSON bytes for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// A record mutation to fold into the queue.
///
/// Carries exactly the fields a coalescing upsert may change; everything
/// else on an existing entry (id, created_at, attempt history) survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChange {
    /// Domain model the record belongs to
    pub record_type: String,
    /// Primary key of the record
    pub record_id: RecordId,
    /// Operation replacing whatever was queued before
    pub operation: Operation,
    /// Priority for the entry after this change
    pub priority: i32,
    /// New eligibility time, normally the time of the mutation
    pub run_at: DateTime<Utc>,
}

impl EntryChange {
    /// Create a change at baseline priority, eligible immediately.
    pub fn new(
        record_type: impl Into<String>,
        record_id: impl Into<RecordId>,
        operation: Operation,
    ) -> Self {
        Self {
            record_type: record_type.into(),
            record_id: record_id.into(),
            operation,
            priority: DEFAULT_PRIORITY,
            run_at: Utc::now(),
        }
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the eligibility time.
    pub fn with_run_at(mut self, run_at: DateTime<Utc>) -> Self {
        self.run_at = run_at;
        self
    }
}
