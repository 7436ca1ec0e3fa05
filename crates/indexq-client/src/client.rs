//! Search client trait and result types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use indexq_types::{Document, DocumentRef};

/// The indexing service itself cannot be reached.
///
/// Fatal to the current batch, not to individual entries: callers must
/// not apply per-entry backoff in response. Per-document problems never
/// surface here; they travel in the Ok side of a bulk call.
#[derive(Debug, Clone, Error)]
#[error("Search backend unreachable: {message}")]
pub struct SearchUnreachable {
    pub message: String,
}

impl SearchUnreachable {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A document the backend refused to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Identity of the rejected document
    pub doc: DocumentRef,

    /// Backend-provided reason
    pub message: String,

    /// Backend-provided trace, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl Rejection {
    pub fn new(doc: DocumentRef, message: impl Into<String>) -> Self {
        Self {
            doc,
            message: message.into(),
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }
}

/// Client for a remote search backend.
///
/// Bulk operations must be idempotent at the backend (last-write-wins
/// per document identity): uncoordinated workers may redeliver the same
/// operation and the second application must be a safe no-op.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Bulk add/update. Returns only the rejected subset; an empty list
    /// means every document was applied.
    async fn bulk_index(
        &self,
        documents: Vec<Document>,
    ) -> Result<Vec<Rejection>, SearchUnreachable>;

    /// Bulk delete by document identity. Returns only the rejected
    /// subset.
    async fn bulk_delete(
        &self,
        refs: Vec<DocumentRef>,
    ) -> Result<Vec<Rejection>, SearchUnreachable>;

    /// Read-side query pass-through. Reads never touch the queue.
    async fn query(
        &self,
        request: serde_json::Value,
    ) -> Result<serde_json::Value, SearchUnreachable>;
}
