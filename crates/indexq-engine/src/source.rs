//! Document source trait.
//!
//! Workers hold only (record_type, record_id) pairs; the application
//! datastore renders the searchable document at dispatch time so the
//! index always receives the record's current state.

use async_trait::async_trait;
use thiserror::Error;

use indexq_types::{Document, DocumentRef};

/// The application datastore could not serve a load request.
///
/// Fatal to the current iteration, like the entry store: without the
/// datastore there is nothing meaningful to dispatch.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Renders index documents for claimed entries.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Build documents for the given refs.
    ///
    /// A ref whose record no longer exists maps to `None`; the engine
    /// turns those into deletes so the stale document is removed from
    /// the index.
    async fn load(
        &self,
        refs: &[DocumentRef],
    ) -> Result<Vec<(DocumentRef, Option<Document>)>, SourceError>;
}
