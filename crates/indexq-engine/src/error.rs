//! Error types for the queue engine.

use thiserror::Error;

use crate::source::SourceError;
use indexq_store::StoreError;

/// Errors that abort a `process()` iteration.
///
/// Per-entry failures never appear here; they are absorbed into store
/// mutations. An unreachable search backend is not an error either; it
/// surfaces as `ProcessOutcome::Outage` so the caller can pause without
/// inflating retry counters.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The entry store itself failed; fatal to the worker iteration
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The application datastore could not provide documents
    #[error("Document source error: {0}")]
    Source(#[from] SourceError),
}
