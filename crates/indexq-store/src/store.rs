//! Entry store trait.
//!
//! The persistence contract the queue engine requires. Claiming is a
//! read: `find_due` never marks entries, so a crashed worker leaks no
//! state and overlapping workers may claim the same entries (dispatch
//! is idempotent downstream).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexq_types::{EntryChange, EntryFailure, QueueEntry};

use crate::error::StoreError;

/// Durable storage for queue entries.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Entries with `run_at <= now`, ordered by priority descending
    /// (higher values first) then created_at ascending, up to `limit`.
    /// When `record_types` is given, only entries for those types are
    /// returned.
    async fn find_due(
        &self,
        limit: usize,
        record_types: Option<&[String]>,
    ) -> Result<Vec<QueueEntry>, StoreError>;

    /// Insert or coalesce a mutation for one record.
    ///
    /// At most one entry exists per (record_type, record_id). When an
    /// entry already exists, its operation, priority, and run_at are
    /// replaced; id, created_at, attempt_count, and last_error survive.
    /// Returns the stored entry.
    async fn upsert(&self, change: EntryChange) -> Result<QueueEntry, StoreError>;

    /// Record a failed attempt: increments attempt_count, sets last_error,
    /// and moves run_at to `next_run_at`, atomically. Unknown ids are a
    /// no-op (a concurrent worker already resolved the entry).
    async fn record_failure(
        &self,
        id: &str,
        failure: EntryFailure,
        next_run_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Remove an entry after confirmed success. Unknown ids are a no-op
    /// (duplicate claims may delete twice).
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Total entries currently queued, due or not.
    async fn pending_count(&self) -> Result<usize, StoreError>;
}

/// Sort due entries into claim order: priority descending, then
/// created_at ascending (older first), then id for a stable tiebreak.
pub(crate) fn sort_for_claim(entries: &mut [QueueEntry]) {
    entries.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}

/// Whether an entry passes the optional record-type filter.
pub(crate) fn matches_filter(entry: &QueueEntry, record_types: Option<&[String]>) -> bool {
    match record_types {
        Some(types) => types.iter().any(|t| t == &entry.record_type),
        None => true,
    }
}
