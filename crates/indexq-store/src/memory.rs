//! In-memory entry store.
//!
//! Backs tests and embedded single-process deployments. Coalescing is
//! atomic because every write path holds the table lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use ulid::Ulid;

use indexq_types::{EntryChange, EntryFailure, QueueEntry, RecordId};

use crate::error::StoreError;
use crate::store::{matches_filter, sort_for_claim, EntryStore};

type RecordKey = (String, RecordId);

#[derive(Debug, Default)]
struct Tables {
    by_record: HashMap<RecordKey, QueueEntry>,
    by_id: HashMap<String, RecordKey>,
}

/// HashMap-backed entry store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch an entry by id. Test and inspection helper; the engine
    /// works entirely through the trait.
    pub async fn get(&self, id: &str) -> Option<QueueEntry> {
        let tables = self.tables.read().await;
        let key = tables.by_id.get(id)?;
        tables.by_record.get(key).cloned()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn find_due(
        &self,
        limit: usize,
        record_types: Option<&[String]>,
    ) -> Result<Vec<QueueEntry>, StoreError> {
        let now = Utc::now();
        let tables = self.tables.read().await;

        let mut due: Vec<QueueEntry> = tables
            .by_record
            .values()
            .filter(|e| e.is_due(now) && matches_filter(e, record_types))
            .cloned()
            .collect();

        sort_for_claim(&mut due);
        due.truncate(limit);
        Ok(due)
    }

    async fn upsert(&self, change: EntryChange) -> Result<QueueEntry, StoreError> {
        let mut tables = self.tables.write().await;
        let key = (change.record_type.clone(), change.record_id.clone());

        let entry = match tables.by_record.get_mut(&key) {
            Some(existing) => {
                existing.operation = change.operation;
                existing.priority = change.priority;
                existing.run_at = change.run_at;
                existing.clone()
            }
            None => {
                let entry = QueueEntry {
                    id: Ulid::new().to_string(),
                    record_type: change.record_type,
                    record_id: change.record_id,
                    operation: change.operation,
                    priority: change.priority,
                    run_at: change.run_at,
                    attempt_count: 0,
                    last_error: None,
                    created_at: Utc::now(),
                };
                tables.by_id.insert(entry.id.clone(), key.clone());
                tables.by_record.insert(key, entry.clone());
                entry
            }
        };

        Ok(entry)
    }

    async fn record_failure(
        &self,
        id: &str,
        failure: EntryFailure,
        next_run_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let Some(key) = tables.by_id.get(id).cloned() else {
            return Ok(());
        };
        if let Some(entry) = tables.by_record.get_mut(&key) {
            entry.attempt_count += 1;
            entry.last_error = Some(failure);
            entry.run_at = next_run_at;
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(key) = tables.by_id.remove(id) {
            tables.by_record.remove(&key);
        }
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize, StoreError> {
        Ok(self.tables.read().await.by_record.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexq_types::Operation;

    #[tokio::test]
    async fn test_coalescing_preserves_identity() {
        let store = MemoryStore::new();

        let first = store
            .upsert(EntryChange::new("Post", 1, Operation::Index))
            .await
            .unwrap();
        let second = store
            .upsert(EntryChange::new("Post", 1, Operation::Delete).with_priority(5))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.operation, Operation::Delete);
        assert_eq!(second.priority, 5);
        assert_eq!(store.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_coalescing_keeps_attempt_history() {
        let store = MemoryStore::new();

        let entry = store
            .upsert(EntryChange::new("Post", 1, Operation::Index))
            .await
            .unwrap();
        store
            .record_failure(&entry.id, EntryFailure::new("boom"), Utc::now())
            .await
            .unwrap();

        let after = store
            .upsert(EntryChange::new("Post", 1, Operation::Index))
            .await
            .unwrap();
        assert_eq!(after.attempt_count, 1);
        assert_eq!(after.last_error.unwrap().message, "boom");
    }
}
