//! RocksDB-backed entry store.
//!
//! Durable store for production deployments. Coalescing upserts and
//! failure updates are read-modify-write sequences serialized by a
//! single writer lock; the claim scan takes no lock at all (claims are
//! reads, overlap between workers is tolerated by design).

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use tokio::sync::Mutex;
use tracing::{debug, info};
use ulid::Ulid;

use indexq_types::{EntryChange, EntryFailure, QueueEntry};

use crate::column_families::{build_cf_descriptors, CF_ENTRIES, CF_ENTRY_IDS};
use crate::error::StoreError;
use crate::keys::RecordKey;
use crate::store::{matches_filter, sort_for_claim, EntryStore};

/// RocksDB entry store.
pub struct RocksStore {
    db: DB,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open the store at the given path, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        info!("Opening entry store at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn entries_cf(&self) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(CF_ENTRIES)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(CF_ENTRIES.to_string()))
    }

    fn ids_cf(&self) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(CF_ENTRY_IDS)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(CF_ENTRY_IDS.to_string()))
    }

    /// Look up the record key bytes for an entry id, if the entry exists.
    fn record_key_for_id(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let ids_cf = self.ids_cf()?;
        Ok(self.db.get_cf(&ids_cf, id.as_bytes())?)
    }

    fn get_entry(&self, key_bytes: &[u8]) -> Result<Option<QueueEntry>, StoreError> {
        let entries_cf = self.entries_cf()?;
        match self.db.get_cf(&entries_cf, key_bytes)? {
            Some(bytes) => Ok(Some(
                QueueEntry::from_bytes(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl EntryStore for RocksStore {
    async fn find_due(
        &self,
        limit: usize,
        record_types: Option<&[String]>,
    ) -> Result<Vec<QueueEntry>, StoreError> {
        let now = Utc::now();
        let entries_cf = self.entries_cf()?;

        let mut due = Vec::new();
        let iter = self.db.iterator_cf(&entries_cf, IteratorMode::Start);
        for item in iter {
            let (_, value) = item?;
            let entry = QueueEntry::from_bytes(&value)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            if entry.is_due(now) && matches_filter(&entry, record_types) {
                due.push(entry);
            }
        }

        sort_for_claim(&mut due);
        due.truncate(limit);
        Ok(due)
    }

    async fn upsert(&self, change: EntryChange) -> Result<QueueEntry, StoreError> {
        let _guard = self.write_lock.lock().await;

        let key = RecordKey::new(change.record_type.clone(), change.record_id.clone());
        let key_bytes = key.to_bytes()?;

        let entry = match self.get_entry(&key_bytes)? {
            Some(mut existing) => {
                existing.operation = change.operation;
                existing.priority = change.priority;
                existing.run_at = change.run_at;
                existing
            }
            None => QueueEntry {
                id: Ulid::new().to_string(),
                record_type: change.record_type,
                record_id: change.record_id,
                operation: change.operation,
                priority: change.priority,
                run_at: change.run_at,
                attempt_count: 0,
                last_error: None,
                created_at: Utc::now(),
            },
        };

        let entries_cf = self.entries_cf()?;
        let ids_cf = self.ids_cf()?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &entries_cf,
            &key_bytes,
            entry.to_bytes().map_err(|e| StoreError::Serialization(e.to_string()))?,
        );
        batch.put_cf(&ids_cf, entry.id.as_bytes(), &key_bytes);
        self.db.write(batch)?;

        debug!(entry = %entry.id, record = %entry.document_ref(), "Upserted queue entry");
        Ok(entry)
    }

    async fn record_failure(
        &self,
        id: &str,
        failure: EntryFailure,
        next_run_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let Some(key_bytes) = self.record_key_for_id(id)? else {
            debug!(entry = %id, "Failure for unknown entry, already resolved");
            return Ok(());
        };
        let Some(mut entry) = self.get_entry(&key_bytes)? else {
            return Ok(());
        };

        entry.attempt_count += 1;
        entry.last_error = Some(failure);
        entry.run_at = next_run_at;

        let entries_cf = self.entries_cf()?;
        self.db.put_cf(
            &entries_cf,
            &key_bytes,
            entry.to_bytes().map_err(|e| StoreError::Serialization(e.to_string()))?,
        )?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let Some(key_bytes) = self.record_key_for_id(id)? else {
            return Ok(());
        };

        let entries_cf = self.entries_cf()?;
        let ids_cf = self.ids_cf()?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&entries_cf, &key_bytes);
        batch.delete_cf(&ids_cf, id.as_bytes());
        self.db.write(batch)?;
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize, StoreError> {
        let entries_cf = self.entries_cf()?;
        let mut count = 0;
        for item in self.db.iterator_cf(&entries_cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}
