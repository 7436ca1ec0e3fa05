//! Session proxy.
//!
//! Intercepts save/destroy of indexed records and turns them into
//! coalescing queue entries; read queries pass straight through to the
//! search client with no queueing.

use std::sync::Arc;

use tracing::debug;

use indexq_client::{SearchClient, SearchUnreachable};
use indexq_store::{EntryStore, StoreError};
use indexq_types::{
    Document, EntryChange, Operation, QueueEntry, RecordId, DEFAULT_PRIORITY,
};

use crate::priority::resolve_priority;

/// A record that can be mirrored into the search index.
///
/// Applications implement this once per indexed model.
pub trait Indexable {
    /// Stable name of the record's model.
    fn record_type(&self) -> &str;

    /// Primary key, preserved exactly (integer keys stay integers).
    fn record_id(&self) -> RecordId;

    /// Render the searchable document for the record's current state.
    fn to_document(&self) -> Document;
}

/// Application-facing adapter: queued writes, pass-through reads.
pub struct SessionProxy<S, C> {
    store: Arc<S>,
    client: Arc<C>,
    default_priority: i32,
}

impl<S, C> SessionProxy<S, C>
where
    S: EntryStore,
    C: SearchClient,
{
    pub fn new(store: Arc<S>, client: Arc<C>) -> Self {
        Self {
            store,
            client,
            default_priority: DEFAULT_PRIORITY,
        }
    }

    /// Change the baseline priority used when no override is active.
    pub fn with_default_priority(mut self, priority: i32) -> Self {
        self.default_priority = priority;
        self
    }

    /// Queue an index update for the record instead of writing through.
    pub async fn save<R: Indexable>(&self, record: &R) -> Result<QueueEntry, StoreError> {
        self.enqueue(record.record_type(), record.record_id(), Operation::Index)
            .await
    }

    /// Queue removal of the record's search document.
    pub async fn destroy<R: Indexable>(&self, record: &R) -> Result<QueueEntry, StoreError> {
        self.enqueue(record.record_type(), record.record_id(), Operation::Delete)
            .await
    }

    /// Read-side pass-through. Queries never touch the queue and see
    /// whatever the index currently holds.
    pub async fn query(
        &self,
        request: serde_json::Value,
    ) -> Result<serde_json::Value, SearchUnreachable> {
        self.client.query(request).await
    }

    async fn enqueue(
        &self,
        record_type: &str,
        record_id: RecordId,
        operation: Operation,
    ) -> Result<QueueEntry, StoreError> {
        let priority = resolve_priority(None, self.default_priority);
        let change =
            EntryChange::new(record_type, record_id, operation).with_priority(priority);

        debug!(
            record = %change.record_id,
            record_type = record_type,
            operation = ?operation,
            priority = priority,
            "Queueing index mutation"
        );
        self.store.upsert(change).await
    }
}
