//! Queue engine orchestration.
//!
//! `process` runs one claim-and-dispatch cycle: claim a bounded batch of
//! due entries in priority order, dispatch it, then settle each entry —
//! delete on success, reschedule with linear backoff on rejection, leave
//! untouched on outage. Because claims never write, an outage needs no
//! compensation: the claimed entries still carry their pre-claim run_at
//! and are immediately re-eligible.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use indexq_client::SearchClient;
use indexq_store::EntryStore;
use indexq_types::{Document, DocumentRef, Operation, QueueConfig, QueueEntry};

use crate::dispatch::BatchDispatcher;
use crate::error::EngineError;
use crate::retry::RetryPolicy;
use crate::source::DocumentSource;

/// Options for one `process` call.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Maximum entries claimed in this batch
    pub batch_size: usize,

    /// Restrict the claim to these record types; all types when `None`
    pub record_types: Option<Vec<String>>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            record_types: None,
        }
    }
}

impl ProcessOptions {
    /// Build options from queue configuration.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            record_types: if config.record_types.is_empty() {
                None
            } else {
                Some(config.record_types.clone())
            },
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_record_types(mut self, record_types: Vec<String>) -> Self {
        self.record_types = Some(record_types);
        self
    }
}

/// Counts for one `process` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Entries claimed from the store
    pub claimed: usize,
    /// Entries applied at the backend and removed from the queue
    pub succeeded: usize,
    /// Entries rejected and rescheduled with backoff
    pub rescheduled: usize,
    /// Entries skipped because the backend was unreachable
    pub deferred: usize,
    /// Entries abandoned by the max-attempts policy
    pub dropped: usize,
}

impl ProcessReport {
    /// Whether the claim found nothing to do.
    pub fn is_idle(&self) -> bool {
        self.claimed == 0
    }
}

/// Result of one `process` call.
///
/// The outage case is an explicit discriminant rather than an error so
/// that callers distinguish "pause and re-check" from "the iteration
/// failed": entry counters are intact either way, and the report covers
/// whatever was applied before the outage was detected.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// Batch fully handled, possibly with per-entry reschedules
    Completed(ProcessReport),

    /// The search backend was unreachable; deferred entries remain
    /// claimable with no backoff penalty
    Outage {
        report: ProcessReport,
        reason: String,
    },
}

/// The queue engine.
pub struct QueueEngine<S, C, D> {
    store: Arc<S>,
    dispatcher: BatchDispatcher<C>,
    source: Arc<D>,
    retry: RetryPolicy,
}

impl<S, C, D> QueueEngine<S, C, D>
where
    S: EntryStore,
    C: SearchClient,
    D: DocumentSource,
{
    pub fn new(store: Arc<S>, client: Arc<C>, source: Arc<D>, retry: RetryPolicy) -> Self {
        Self {
            store,
            dispatcher: BatchDispatcher::new(client),
            source,
            retry,
        }
    }

    /// Run one claim-and-dispatch cycle.
    ///
    /// Returns `Err` only when the entry store or document source fails;
    /// those are fatal to the worker iteration and propagate uncaught.
    pub async fn process(
        &self,
        options: &ProcessOptions,
    ) -> Result<ProcessOutcome, EngineError> {
        let due = self
            .store
            .find_due(options.batch_size, options.record_types.as_deref())
            .await?;

        if due.is_empty() {
            debug!("No due entries");
            return Ok(ProcessOutcome::Completed(ProcessReport::default()));
        }

        info!(count = due.len(), "Processing due entries");
        let mut report = ProcessReport {
            claimed: due.len(),
            ..Default::default()
        };

        let (index_group, mut delete_group) = self.partition(&due).await?;
        let by_id: HashMap<&str, &QueueEntry> =
            due.iter().map(|e| (e.id.as_str(), e)).collect();

        // Records that vanished since enqueue become deletes so the
        // stale document leaves the index
        let dispatch = {
            let mut index_docs = Vec::new();
            for (id, maybe_doc, doc_ref) in index_group {
                match maybe_doc {
                    Some(doc) => index_docs.push((id, doc)),
                    None => {
                        debug!(record = %doc_ref, "Record gone, converting to delete");
                        delete_group.push((id, doc_ref));
                    }
                }
            }
            self.dispatcher.dispatch(index_docs, delete_group).await
        };

        for id in &dispatch.succeeded {
            self.store.delete(id).await?;
            report.succeeded += 1;
        }

        let now = Utc::now();
        for (id, failure) in dispatch.rejected {
            let Some(entry) = by_id.get(id.as_str()) else {
                continue;
            };
            let attempt_count = entry.attempt_count + 1;

            if self.retry.exhausted(attempt_count) {
                error!(
                    entry = %id,
                    record = %entry.document_ref(),
                    attempt_count = attempt_count,
                    error = %failure.message,
                    "Entry exceeded max attempts, dropping"
                );
                self.store.delete(&id).await?;
                report.dropped += 1;
            } else {
                let next_run_at = self.retry.next_run_at(now, attempt_count);
                debug!(
                    entry = %id,
                    attempt_count = attempt_count,
                    next_run_at = %next_run_at,
                    error = %failure.message,
                    "Rescheduling rejected entry"
                );
                self.store.record_failure(&id, failure, next_run_at).await?;
                report.rescheduled += 1;
            }
        }

        report.deferred = dispatch.deferred.len();

        match dispatch.outage {
            Some(reason) => {
                info!(
                    deferred = report.deferred,
                    succeeded = report.succeeded,
                    "Search backend unreachable, deferring remainder"
                );
                Ok(ProcessOutcome::Outage { report, reason })
            }
            None => {
                info!(
                    succeeded = report.succeeded,
                    rescheduled = report.rescheduled,
                    dropped = report.dropped,
                    "Batch complete"
                );
                Ok(ProcessOutcome::Completed(report))
            }
        }
    }

    /// Split the claim into index and delete groups, resolving index
    /// documents through the source.
    #[allow(clippy::type_complexity)]
    async fn partition(
        &self,
        due: &[QueueEntry],
    ) -> Result<
        (
            Vec<(String, Option<Document>, DocumentRef)>,
            Vec<(String, DocumentRef)>,
        ),
        EngineError,
    > {
        let mut index_entries = Vec::new();
        let mut delete_group = Vec::new();

        for entry in due {
            match entry.operation {
                Operation::Index => index_entries.push(entry),
                Operation::Delete => {
                    delete_group.push((entry.id.clone(), entry.document_ref()))
                }
            }
        }

        let mut index_group = Vec::new();
        if !index_entries.is_empty() {
            let refs: Vec<DocumentRef> =
                index_entries.iter().map(|e| e.document_ref()).collect();
            let loaded = self.source.load(&refs).await?;

            let id_by_ref: HashMap<DocumentRef, String> = index_entries
                .iter()
                .map(|e| (e.document_ref(), e.id.clone()))
                .collect();

            for (doc_ref, maybe_doc) in loaded {
                match id_by_ref.get(&doc_ref) {
                    Some(id) => index_group.push((id.clone(), maybe_doc, doc_ref)),
                    None => {
                        debug!(record = %doc_ref, "Source returned ref not in this claim")
                    }
                }
            }
        }

        Ok((index_group, delete_group))
    }
}
