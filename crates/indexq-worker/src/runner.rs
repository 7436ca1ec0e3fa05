//! Worker loop.
//!
//! Repeatedly invokes `QueueEngine::process`, distinguishing an outage
//! (long pause, no backoff applied to entries) from an idle tick (short
//! sleep). Cancellation is cooperative: the token is honored between
//! batches, an in-flight batch is never interrupted.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use indexq_client::SearchClient;
use indexq_engine::{
    DocumentSource, EngineError, ProcessOptions, ProcessOutcome, QueueEngine,
};
use indexq_store::EntryStore;
use indexq_types::QueueConfig;

/// Run the worker loop until the token is cancelled.
///
/// Returns `Err` when the entry store or document source fails; such
/// failures are fatal to the worker and propagate uncaught.
pub async fn run_loop<S, C, D>(
    engine: &QueueEngine<S, C, D>,
    options: &ProcessOptions,
    config: &QueueConfig,
    shutdown: CancellationToken,
) -> Result<(), EngineError>
where
    S: EntryStore,
    C: SearchClient,
    D: DocumentSource,
{
    info!(
        batch_size = options.batch_size,
        idle_delay_secs = config.idle_delay_secs,
        outage_delay_secs = config.outage_delay_secs,
        "Worker loop started"
    );

    while !shutdown.is_cancelled() {
        match engine.process(options).await? {
            ProcessOutcome::Outage { report, reason } => {
                warn!(
                    reason = %reason,
                    deferred = report.deferred,
                    pause_secs = config.outage_delay_secs,
                    "Search backend unreachable, pausing"
                );
                sleep_or_cancel(config.outage_delay(), &shutdown).await;
            }
            ProcessOutcome::Completed(report) if report.is_idle() => {
                sleep_or_cancel(config.idle_delay(), &shutdown).await;
            }
            ProcessOutcome::Completed(_) => {
                // Entries were waiting; poll again immediately
            }
        }
    }

    info!("Worker loop stopped");
    Ok(())
}

/// Sleep for `delay`, waking early on cancellation.
async fn sleep_or_cancel(delay: Duration, shutdown: &CancellationToken) {
    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = tokio::time::sleep(delay) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use indexq_client::{Rejection, SearchUnreachable};
    use indexq_store::MemoryStore;
    use indexq_types::{Document, DocumentRef, EntryChange, Operation};
    use indexq_engine::{RetryPolicy, SourceError};
    use serde_json::json;
    use std::sync::Arc;

    struct EmptySource;

    #[async_trait]
    impl DocumentSource for EmptySource {
        async fn load(
            &self,
            refs: &[DocumentRef],
        ) -> Result<Vec<(DocumentRef, Option<Document>)>, SourceError> {
            Ok(refs
                .iter()
                .map(|r| (r.clone(), Some(Document::new(r.clone(), json!({})))))
                .collect())
        }
    }

    struct OkClient;

    #[async_trait]
    impl SearchClient for OkClient {
        async fn bulk_index(
            &self,
            _documents: Vec<Document>,
        ) -> Result<Vec<Rejection>, SearchUnreachable> {
            Ok(Vec::new())
        }

        async fn bulk_delete(
            &self,
            _refs: Vec<DocumentRef>,
        ) -> Result<Vec<Rejection>, SearchUnreachable> {
            Ok(Vec::new())
        }

        async fn query(
            &self,
            _request: serde_json::Value,
        ) -> Result<serde_json::Value, SearchUnreachable> {
            Ok(json!({}))
        }
    }

    #[tokio::test]
    async fn test_loop_drains_queue_and_stops_on_cancel() {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert(EntryChange::new("Post", 1, Operation::Index))
            .await
            .unwrap();

        let engine = QueueEngine::new(
            store.clone(),
            Arc::new(OkClient),
            Arc::new(EmptySource),
            RetryPolicy::default(),
        );
        let config = QueueConfig {
            idle_delay_secs: 1,
            ..Default::default()
        };
        let shutdown = CancellationToken::new();

        let canceller = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        run_loop(&engine, &ProcessOptions::default(), &config, shutdown)
            .await
            .unwrap();

        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_immediately() {
        let store = Arc::new(MemoryStore::new());
        let engine = QueueEngine::new(
            store,
            Arc::new(OkClient),
            Arc::new(EmptySource),
            RetryPolicy::default(),
        );
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        run_loop(
            &engine,
            &ProcessOptions::default(),
            &QueueConfig::default(),
            shutdown,
        )
        .await
        .unwrap();
    }
}
