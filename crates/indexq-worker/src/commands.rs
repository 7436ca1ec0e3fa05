//! Command handlers for the worker CLI.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use indexq_client::{HttpSearchClient, HttpSearchConfig};
use indexq_engine::{ProcessOptions, ProcessOutcome, QueueEngine, RetryPolicy};
use indexq_store::{EntryStore, RocksStore};
use indexq_types::QueueConfig;

use crate::runner::run_loop;
use crate::source::HttpDocumentSource;

/// Flag overrides shared by `run` and `once`.
#[derive(Debug, Default)]
pub struct Overrides {
    pub batch_size: Option<usize>,
    pub record_types: Vec<String>,
    pub db_path: Option<String>,
}

/// Apply CLI flags on top of the loaded configuration.
pub fn apply_overrides(config: &mut QueueConfig, overrides: &Overrides) {
    if let Some(batch_size) = overrides.batch_size {
        config.batch_size = batch_size;
    }
    if !overrides.record_types.is_empty() {
        config.record_types = overrides.record_types.clone();
    }
    if let Some(db_path) = &overrides.db_path {
        config.db_path = Some(PathBuf::from(db_path));
    }
}

fn resolve_db_path(config: &QueueConfig) -> Result<PathBuf> {
    config
        .db_path
        .clone()
        .or_else(QueueConfig::default_db_path)
        .ok_or_else(|| anyhow!("no entry store path configured; set db_path"))
}

type WorkerEngine = QueueEngine<RocksStore, HttpSearchClient, HttpDocumentSource>;

fn build_engine(config: &QueueConfig) -> Result<(Arc<RocksStore>, WorkerEngine)> {
    let db_path = resolve_db_path(config)?;
    let store = Arc::new(RocksStore::open(&db_path).context("opening entry store")?);

    let client = Arc::new(
        HttpSearchClient::new(HttpSearchConfig::new(config.search_url.clone()))
            .context("building search client")?,
    );
    let source = Arc::new(
        HttpDocumentSource::new(config.source_url.clone(), Duration::from_secs(30))
            .context("building document source")?,
    );

    let retry = RetryPolicy::from_config(config);
    let engine = QueueEngine::new(store.clone(), client, source, retry);
    Ok((store, engine))
}

/// Run the worker loop until a shutdown signal arrives.
pub async fn handle_run(config: QueueConfig) -> Result<()> {
    let (_store, engine) = build_engine(&config)?;
    let options = ProcessOptions::from_config(&config);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    run_loop(&engine, &options, &config, shutdown).await?;
    Ok(())
}

/// Process one batch. Returns the process exit code: 0 on completion,
/// 2 when the search backend was unreachable.
pub async fn handle_once(config: QueueConfig) -> Result<i32> {
    let (_store, engine) = build_engine(&config)?;
    let options = ProcessOptions::from_config(&config);

    match engine.process(&options).await? {
        ProcessOutcome::Completed(report) => {
            println!(
                "claimed {}, succeeded {}, rescheduled {}, dropped {}",
                report.claimed, report.succeeded, report.rescheduled, report.dropped
            );
            Ok(0)
        }
        ProcessOutcome::Outage { report, reason } => {
            println!(
                "search backend unreachable: {} ({} entries deferred)",
                reason, report.deferred
            );
            Ok(2)
        }
    }
}

/// Print queue status.
pub async fn handle_status(config: QueueConfig) -> Result<()> {
    let db_path = resolve_db_path(&config)?;
    let store = RocksStore::open(&db_path).context("opening entry store")?;
    let pending = store.pending_count().await?;

    println!("entry store:     {}", db_path.display());
    println!("pending entries: {}", pending);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let mut config = QueueConfig::default();
        let overrides = Overrides {
            batch_size: Some(25),
            record_types: vec!["Post".to_string()],
            db_path: Some("/tmp/queue".to_string()),
        };
        apply_overrides(&mut config, &overrides);

        assert_eq!(config.batch_size, 25);
        assert_eq!(config.record_types, vec!["Post"]);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/queue")));
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = QueueConfig {
            batch_size: 42,
            record_types: vec!["User".to_string()],
            ..Default::default()
        };
        apply_overrides(&mut config, &Overrides::default());

        assert_eq!(config.batch_size, 42);
        assert_eq!(config.record_types, vec!["User"]);
    }
}
