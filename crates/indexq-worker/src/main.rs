//! indexq worker
//!
//! Drains the search-index queue against a shared entry store. Multiple
//! workers may run concurrently; no coordination is required.
//!
//! # Usage
//!
//! ```bash
//! indexq-worker run [--batch-size N] [--record-type TYPE]...
//! indexq-worker once
//! indexq-worker status
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/indexq/config.toml)
//! 3. Environment variables (INDEXQ_*)
//! 4. CLI flags

use std::path::Path;

use anyhow::Result;
use clap::Parser;

use indexq_types::QueueConfig;
use indexq_worker::{
    apply_overrides, handle_once, handle_run, handle_status, init_tracing, Cli, Commands,
    Overrides,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let mut config = QueueConfig::load(cli.config.as_deref().map(Path::new))?;

    match cli.command {
        Commands::Run {
            batch_size,
            record_types,
            db_path,
        } => {
            apply_overrides(
                &mut config,
                &Overrides {
                    batch_size,
                    record_types,
                    db_path,
                },
            );
            handle_run(config).await?;
        }
        Commands::Once {
            batch_size,
            record_types,
            db_path,
        } => {
            apply_overrides(
                &mut config,
                &Overrides {
                    batch_size,
                    record_types,
                    db_path,
                },
            );
            let code = handle_once(config).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Status { db_path } => {
            apply_overrides(
                &mut config,
                &Overrides {
                    db_path,
                    ..Default::default()
                },
            );
            handle_status(config).await?;
        }
    }

    Ok(())
}
