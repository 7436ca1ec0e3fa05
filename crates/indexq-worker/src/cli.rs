//! CLI argument parsing for the indexq worker.
//!
//! CLI flags override config file and environment values.

use clap::{Parser, Subcommand};

/// indexq worker
///
/// Drains the search-index queue: claims due entries, batches them into
/// bulk search-backend calls, and reschedules failures with backoff.
#[derive(Parser, Debug)]
#[command(name = "indexq-worker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/indexq/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Worker commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the worker loop until interrupted
    Run {
        /// Maximum entries claimed per batch
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Restrict processing to these record types (repeatable)
        #[arg(short = 't', long = "record-type")]
        record_types: Vec<String>,

        /// Override entry store path
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Process a single batch and exit
    ///
    /// Exit code 0 when the batch completed, 2 when the search backend
    /// was unreachable.
    Once {
        /// Maximum entries claimed for the batch
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Restrict processing to these record types (repeatable)
        #[arg(short = 't', long = "record-type")]
        record_types: Vec<String>,

        /// Override entry store path
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Show queue status
    Status {
        /// Override entry store path
        #[arg(long)]
        db_path: Option<String>,
    },
}
