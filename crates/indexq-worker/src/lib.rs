//! # indexq-worker
//!
//! Worker binary for the indexq queue: claims due entries from the
//! durable store and drains them into the search backend, pausing on
//! outages and sleeping between idle polls. The loop is also exposed as
//! a library ([`run_loop`]) for embedding in other scheduling wrappers.

pub mod cli;
pub mod commands;
pub mod runner;
pub mod source;

pub use cli::{Cli, Commands};
pub use commands::{apply_overrides, handle_once, handle_run, handle_status, Overrides};
pub use runner::run_loop;
pub use source::HttpDocumentSource;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the binary.
///
/// An explicit level wins over RUST_LOG; the default is `info`.
pub fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
