//! # indexq-engine
//!
//! The queue engine: claims due entries from an [`EntryStore`], batches
//! them into bulk search-backend calls, and applies per-entry retry
//! scheduling on failure.
//!
//! A single [`QueueEngine::process`] call handles one bounded batch and
//! returns; pacing, pausing on outages, and shutdown belong to the
//! calling worker loop. Multiple uncoordinated workers may run
//! `process` concurrently against one store: claims are reads, and
//! overlapping dispatch is safe because the backend applies operations
//! idempotently.
//!
//! [`EntryStore`]: indexq_store::EntryStore

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod retry;
pub mod source;

pub use dispatch::{BatchDispatcher, DispatchReport};
pub use engine::{ProcessOptions, ProcessOutcome, ProcessReport, QueueEngine};
pub use error::EngineError;
pub use retry::RetryPolicy;
pub use source::{DocumentSource, SourceError};
