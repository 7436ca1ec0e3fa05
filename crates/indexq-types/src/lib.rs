//! # indexq-types
//!
//! Shared domain types for the indexq search-index queue.
//!
//! This crate defines the core data structures used throughout the system:
//! - Queue entries: pending index/delete operations, one per record
//! - Documents: what crosses the search-client boundary
//! - Configuration: layered queue and worker settings
//!
//! ## Usage
//!
//! ```rust
//! use indexq_types::{EntryChange, Operation, RecordId};
//!
//! let change = EntryChange::new("Post", RecordId::from(42), Operation::Index);
//! assert_eq!(change.priority, indexq_types::DEFAULT_PRIORITY);
//! ```

pub mod config;
pub mod document;
pub mod entry;
pub mod error;

pub use config::QueueConfig;
pub use document::{Document, DocumentRef};
pub use entry::{
    EntryChange, EntryFailure, Operation, QueueEntry, RecordId, DEFAULT_PRIORITY,
};
pub use error::ConfigError;
