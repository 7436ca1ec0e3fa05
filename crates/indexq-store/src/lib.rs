//! # indexq-store
//!
//! Entry Store implementations for the indexq queue.
//!
//! The [`EntryStore`] trait is the persistence contract the queue engine
//! requires: an ordered, filterable scan of due entries plus atomic
//! per-record coalescing writes. Any backend satisfying the contract is
//! interchangeable; this crate ships two:
//! - [`MemoryStore`]: HashMap-backed, for tests and embedded use
//! - [`RocksStore`]: RocksDB-backed, durable across restarts

pub mod column_families;
pub mod error;
pub mod keys;
pub mod memory;
pub mod rocks;
pub mod store;


pub use error::StoreError;
pub use memory::MemoryStore;
pub use rocks::RocksStore;
pub use store::EntryStore;
