//! # indexq-client
//!
//! Search backend boundary for the indexq queue.
//!
//! [`SearchClient`] is the contract the queue engine dispatches through.
//! The two failure classes are explicit in the type system: an
//! `Err(SearchUnreachable)` means the service itself is down (whole-call
//! outage, no partial information), while `Ok(rejections)` lists the
//! per-document subset the backend refused; everything not listed was
//! applied.
//!
//! [`HttpSearchClient`] is a JSON-over-HTTP reference implementation.

pub mod client;
pub mod http;

pub use client::{Rejection, SearchClient, SearchUnreachable};
pub use http::{HttpSearchClient, HttpSearchConfig};
