//! # indexq-session
//!
//! Application-facing adapter for the indexq queue.
//!
//! [`SessionProxy`] sits where the application would otherwise call the
//! search backend directly: writes (save/destroy of an indexed record)
//! become coalescing queue entries, reads pass straight through to the
//! search client. [`with_priority`] scopes a priority override to a unit
//! of async execution so batches of low- or high-urgency mutations can
//! be tagged without threading a parameter through every call site.

pub mod priority;
pub mod proxy;

pub use priority::{current_override, resolve_priority, with_priority};
pub use proxy::{Indexable, SessionProxy};
