//! Event store adapters.
//!
//! - [`memory::InMemoryEventStore`] keeps the log in process memory.
//! - [`jsonl::JsonlEventStore`] appends one JSON document per line to a file.

mod index;
pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlEventStore;
pub use memory::InMemoryEventStore;
