//! Port definitions for the event subsystem.

pub mod store;
pub mod transform;

pub use store::{EventSequence, EventStore, EventStoreError, EventStoreResult};
pub use transform::{IdentityTransform, PayloadTransform, TransformError};
