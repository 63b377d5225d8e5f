//! Event schema.
//!
//! Events carry a payload whose shape is fixed by the category of their
//! type tag. Consistency between the two is checked whenever an event is
//! built or decoded.

mod error;
mod event;
mod filter;
mod ids;
mod kind;
mod payload;

pub use error::{EventSchemaError, ParseEventTypeError};
pub use event::Event;
pub(crate) use event::EventParts;
pub use filter::EventFilter;
pub use ids::{CorrelationId, EventId, SubscriptionId};
pub use kind::{EventCategory, EventType};
pub use payload::{
    AgentPayload, CodePayload, CollaborationPayload, EventPayload, MessagePayload,
    SessionPayload, Severity, SystemPayload, TaskPayload,
};
