//! Error types for the event schema.

use super::{EventCategory, EventType};
use thiserror::Error;

/// Error returned while parsing an event type tag.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown event type: {0}")]
pub struct ParseEventTypeError(pub String);

/// A decoded event violates the schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventSchemaError {
    /// The payload category does not match the event type.
    #[error("event type {event_type} requires a {expected} payload, found {found}")]
    CategoryMismatch {
        /// The declared event type.
        event_type: EventType,
        /// The category the type requires.
        expected: EventCategory,
        /// The category of the supplied payload.
        found: EventCategory,
    },

    /// Versions start at 1.
    #[error("event version must be at least 1")]
    ZeroVersion,
}
