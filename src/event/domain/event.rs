//! The immutable event record.

use super::{CorrelationId, EventId, EventPayload, EventSchemaError, EventType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Immutable record of something that happened.
///
/// Events are built by [`crate::event::services::factory::EventFactory`] or
/// decoded from storage; decoding re-checks that the payload category
/// matches the type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord")]
pub struct Event {
    id: EventId,
    event_type: EventType,
    source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    timestamp: DateTime<Utc>,
    correlation_id: CorrelationId,
    version: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, Value>,
    payload: EventPayload,
}

/// Wire shape decoded before schema checks.
#[derive(Deserialize)]
struct EventRecord {
    id: EventId,
    event_type: EventType,
    source: String,
    #[serde(default)]
    target: Option<String>,
    timestamp: DateTime<Utc>,
    correlation_id: CorrelationId,
    version: u32,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
    payload: EventPayload,
}

impl TryFrom<EventRecord> for Event {
    type Error = EventSchemaError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let expected = record.event_type.category();
        let found = record.payload.category();
        if expected != found {
            return Err(EventSchemaError::CategoryMismatch {
                event_type: record.event_type,
                expected,
                found,
            });
        }
        if record.version == 0 {
            return Err(EventSchemaError::ZeroVersion);
        }
        Ok(Self {
            id: record.id,
            event_type: record.event_type,
            source: record.source,
            target: record.target,
            timestamp: record.timestamp,
            correlation_id: record.correlation_id,
            version: record.version,
            metadata: record.metadata,
            payload: record.payload,
        })
    }
}

/// Field values for [`Event::assemble`].
pub(crate) struct EventParts {
    pub(crate) id: EventId,
    pub(crate) event_type: EventType,
    pub(crate) source: String,
    pub(crate) target: Option<String>,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) correlation_id: CorrelationId,
    pub(crate) version: u32,
    pub(crate) metadata: BTreeMap<String, Value>,
    pub(crate) payload: EventPayload,
}

impl Event {
    /// Assembles an event from parts the caller has already validated.
    pub(crate) fn assemble(parts: EventParts) -> Self {
        let EventParts {
            id,
            event_type,
            source,
            target,
            timestamp,
            correlation_id,
            version,
            metadata,
            payload,
        } = parts;
        Self {
            id,
            event_type,
            source,
            target,
            timestamp,
            correlation_id,
            version,
            metadata,
            payload,
        }
    }

    /// Replaces the payload, keeping every other field.
    pub(crate) fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = payload;
        self
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Returns the type tag.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Returns the emitting component.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the intended recipient, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Returns when the event happened.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the causal chain identifier.
    #[must_use]
    pub const fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Returns the schema version, starting at 1.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns free-form metadata.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Returns the typed payload.
    #[must_use]
    pub const fn payload(&self) -> &EventPayload {
        &self.payload
    }
}
