//! Event store port.
//!
//! Defines the append-only log contract shared by the in-memory and
//! JSON-lines adapters.

use crate::event::domain::{CorrelationId, Event, EventFilter, EventId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for event store operations.
pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// Errors raised by event store adapters.
#[derive(Debug, Clone, Error)]
pub enum EventStoreError {
    /// An event with this identifier is already stored.
    #[error("duplicate event: {0}")]
    DuplicateEvent(EventId),

    /// The persisted log could not be decoded.
    #[error("corrupted event log at line {line}: {reason}")]
    Corrupted {
        /// One-based line number of the first bad record.
        line: usize,
        /// Decoder message.
        reason: String,
    },

    /// The storage medium rejected an operation.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl EventStoreError {
    /// Wraps an infrastructure error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Reports a poisoned lock guarding adapter state.
    #[must_use]
    pub fn poisoned(context: &str) -> Self {
        Self::persistence(std::io::Error::other(format!("{context} lock poisoned")))
    }
}

/// Lazy, finite, restartable sequence of events matching a filter.
///
/// The sequence iterates over a snapshot taken when the query ran, so later
/// appends or deletions never change what it yields. Cloning a sequence
/// shares the snapshot.
#[derive(Debug, Clone)]
pub struct EventSequence {
    snapshot: Arc<[Arc<Event>]>,
    filter: Arc<EventFilter>,
    cursor: usize,
    skipped: usize,
    yielded: usize,
}

impl EventSequence {
    /// Wraps an ordered snapshot.
    ///
    /// `snapshot` must already be in timestamp order with ties in insertion
    /// order.
    #[must_use]
    pub fn new(snapshot: impl Into<Arc<[Arc<Event>]>>, filter: EventFilter) -> Self {
        Self {
            snapshot: snapshot.into(),
            filter: Arc::new(filter),
            cursor: 0,
            skipped: 0,
            yielded: 0,
        }
    }

    /// Returns a sequence that yields nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), EventFilter::new())
    }

    /// Rewinds the sequence to its first match.
    pub const fn restart(&mut self) {
        self.cursor = 0;
        self.skipped = 0;
        self.yielded = 0;
    }
}

impl Iterator for EventSequence {
    type Item = Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self
            .filter
            .limit()
            .is_some_and(|limit| self.yielded >= limit)
        {
            return None;
        }
        loop {
            let event = self.snapshot.get(self.cursor)?;
            self.cursor += 1;
            if !self.filter.matches(event) {
                continue;
            }
            if self.skipped < self.filter.offset() {
                self.skipped += 1;
                continue;
            }
            self.yielded += 1;
            return Some(Event::clone(event));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.snapshot.len().saturating_sub(self.cursor);
        let upper = self.filter.limit().map_or(remaining, |limit| {
            remaining.min(limit.saturating_sub(self.yielded))
        });
        (0, Some(upper))
    }
}

/// Port for the append-only event log.
///
/// # Implementation Notes
///
/// Implementations must ensure:
/// - Event IDs are unique across the log
/// - Stored events are never mutated
/// - Queries return events in timestamp order, ties in insertion order
/// - A rejected write is reported, never silently dropped
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends one event.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError::DuplicateEvent`] when the identifier is
    /// already stored, or [`EventStoreError::Persistence`] when the medium
    /// rejects the write.
    async fn append(&self, event: &Event) -> EventStoreResult<()>;

    /// Returns the events matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError`] if the snapshot cannot be taken.
    async fn get_events(&self, filter: &EventFilter) -> EventStoreResult<EventSequence>;

    /// Returns the event with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError`] if the lookup fails.
    async fn get_event_by_id(&self, id: EventId) -> EventStoreResult<Option<Event>>;

    /// Returns every event in a causal chain, in timestamp order.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError`] if the lookup fails.
    async fn get_events_by_correlation_id(
        &self,
        correlation_id: CorrelationId,
    ) -> EventStoreResult<Vec<Event>>;

    /// Removes events strictly older than `older_than` and returns how many
    /// were removed. Events stamped exactly at the cutoff are kept.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError`] if the deletion fails.
    async fn delete_events(&self, older_than: DateTime<Utc>) -> EventStoreResult<u64>;
}
