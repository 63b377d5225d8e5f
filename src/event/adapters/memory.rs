//! In-memory implementation of the `EventStore` port.

use super::index::EventIndex;
use crate::event::domain::{CorrelationId, Event, EventFilter, EventId};
use crate::event::ports::store::{EventSequence, EventStore, EventStoreError, EventStoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

/// In-memory implementation of [`EventStore`].
///
/// Thread-safe via internal [`RwLock`]. Clones share the same log.
///
/// # Example
///
/// ```
/// use agora::event::adapters::InMemoryEventStore;
///
/// let store = InMemoryEventStore::new();
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventStore {
    index: Arc<RwLock<EventIndex>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored events.
    ///
    /// Returns `0` if the internal lock is poisoned. For error-propagating
    /// access, use the store trait methods instead.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Returns `true` if no events are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: &Event) -> EventStoreResult<()> {
        let mut guard = self
            .index
            .write()
            .map_err(|_| EventStoreError::poisoned("event index"))?;
        guard.insert(event.clone())
    }

    async fn get_events(&self, filter: &EventFilter) -> EventStoreResult<EventSequence> {
        let guard = self
            .index
            .read()
            .map_err(|_| EventStoreError::poisoned("event index"))?;
        Ok(guard.query(filter))
    }

    async fn get_event_by_id(&self, id: EventId) -> EventStoreResult<Option<Event>> {
        let guard = self
            .index
            .read()
            .map_err(|_| EventStoreError::poisoned("event index"))?;
        Ok(guard.get(id))
    }

    async fn get_events_by_correlation_id(
        &self,
        correlation_id: CorrelationId,
    ) -> EventStoreResult<Vec<Event>> {
        let guard = self
            .index
            .read()
            .map_err(|_| EventStoreError::poisoned("event index"))?;
        Ok(guard.correlated(correlation_id))
    }

    async fn delete_events(&self, older_than: DateTime<Utc>) -> EventStoreResult<u64> {
        let mut guard = self
            .index
            .write()
            .map_err(|_| EventStoreError::poisoned("event index"))?;
        Ok(guard.remove_before(older_than))
    }
}
