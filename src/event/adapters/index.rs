//! Ordered in-memory index shared by the store adapters.

use crate::event::domain::{CorrelationId, Event, EventFilter, EventId};
use crate::event::ports::store::{EventSequence, EventStoreError};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Position of an event in the log: timestamp, then insertion order.
type LogKey = (DateTime<Utc>, u64);

/// Ordered log with an id index and a correlation-id secondary index.
#[derive(Debug, Default)]
pub(super) struct EventIndex {
    log: BTreeMap<LogKey, Arc<Event>>,
    by_id: HashMap<EventId, LogKey>,
    by_correlation: HashMap<CorrelationId, BTreeSet<LogKey>>,
    next_sequence: u64,
}

impl EventIndex {
    pub(super) fn len(&self) -> usize {
        self.log.len()
    }

    pub(super) fn contains(&self, id: EventId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub(super) fn insert(&mut self, event: Event) -> Result<(), EventStoreError> {
        if self.contains(event.id()) {
            return Err(EventStoreError::DuplicateEvent(event.id()));
        }
        let key = (event.timestamp(), self.next_sequence);
        self.next_sequence += 1;
        self.by_id.insert(event.id(), key);
        self.by_correlation
            .entry(event.correlation_id())
            .or_default()
            .insert(key);
        self.log.insert(key, Arc::new(event));
        Ok(())
    }

    pub(super) fn get(&self, id: EventId) -> Option<Event> {
        self.by_id
            .get(&id)
            .and_then(|key| self.log.get(key))
            .map(|event| Event::clone(event))
    }

    pub(super) fn correlated(&self, correlation_id: CorrelationId) -> Vec<Event> {
        self.correlated_arcs(correlation_id)
            .into_iter()
            .map(|event| Event::clone(&event))
            .collect()
    }

    /// Snapshots the candidates for `filter`, narrowing by correlation id
    /// when the filter names one.
    pub(super) fn query(&self, filter: &EventFilter) -> EventSequence {
        let snapshot = match filter.correlation_id() {
            Some(correlation_id) => self.correlated_arcs(correlation_id),
            None => self.log.values().cloned().collect(),
        };
        EventSequence::new(snapshot, filter.clone())
    }

    /// Events that survive a retention pass at `cutoff`.
    pub(super) fn retained_since(&self, cutoff: DateTime<Utc>) -> impl Iterator<Item = &Event> {
        self.log.range((cutoff, 0)..).map(|(_, event)| event.as_ref())
    }

    /// Removes events strictly older than `cutoff`.
    pub(super) fn remove_before(&mut self, cutoff: DateTime<Utc>) -> u64 {
        let kept = self.log.split_off(&(cutoff, 0));
        let removed = std::mem::replace(&mut self.log, kept);
        let mut count = 0_u64;
        for (key, event) in removed {
            self.by_id.remove(&event.id());
            if let Some(keys) = self.by_correlation.get_mut(&event.correlation_id()) {
                keys.remove(&key);
                if keys.is_empty() {
                    self.by_correlation.remove(&event.correlation_id());
                }
            }
            count += 1;
        }
        count
    }

    fn correlated_arcs(&self, correlation_id: CorrelationId) -> Vec<Arc<Event>> {
        self.by_correlation
            .get(&correlation_id)
            .map(|keys| {
                keys.iter()
                    .filter_map(|key| self.log.get(key).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}
