//! Query filter for the event store.

use super::{CorrelationId, Event, EventType};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Selects events from the store.
///
/// Every criterion left unset matches all events. The time range is
/// inclusive on both ends. `offset` and `limit` apply after matching.
///
/// # Examples
///
/// ```
/// use agora::event::domain::{EventFilter, EventType};
///
/// let filter = EventFilter::new()
///     .with_event_types([EventType::TaskCreated, EventType::TaskCompleted])
///     .with_source("agent-manager")
///     .with_limit(10);
/// assert_eq!(filter.limit(), Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct EventFilter {
    event_types: BTreeSet<EventType>,
    source: Option<String>,
    target: Option<String>,
    correlation_id: Option<CorrelationId>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    offset: usize,
    limit: Option<usize>,
}

impl EventFilter {
    /// Creates a filter that matches every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts matches to the given types; an empty set matches all.
    pub fn with_event_types(mut self, types: impl IntoIterator<Item = EventType>) -> Self {
        self.event_types = types.into_iter().collect();
        self
    }

    /// Restricts matches to one source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Restricts matches to one target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Restricts matches to one causal chain.
    pub const fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Keeps events at or after `from`.
    pub const fn with_from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Keeps events at or before `to`.
    pub const fn with_to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Skips the first `offset` matches.
    pub const fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Yields at most `limit` matches.
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the number of matches to skip.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the maximum number of matches to yield.
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the correlation criterion, if set.
    #[must_use]
    pub const fn correlation_id(&self) -> Option<CorrelationId> {
        self.correlation_id
    }

    /// Returns `true` when `event` satisfies every criterion except paging.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        (self.event_types.is_empty() || self.event_types.contains(&event.event_type()))
            && self
                .source
                .as_deref()
                .is_none_or(|source| source == event.source())
            && self
                .target
                .as_deref()
                .is_none_or(|target| Some(target) == event.target())
            && self
                .correlation_id
                .is_none_or(|id| id == event.correlation_id())
            && self.from.is_none_or(|from| event.timestamp() >= from)
            && self.to.is_none_or(|to| event.timestamp() <= to)
    }
}
