//! Fixtures shared by the unit test trees.

use crate::SharedClock;
use crate::event::adapters::InMemoryEventStore;
use crate::event::services::{EventBus, EventBusConfig, EventFactory};
use chrono::{DateTime, Duration, Local, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex, PoisonError};

/// Clock that only moves when a test moves it.
#[derive(Debug)]
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub(crate) fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 2026-01-01T00:00:00Z.
pub(crate) fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_225_600, 0).unwrap_or_default()
}

/// A manual clock at [`epoch`], shared and concrete.
pub(crate) fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at(epoch()))
}

/// Bus over `store` that persists and delivers every event immediately.
pub(crate) fn immediate_bus(store: Arc<InMemoryEventStore>, clock: SharedClock) -> EventBus {
    immediate_bus_with(store, clock, EventBusConfig::default())
}

/// Like [`immediate_bus`] with extra settings; batching is always disabled.
pub(crate) fn immediate_bus_with(
    store: Arc<InMemoryEventStore>,
    clock: SharedClock,
    config: EventBusConfig,
) -> EventBus {
    EventBus::new(store, EventFactory::new(clock), config.with_batch_size(1))
        .expect("immediate delivery configuration is valid")
}
