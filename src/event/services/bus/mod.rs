//! Publish/subscribe event bus.
//!
//! The bus stores each published event before any subscriber sees it, then
//! delivers it to the active subscriptions for its type in priority order.
//! Failing handlers are retried; when retries run out the event is marked
//! failed and a single `system.error_occurred` event describes the failure.
//! With batching enabled, events are buffered and delivered by [`EventBus::flush`],
//! which runs when the buffer fills and on a recurring timer.

mod config;
mod error;
mod subscription;

pub use config::EventBusConfig;
pub use error::{DeliveryError, EventBusError, EventBusResult, HandlerError};
pub use subscription::{EventHandler, EventPredicate, SubscribeOptions};

use super::factory::EventFactory;
use super::replay::{self, ReplayJob};
use crate::event::domain::{
    Event, EventFilter, EventId, EventPayload, EventType, SubscriptionId,
};
use crate::event::ports::{EventStore, IdentityTransform, PayloadTransform, TransformError};
use crate::validation::ValidationError;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use subscription::{Registry, Target};
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Source name stamped on events the bus emits itself.
const BUS_SOURCE: &str = "event-bus";

struct BusInner {
    config: EventBusConfig,
    store: Arc<dyn EventStore>,
    factory: EventFactory,
    transform: Arc<dyn PayloadTransform>,
    subscriptions: RwLock<Registry>,
    buffer: Mutex<Vec<Event>>,
    flush_gate: tokio::sync::Mutex<()>,
    /// Grows until [`EventBus::clear_failed_events`] empties it.
    failed: Mutex<Vec<EventId>>,
    closed: AtomicBool,
    shutdown: CancellationToken,
}

impl Drop for BusInner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Cloneable handle to a shared event bus.
///
/// # Examples
///
/// ```
/// use agora::SharedClock;
/// use agora::event::adapters::InMemoryEventStore;
/// use agora::event::domain::EventType;
/// use agora::event::services::bus::{EventBus, EventBusConfig, HandlerError, SubscribeOptions};
/// use agora::event::services::EventFactory;
/// use mockable::DefaultClock;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let clock: SharedClock = Arc::new(DefaultClock);
/// let store = Arc::new(InMemoryEventStore::new());
/// let config = EventBusConfig::default().with_batch_size(1);
/// let bus = EventBus::new(store.clone(), EventFactory::new(clock), config)?;
///
/// bus.subscribe(
///     EventType::ErrorOccurred,
///     |_event| async { Ok::<(), HandlerError>(()) },
///     SubscribeOptions::new(),
/// );
/// let event = bus
///     .factory()
///     .system_error("docs", "disk almost full", json!({ "free_mb": 12 }))
///     .build()?;
/// bus.publish(event).await?;
/// assert_eq!(store.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("config", &self.inner.config)
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Creates a bus that passes payloads through unchanged.
    ///
    /// When batching is enabled and a Tokio runtime is running, the flush
    /// timer starts immediately.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the configuration is invalid.
    pub fn new(
        store: Arc<dyn EventStore>,
        factory: EventFactory,
        config: EventBusConfig,
    ) -> Result<Self, ValidationError> {
        Self::with_transform(store, factory, config, Arc::new(IdentityTransform))
    }

    /// Creates a bus with a custom payload transform.
    ///
    /// The transform is only consulted when compression or encryption is
    /// enabled in `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the configuration is invalid.
    pub fn with_transform(
        store: Arc<dyn EventStore>,
        factory: EventFactory,
        config: EventBusConfig,
        transform: Arc<dyn PayloadTransform>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        let bus = Self {
            inner: Arc::new(BusInner {
                config,
                store,
                factory,
                transform,
                subscriptions: RwLock::new(Registry::default()),
                buffer: Mutex::new(Vec::new()),
                flush_gate: tokio::sync::Mutex::new(()),
                failed: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
                shutdown: CancellationToken::new(),
            }),
        };
        if bus.inner.config.batching() {
            bus.start_flush_timer();
        }
        Ok(bus)
    }

    fn start_flush_timer(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("no Tokio runtime; buffered events flush only when the batch fills");
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        let token = self.inner.shutdown.clone();
        let period = self.inner.config.flush_interval();
        runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else { break };
                        Self { inner }.flush().await;
                    }
                }
            }
            debug!("flush timer stopped");
        });
    }

    /// Returns the configuration the bus was built with.
    #[must_use]
    pub fn config(&self) -> &EventBusConfig {
        &self.inner.config
    }

    /// Returns the factory used for events the bus emits itself.
    #[must_use]
    pub fn factory(&self) -> &EventFactory {
        &self.inner.factory
    }

    /// Returns the backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.inner.store
    }

    /// Publishes an event.
    ///
    /// With persistence enabled the event is stored before any delivery.
    /// Handler failures are never returned here.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::Store`] or [`EventBusError::Transform`] when
    /// the event could not be persisted, in which case nothing is delivered,
    /// and [`EventBusError::ShutDown`] after [`EventBus::shutdown`].
    pub async fn publish(&self, event: Event) -> EventBusResult<EventId> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(EventBusError::ShutDown);
        }
        let event_id = event.id();
        if self.inner.config.persistence() {
            self.persist(&event).await.inspect_err(|err| {
                error!(
                    event_id = %event_id,
                    event_type = %event.event_type(),
                    error = %err,
                    "failed to persist event; not delivering"
                );
            })?;
        }
        debug!(event_id = %event_id, event_type = %event.event_type(), "published event");

        if self.inner.config.batching() {
            let batch_full = {
                let mut buffer = self.buffer();
                buffer.push(event);
                buffer.len() >= self.inner.config.batch_size()
            };
            if batch_full {
                self.flush().await;
            }
        } else {
            self.deliver(&event).await;
        }
        Ok(event_id)
    }

    /// Delivers every buffered event and returns how many were delivered.
    ///
    /// Each batch is ordered by timestamp, keeping buffer order for equal
    /// timestamps. When another flush is already running it picks up the
    /// buffered events instead and this call returns `0`. A flush re-checks
    /// the buffer after releasing the gate, so events buffered while a
    /// contended flush was finishing are never left for the next tick.
    pub async fn flush(&self) -> usize {
        let mut delivered = 0;
        loop {
            let Ok(gate) = self.inner.flush_gate.try_lock() else {
                break;
            };
            delivered += self.drain_buffer().await;
            drop(gate);
            if self.pending_events() == 0 {
                break;
            }
        }
        delivered
    }

    /// Delivers buffered batches until the buffer is empty.
    ///
    /// Callers hold the flush gate.
    async fn drain_buffer(&self) -> usize {
        let mut delivered = 0;
        loop {
            let mut batch = std::mem::take(&mut *self.buffer());
            if batch.is_empty() {
                break;
            }
            batch.sort_by_key(Event::timestamp);
            debug!(events = batch.len(), "flushing event batch");
            for event in &batch {
                self.deliver(event).await;
            }
            delivered += batch.len();
        }
        delivered
    }

    /// Returns the number of buffered, undelivered events.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.buffer().len()
    }

    /// Registers a handler for one event type.
    pub fn subscribe(
        &self,
        event_type: EventType,
        handler: impl EventHandler + 'static,
        options: SubscribeOptions,
    ) -> SubscriptionId {
        let id = self
            .subscriptions_mut()
            .insert(event_type, Arc::new(handler), options);
        debug!(subscription_id = %id, event_type = %event_type, "subscribed");
        id
    }

    /// Removes a subscription. Unknown identifiers are ignored.
    ///
    /// Returns `true` when a subscription was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscriptions_mut().remove(id)
    }

    /// Pauses or resumes a subscription.
    ///
    /// Returns `false` when the identifier is unknown.
    pub fn set_active(&self, id: SubscriptionId, active: bool) -> bool {
        self.subscriptions_mut().set_active(id, active)
    }

    /// Returns the number of registered subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions().len()
    }

    /// Returns the events whose delivery exhausted every retry.
    ///
    /// The list is kept for the life of the bus; pair
    /// [`EventBus::clear_failed_events`] with store retention to bound it.
    #[must_use]
    pub fn failed_events(&self) -> Vec<EventId> {
        self.failed().clone()
    }

    /// Returns `true` when delivery of `id` exhausted every retry.
    #[must_use]
    pub fn is_failed(&self, id: EventId) -> bool {
        self.failed().contains(&id)
    }

    /// Empties the failed-delivery ledger and returns what it held.
    #[must_use]
    pub fn clear_failed_events(&self) -> Vec<EventId> {
        let cleared = std::mem::take(&mut *self.failed());
        debug!(cleared = cleared.len(), "failed-delivery ledger cleared");
        cleared
    }

    /// Re-delivers stored events stamped within `[from, to]`.
    ///
    /// Replayed events go to the current subscribers with a single attempt
    /// each. They are not stored again and never produce error events.
    pub fn replay(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event_types: impl IntoIterator<Item = EventType>,
    ) -> ReplayJob {
        let filter = EventFilter::new()
            .with_from(from)
            .with_to(to)
            .with_event_types(event_types);
        replay::start(self.clone(), filter)
    }

    /// Stops the flush timer, rejects further publishes, and delivers
    /// whatever is still buffered.
    ///
    /// Waits for a flush already in progress before draining the rest.
    pub async fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.shutdown.cancel();
        let delivered = {
            let _gate = self.inner.flush_gate.lock().await;
            self.drain_buffer().await
        };
        info!(delivered, "event bus shut down");
    }

    /// Returns `true` after [`EventBus::shutdown`].
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Reverses the write transform on an event read from the store.
    pub(crate) fn decode_stored(&self, event: Event) -> Result<Event, TransformError> {
        if !self.inner.config.transforms_payloads() {
            return Ok(event);
        }
        let decoded = self.inner.transform.on_read(event.payload().clone())?;
        ensure_same_category(event.payload(), &decoded)?;
        Ok(event.with_payload(decoded))
    }

    /// Invokes each matching handler once, returning the failures.
    pub(crate) async fn deliver_once(&self, event: &Event) -> Vec<(SubscriptionId, HandlerError)> {
        let mut failures = Vec::new();
        for target in self.targets_for(event) {
            if !self.is_live(&target) {
                continue;
            }
            if let Err(err) = target.handler.handle(event).await {
                failures.push((target.id, err));
            }
        }
        failures
    }

    async fn persist(&self, event: &Event) -> EventBusResult<()> {
        if self.inner.config.transforms_payloads() {
            let encoded = self.inner.transform.on_write(event.payload().clone())?;
            ensure_same_category(event.payload(), &encoded)?;
            let stored = event.clone().with_payload(encoded);
            self.inner.store.append(&stored).await?;
        } else {
            self.inner.store.append(event).await?;
        }
        Ok(())
    }

    async fn deliver(&self, event: &Event) {
        let mut failures = Vec::new();
        for target in self.targets_for(event) {
            if !self.is_live(&target) {
                continue;
            }
            if let Err(err) = self.deliver_with_retry(&target, event).await {
                failures.push(err);
            }
        }
        if !failures.is_empty() {
            self.record_failure(event, &failures).await;
        }
    }

    fn targets_for(&self, event: &Event) -> Vec<Target> {
        let candidates = self.subscriptions().candidates(event.event_type());
        candidates
            .into_iter()
            .filter(|(_, filter)| filter.as_ref().is_none_or(|accepts| accepts(event)))
            .map(|(target, _)| target)
            .collect()
    }

    /// Returns `false` once an earlier handler removed or paused `target`.
    fn is_live(&self, target: &Target) -> bool {
        let live = self.subscriptions().is_active(target.id);
        if !live {
            debug!(subscription_id = %target.id, "subscription inactive; skipping delivery");
        }
        live
    }

    async fn deliver_with_retry(&self, target: &Target, event: &Event) -> Result<(), DeliveryError> {
        let max_attempts = self.inner.config.max_retries().saturating_add(1);
        let mut attempt = 1;
        loop {
            match target.handler.handle(event).await {
                Ok(()) => return Ok(()),
                Err(last_error) if attempt >= max_attempts => {
                    return Err(DeliveryError {
                        subscription_id: target.id,
                        attempts: attempt,
                        last_error,
                    });
                }
                Err(err) => {
                    warn!(
                        subscription_id = %target.id,
                        event_id = %event.id(),
                        attempt,
                        error = %err,
                        "handler failed; retrying"
                    );
                    tokio::time::sleep(self.inner.config.retry_delay()).await;
                    if !self.is_live(target) {
                        return Ok(());
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn record_failure(&self, event: &Event, failures: &[DeliveryError]) {
        let newly_failed = {
            let mut failed = self.failed();
            if failed.contains(&event.id()) {
                false
            } else {
                failed.push(event.id());
                true
            }
        };
        if !newly_failed {
            return;
        }
        error!(
            event_id = %event.id(),
            event_type = %event.event_type(),
            failures = failures.len(),
            "delivery retries exhausted"
        );
        if event.event_type() != EventType::ErrorOccurred {
            self.emit_error(event, failures).await;
        }
    }

    /// Persists and delivers one error event without retries.
    async fn emit_error(&self, event: &Event, failures: &[DeliveryError]) {
        let details = json!({
            "event_id": event.id(),
            "event_type": event.event_type(),
            "failures": failures
                .iter()
                .map(|failure| json!({
                    "subscription_id": failure.subscription_id,
                    "attempts": failure.attempts,
                    "error": failure.last_error.message(),
                }))
                .collect::<Vec<_>>(),
        });
        let built = self
            .inner
            .factory
            .system_error(
                BUS_SOURCE,
                format!("delivery of {} exhausted retries", event.event_type()),
                details,
            )
            .with_correlation_id(event.correlation_id())
            .build();
        let error_event = match built {
            Ok(error_event) => error_event,
            Err(err) => {
                error!(error = %err, "could not build error event");
                return;
            }
        };
        if self.inner.config.persistence() {
            let persisted = self.persist(&error_event).await;
            if let Err(err) = persisted {
                error!(event_id = %error_event.id(), error = %err, "failed to persist error event");
            }
        }
        for (subscription_id, err) in self.deliver_once(&error_event).await {
            warn!(
                subscription_id = %subscription_id,
                error = %err,
                "error event handler failed; not retrying"
            );
        }
    }

    fn subscriptions(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn subscriptions_mut(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<Event>> {
        self.inner
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn failed(&self) -> MutexGuard<'_, Vec<EventId>> {
        self.inner
            .failed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_same_category(
    original: &EventPayload,
    transformed: &EventPayload,
) -> Result<(), TransformError> {
    if original.category() == transformed.category() {
        Ok(())
    } else {
        Err(TransformError(format!(
            "transform changed payload category from {} to {}",
            original.category(),
            transformed.category()
        )))
    }
}
