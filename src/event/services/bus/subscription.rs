//! Subscriptions and handler contracts.

use super::HandlerError;
use crate::event::domain::{Event, EventType, SubscriptionId};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Receives events from the bus.
///
/// Implemented for every `Fn(Event) -> impl Future<Output = Result<(),
/// HandlerError>>` closure.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] to request a retry.
    async fn handle(&self, event: &Event) -> Result<(), HandlerError>;
}

#[async_trait]
impl<F, Fut> EventHandler for F
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        (self)(event.clone()).await
    }
}

/// Predicate deciding whether a subscription sees an event.
pub type EventPredicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// Options for [`super::EventBus::subscribe`].
#[derive(Clone, Default)]
#[must_use]
pub struct SubscribeOptions {
    filter: Option<EventPredicate>,
    priority: i32,
}

impl std::fmt::Debug for SubscribeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscribeOptions")
            .field("filtered", &self.filter.is_some())
            .field("priority", &self.priority)
            .finish()
    }
}

impl SubscribeOptions {
    /// Default options: no filter, priority 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only deliver events for which `filter` returns `true`.
    pub fn with_filter(mut self, filter: impl Fn(&Event) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Higher priorities run first; equal priorities run in subscribe order.
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

pub(super) struct Subscription {
    pub(super) id: SubscriptionId,
    pub(super) event_type: EventType,
    pub(super) handler: Arc<dyn EventHandler>,
    pub(super) filter: Option<EventPredicate>,
    pub(super) priority: i32,
    pub(super) active: bool,
}

/// A subscription selected for one delivery, detached from the registry.
#[derive(Clone)]
pub(super) struct Target {
    pub(super) id: SubscriptionId,
    pub(super) handler: Arc<dyn EventHandler>,
}

/// Subscriptions ordered by priority descending, then subscribe order.
#[derive(Default)]
pub(super) struct Registry {
    subscriptions: Vec<Subscription>,
}

impl Registry {
    pub(super) fn insert(
        &mut self,
        event_type: EventType,
        handler: Arc<dyn EventHandler>,
        options: SubscribeOptions,
    ) -> SubscriptionId {
        let id = SubscriptionId::new();
        let position = self
            .subscriptions
            .iter()
            .position(|existing| existing.priority < options.priority)
            .unwrap_or(self.subscriptions.len());
        self.subscriptions.insert(
            position,
            Subscription {
                id,
                event_type,
                handler,
                filter: options.filter,
                priority: options.priority,
                active: true,
            },
        );
        id
    }

    pub(super) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| subscription.id != id);
        self.subscriptions.len() != before
    }

    pub(super) fn set_active(&mut self, id: SubscriptionId, active: bool) -> bool {
        let Some(subscription) = self
            .subscriptions
            .iter_mut()
            .find(|subscription| subscription.id == id)
        else {
            return false;
        };
        subscription.active = active;
        true
    }

    pub(super) fn is_active(&self, id: SubscriptionId) -> bool {
        self.subscriptions
            .iter()
            .any(|subscription| subscription.id == id && subscription.active)
    }

    pub(super) fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Active subscriptions for the event's type, with their filters.
    pub(super) fn candidates(
        &self,
        event_type: EventType,
    ) -> Vec<(Target, Option<EventPredicate>)> {
        self.subscriptions
            .iter()
            .filter(|subscription| subscription.active && subscription.event_type == event_type)
            .map(|subscription| {
                (
                    Target {
                        id: subscription.id,
                        handler: Arc::clone(&subscription.handler),
                    },
                    subscription.filter.clone(),
                )
            })
            .collect()
    }
}
