//! Error types for the event bus.

use crate::event::domain::SubscriptionId;
use crate::event::ports::{EventStoreError, TransformError};
use thiserror::Error;

/// Result type for event bus operations.
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Errors returned to publishers.
#[derive(Debug, Clone, Error)]
pub enum EventBusError {
    /// The event could not be persisted; nothing was delivered.
    #[error(transparent)]
    Store(#[from] EventStoreError),

    /// The payload transform rejected the event; nothing was delivered.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The bus has been shut down.
    #[error("event bus is shut down")]
    ShutDown,
}

/// A subscriber handler reported a failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    /// Creates a handler error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// A handler kept failing after every retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("subscription {subscription_id} failed after {attempts} attempts: {last_error}")]
pub struct DeliveryError {
    /// The failing subscription.
    pub subscription_id: SubscriptionId,
    /// How many times the handler was invoked.
    pub attempts: u32,
    /// The error from the final attempt.
    pub last_error: HandlerError,
}
