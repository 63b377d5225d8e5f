//! Payload transform hook.
//!
//! When compression or encryption is enabled the bus passes payloads
//! through a [`PayloadTransform`] on the way into the store and on the way
//! back out during replay. No codec ships with the crate; the default is
//! [`IdentityTransform`].

use crate::event::domain::EventPayload;
use thiserror::Error;

/// A transform rejected a payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("payload transform failed: {0}")]
pub struct TransformError(pub String);

/// Symmetric payload transform applied at the store boundary.
///
/// Implementations must keep the payload category unchanged and satisfy
/// `on_read(on_write(p)) == p`.
pub trait PayloadTransform: Send + Sync {
    /// Transforms a payload before it is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] when the payload cannot be encoded.
    fn on_write(&self, payload: EventPayload) -> Result<EventPayload, TransformError>;

    /// Reverses [`PayloadTransform::on_write`] after a payload is read.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] when the payload cannot be decoded.
    fn on_read(&self, payload: EventPayload) -> Result<EventPayload, TransformError>;
}

/// Transform that returns payloads unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl PayloadTransform for IdentityTransform {
    fn on_write(&self, payload: EventPayload) -> Result<EventPayload, TransformError> {
        Ok(payload)
    }

    fn on_read(&self, payload: EventPayload) -> Result<EventPayload, TransformError> {
        Ok(payload)
    }
}
