//! Event bus configuration.

use crate::validation::{FieldProblem, ValidationError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables fixed when the bus is constructed.
///
/// Durations are read and written as whole milliseconds. Missing fields take
/// their defaults: 3 retries, 1000 ms between attempts, batches of 100
/// flushed at least every 5000 ms, persistence on, compression and
/// encryption off.
///
/// # Examples
///
/// ```
/// use agora::event::services::EventBusConfig;
/// use std::time::Duration;
///
/// let config: EventBusConfig =
///     serde_json::from_str(r#"{ "max_retries": 5, "retry_delay": 250 }"#).expect("valid config");
/// assert_eq!(config.max_retries(), 5);
/// assert_eq!(config.retry_delay(), Duration::from_millis(250));
/// assert_eq!(config.batch_size(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct EventBusConfig {
    max_retries: u32,
    #[serde(with = "crate::duration_ms")]
    retry_delay: Duration,
    batch_size: usize,
    #[serde(with = "crate::duration_ms")]
    flush_interval: Duration,
    persistence: bool,
    compression: bool,
    encryption: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            batch_size: 100,
            flush_interval: Duration::from_millis(5000),
            persistence: true,
            compression: false,
            encryption: false,
        }
    }
}

impl EventBusConfig {
    /// Sets how many times a failing handler is retried.
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay between handler attempts.
    pub const fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Sets how many events accumulate before a flush.
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the period of the flush timer.
    pub const fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    /// Enables or disables write-ahead persistence.
    pub const fn with_persistence(mut self, persistence: bool) -> Self {
        self.persistence = persistence;
        self
    }

    /// Enables or disables the compression transform.
    pub const fn with_compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }

    /// Enables or disables the encryption transform.
    pub const fn with_encryption(mut self, encryption: bool) -> Self {
        self.encryption = encryption;
        self
    }

    /// Returns how many times a failing handler is retried.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the delay between handler attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Returns the flush threshold.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the flush timer period.
    #[must_use]
    pub const fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    /// Returns `true` when events are stored before delivery.
    #[must_use]
    pub const fn persistence(&self) -> bool {
        self.persistence
    }

    /// Returns `true` when the compression transform is enabled.
    #[must_use]
    pub const fn compression(&self) -> bool {
        self.compression
    }

    /// Returns `true` when the encryption transform is enabled.
    #[must_use]
    pub const fn encryption(&self) -> bool {
        self.encryption
    }

    /// Returns `true` when events are buffered before delivery.
    ///
    /// Batching requires persistence and a batch size above one.
    #[must_use]
    pub const fn batching(&self) -> bool {
        self.persistence && self.batch_size > 1
    }

    /// Returns `true` when payloads pass through the transform hook.
    #[must_use]
    pub const fn transforms_payloads(&self) -> bool {
        self.compression || self.encryption
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when `batch_size` is zero or
    /// `flush_interval` is zero while batching.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = crate::validation::IssueCollector::new();
        if self.batch_size == 0 {
            issues.push(
                "batch_size",
                FieldProblem::Invalid("must be at least 1".to_owned()),
            );
        }
        if self.batching() && self.flush_interval.is_zero() {
            issues.push(
                "flush_interval",
                FieldProblem::Invalid("must be positive when batching".to_owned()),
            );
        }
        issues.finish()
    }
}
