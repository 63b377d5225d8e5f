//! Agent event manager configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for [`super::AgentEventManager`].
///
/// `stats_interval` is read and written in milliseconds; when absent no
/// periodic `system.stats_updated` events are emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[must_use]
pub struct ManagerConfig {
    source: String,
    #[serde(with = "crate::duration_ms::option")]
    stats_interval: Option<Duration>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            source: "agent-manager".to_owned(),
            stats_interval: None,
        }
    }
}

impl ManagerConfig {
    /// Sets the source name stamped on emitted events.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Enables periodic statistics events.
    pub const fn with_stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = Some(interval);
        self
    }

    /// Returns the source name stamped on emitted events.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the statistics period, if enabled.
    #[must_use]
    pub const fn stats_interval(&self) -> Option<Duration> {
        self.stats_interval
    }
}
