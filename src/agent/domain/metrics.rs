//! Per-agent performance counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weight given to the newest collaboration outcome in the rolling rating.
const COLLABORATION_WEIGHT: f64 = 0.2;

/// Performance counters maintained by the registry for each agent.
///
/// A fresh agent starts with a success rate of `1.0` and a neutral
/// collaboration rating of `0.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    tasks_completed: u32,
    tasks_failed: u32,
    average_completion_ms: f64,
    success_rate: f64,
    collaboration_rating: f64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            tasks_completed: 0,
            tasks_failed: 0,
            average_completion_ms: 0.0,
            success_rate: 1.0,
            collaboration_rating: 0.5,
        }
    }
}

impl PerformanceMetrics {
    /// Returns the number of tasks the agent completed.
    #[must_use]
    pub const fn tasks_completed(&self) -> u32 {
        self.tasks_completed
    }

    /// Returns the number of tasks the agent failed.
    #[must_use]
    pub const fn tasks_failed(&self) -> u32 {
        self.tasks_failed
    }

    /// Mean wall-clock time of completed tasks, in milliseconds.
    #[must_use]
    pub const fn average_completion_ms(&self) -> f64 {
        self.average_completion_ms
    }

    /// Share of finished tasks that completed, in `[0, 1]`.
    #[must_use]
    pub const fn success_rate(&self) -> f64 {
        self.success_rate
    }

    /// Rolling collaboration rating, in `[0, 1]`.
    #[must_use]
    pub const fn collaboration_rating(&self) -> f64 {
        self.collaboration_rating
    }

    pub(crate) fn record_completion(&mut self, elapsed_ms: u32) {
        self.tasks_completed = self.tasks_completed.saturating_add(1);
        let samples = f64::from(self.tasks_completed);
        self.average_completion_ms +=
            (f64::from(elapsed_ms) - self.average_completion_ms) / samples;
        self.refresh_success_rate();
    }

    pub(crate) fn record_failure(&mut self) {
        self.tasks_failed = self.tasks_failed.saturating_add(1);
        self.refresh_success_rate();
    }

    pub(crate) fn record_collaboration(&mut self, succeeded: bool) {
        let outcome = if succeeded { 1.0 } else { 0.0 };
        self.collaboration_rating = self
            .collaboration_rating
            .mul_add(1.0 - COLLABORATION_WEIGHT, outcome * COLLABORATION_WEIGHT)
            .clamp(0.0, 1.0);
    }

    fn refresh_success_rate(&mut self) {
        let completed = f64::from(self.tasks_completed);
        let finished = completed + f64::from(self.tasks_failed);
        if finished > 0.0 {
            self.success_rate = (completed / finished).clamp(0.0, 1.0);
        }
    }
}

/// Milliseconds between two instants, clamped to `u32`; negative spans
/// count as zero.
pub(crate) fn elapsed_ms(started: DateTime<Utc>, finished: DateTime<Utc>) -> u32 {
    let millis = finished
        .signed_duration_since(started)
        .num_milliseconds()
        .max(0);
    u32::try_from(millis).unwrap_or(u32::MAX)
}
