//! Agent capability contract.
//!
//! Collaborators plug workers into the manager and the swarm coordinator by
//! implementing [`Agent`]. How an agent computes its result is opaque to
//! this crate.

use crate::agent::domain::{AgentId, AgentRole, AgentStatus, CapabilitySet};
use crate::task::domain::Task;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Successful result of processing a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    summary: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    data: Value,
}

impl AgentOutput {
    /// Creates an output with a human-readable summary and no data.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            data: Value::Null,
        }
    }

    /// Attaches structured data.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Returns the summary.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns the structured data, `Value::Null` when absent.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Consumes the output, returning `{"summary": .., "data": ..}`.
    #[must_use]
    pub fn into_json(self) -> Value {
        serde_json::json!({ "summary": self.summary, "data": self.data })
    }
}

/// An agent could not process a task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct AgentFailure {
    reason: String,
}

impl AgentFailure {
    /// Creates a failure with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the failure reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Consumes the failure, returning its reason.
    #[must_use]
    pub fn into_reason(self) -> String {
        self.reason
    }
}

/// Worker contract consumed by the manager and the swarm coordinator.
///
/// # Implementation Notes
///
/// - `id` and `capabilities` must be stable for the lifetime of the agent.
/// - `process` may be invoked concurrently for different tasks by the swarm
///   coordinator.
/// - A task may be cancelled while `process` runs; the result is then
///   discarded by the caller.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the unique agent identifier.
    fn id(&self) -> &AgentId;

    /// Returns the role or specialty label.
    fn role(&self) -> &AgentRole;

    /// Returns the capability tags the agent offers.
    fn capabilities(&self) -> &CapabilitySet;

    /// Processes a task.
    ///
    /// # Errors
    ///
    /// Returns [`AgentFailure`] when the agent cannot produce a result.
    async fn process(&self, task: &Task) -> Result<AgentOutput, AgentFailure>;

    /// Reports the agent's own view of its status.
    fn status(&self) -> AgentStatus {
        AgentStatus::Idle
    }
}
