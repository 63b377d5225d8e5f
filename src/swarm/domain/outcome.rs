//! Result of processing a swarm job.

use crate::agent::domain::AgentId;
use crate::agent::ports::AgentOutput;
use crate::task::domain::{Task, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Output of one successful agent call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskOutput {
    /// The unit of work that was processed.
    pub task_id: TaskId,
    /// The agent that processed it.
    pub agent_id: AgentId,
    /// What the agent returned.
    pub output: AgentOutput,
}

/// One unit of work that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwarmFailure {
    /// The unit of work that failed.
    pub task_id: TaskId,
    /// The agent that was called; `None` when no agent matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    /// Why it failed.
    pub reason: String,
}

/// Aggregated result of [`crate::swarm::services::SwarmCoordinator::process_task`].
///
/// Successful outputs are always kept, even when other units failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmOutcome {
    task: Task,
    subtasks: Vec<Task>,
    outputs: Vec<SubtaskOutput>,
    errors: Vec<SwarmFailure>,
}

impl SwarmOutcome {
    pub(crate) const fn new(
        task: Task,
        subtasks: Vec<Task>,
        outputs: Vec<SubtaskOutput>,
        errors: Vec<SwarmFailure>,
    ) -> Self {
        Self {
            task,
            subtasks,
            outputs,
            errors,
        }
    }

    /// Returns the parent task in its final state: completed when no error
    /// was recorded, failed otherwise.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Returns the subtasks in their final states.
    #[must_use]
    pub fn subtasks(&self) -> &[Task] {
        &self.subtasks
    }

    /// Returns the successful outputs in listing order.
    #[must_use]
    pub fn outputs(&self) -> &[SubtaskOutput] {
        &self.outputs
    }

    /// Returns the failures in listing order.
    #[must_use]
    pub fn errors(&self) -> &[SwarmFailure] {
        &self.errors
    }

    /// Returns `true` when every unit succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.task.status(), TaskStatus::Completed)
    }

    /// Combines the successful outputs into one JSON object keyed by the
    /// identifier of the unit each output belongs to.
    #[must_use]
    pub fn result(&self) -> Value {
        let outputs: Map<String, Value> = self
            .outputs
            .iter()
            .map(|entry| {
                (
                    entry.task_id.to_string(),
                    json!({
                        "agent_id": entry.agent_id,
                        "summary": entry.output.summary(),
                        "data": entry.output.data(),
                    }),
                )
            })
            .collect();
        json!({
            "task_id": self.task.id(),
            "status": self.task.status(),
            "outputs": outputs,
            "errors": self.errors,
        })
    }
}
