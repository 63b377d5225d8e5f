//! Error types for the agent event manager.

use crate::agent::domain::{AgentId, AgentStatus};
use crate::event::domain::CorrelationId;
use crate::event::services::EventBusError;
use crate::task::domain::{TaskDomainError, TaskId};
use crate::validation::ValidationError;
use thiserror::Error;

/// Result type for agent event manager operations.
pub type AgentManagerResult<T> = Result<T, AgentManagerError>;

/// Errors returned by [`super::AgentEventManager`].
#[derive(Debug, Clone, Error)]
pub enum AgentManagerError {
    /// Input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No agent with this identifier is registered.
    #[error("agent {0} is not registered")]
    UnknownAgent(AgentId),

    /// The agent holds a task and cannot be removed or idled.
    #[error("agent {agent_id} is busy with task {task_id}")]
    AgentBusy {
        /// The busy agent.
        agent_id: AgentId,
        /// The task it holds.
        task_id: TaskId,
    },

    /// The agent is not idle.
    #[error("agent {agent_id} is {status}, not idle")]
    AgentUnavailable {
        /// The agent asked for.
        agent_id: AgentId,
        /// Its current status.
        status: AgentStatus,
    },

    /// No task with this identifier was submitted.
    #[error("task {0} is not known")]
    UnknownTask(TaskId),

    /// No open collaboration with this identifier exists.
    #[error("collaboration {0} is not open")]
    UnknownCollaboration(CorrelationId),

    /// The task state machine refused the change.
    #[error(transparent)]
    Task(#[from] TaskDomainError),

    /// An event could not be published.
    #[error(transparent)]
    Bus(#[from] EventBusError),
}
