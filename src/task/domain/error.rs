//! Error types for task lifecycle validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while changing task state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The requested transition is not allowed by the state machine.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// The task being transitioned.
        task_id: TaskId,
        /// The current status.
        from: TaskStatus,
        /// The requested status.
        to: TaskStatus,
    },

    /// The task has dependencies that have not completed yet.
    #[error("task {task_id} has {} incomplete dependencies", .incomplete.len())]
    DependenciesIncomplete {
        /// The task that was asked to start.
        task_id: TaskId,
        /// Dependencies that are not yet completed.
        incomplete: Vec<TaskId>,
    },
}

/// Error returned while parsing a task status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing a task priority.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParseTaskPriorityError(pub String);
