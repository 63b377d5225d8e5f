//! Typed event payloads, one shape per category.
//!
//! Payload records are plain data; the event factory validates their
//! contents before an event is built.

use super::EventCategory;
use crate::agent::domain::{AgentId, AgentRole, AgentStatus};
use crate::task::domain::{TaskId, TaskPriority, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of a task lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// The task the event is about.
    pub task_id: TaskId,
    /// Task title at the time of the event.
    pub title: String,
    /// Task status after the event.
    pub status: TaskStatus,
    /// Task priority.
    pub priority: TaskPriority,
    /// Agent holding the task, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    /// Structured result of a completed task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Reason a task failed or was cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Payload of an agent lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPayload {
    /// The agent the event is about.
    pub agent_id: AgentId,
    /// The agent's role tag.
    pub role: AgentRole,
    /// Status after the event.
    pub status: AgentStatus,
    /// Status before the event, for status changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<AgentStatus>,
}

/// Payload of a message between agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Sending agent.
    pub sender: AgentId,
    /// Receiving agent; `None` broadcasts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<AgentId>,
    /// Message body.
    pub content: String,
}

/// Payload of a collaboration event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationPayload {
    /// Agent that asked for the collaboration.
    pub initiator: AgentId,
    /// Other agents taking part.
    pub participants: Vec<AgentId>,
    /// What the collaboration is about.
    pub topic: String,
    /// Whether a finished collaboration achieved its goal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succeeded: Option<bool>,
    /// Free-text outcome of a finished collaboration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

/// Severity of a system event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    #[default]
    Info,
    /// Degraded but recoverable.
    Warning,
    /// Something failed.
    Error,
}

/// Payload of a system diagnostics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPayload {
    /// Severity level.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Structured details.
    #[serde(default)]
    pub details: Value,
}

/// Payload of a user session event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// Session identifier chosen by the session owner.
    pub session_id: String,
    /// User the session belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Summary written when the session ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Payload of a code artefact event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePayload {
    /// Programming language of the artefact.
    pub language: String,
    /// Source text.
    pub content: String,
    /// Destination path, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Review verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    /// Review notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payload tagged by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    /// Task lifecycle payload.
    Task(TaskPayload),
    /// Agent lifecycle payload.
    Agent(AgentPayload),
    /// Message payload.
    Message(MessagePayload),
    /// Collaboration payload.
    Collaboration(CollaborationPayload),
    /// System payload.
    System(SystemPayload),
    /// Session payload.
    Session(SessionPayload),
    /// Code payload.
    Code(CodePayload),
}

impl EventPayload {
    /// Returns the category of this payload.
    #[must_use]
    pub const fn category(&self) -> EventCategory {
        match self {
            Self::Task(_) => EventCategory::Task,
            Self::Agent(_) => EventCategory::Agent,
            Self::Message(_) => EventCategory::Message,
            Self::Collaboration(_) => EventCategory::Collaboration,
            Self::System(_) => EventCategory::System,
            Self::Session(_) => EventCategory::Session,
            Self::Code(_) => EventCategory::Code,
        }
    }

    /// Returns the task payload, if this is one.
    #[must_use]
    pub const fn as_task(&self) -> Option<&TaskPayload> {
        match self {
            Self::Task(payload) => Some(payload),
            _ => None,
        }
    }

    /// Returns the agent payload, if this is one.
    #[must_use]
    pub const fn as_agent(&self) -> Option<&AgentPayload> {
        match self {
            Self::Agent(payload) => Some(payload),
            _ => None,
        }
    }

    /// Returns the system payload, if this is one.
    #[must_use]
    pub const fn as_system(&self) -> Option<&SystemPayload> {
        match self {
            Self::System(payload) => Some(payload),
            _ => None,
        }
    }
}
