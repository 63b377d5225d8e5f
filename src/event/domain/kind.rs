//! Event type tags and their categories.

use super::ParseEventTypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload family an event type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Task lifecycle.
    Task,
    /// Agent lifecycle.
    Agent,
    /// Messages between agents.
    Message,
    /// Multi-agent collaborations.
    Collaboration,
    /// System diagnostics.
    System,
    /// User sessions.
    Session,
    /// Code artefacts.
    Code,
}

impl EventCategory {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Agent => "agent",
            Self::Message => "message",
            Self::Collaboration => "collaboration",
            Self::System => "system",
            Self::Session => "session",
            Self::Code => "code",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of event type tags.
///
/// Wire names take the form `category.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    /// A task entered the system.
    #[serde(rename = "task.created")]
    TaskCreated,
    /// A task was handed to an agent.
    #[serde(rename = "task.assigned")]
    TaskAssigned,
    /// An agent began work on a task.
    #[serde(rename = "task.started")]
    TaskStarted,
    /// A task finished successfully.
    #[serde(rename = "task.completed")]
    TaskCompleted,
    /// A task finished unsuccessfully.
    #[serde(rename = "task.failed")]
    TaskFailed,
    /// A task was withdrawn.
    #[serde(rename = "task.cancelled")]
    TaskCancelled,
    /// An agent joined the registry.
    #[serde(rename = "agent.registered")]
    AgentRegistered,
    /// An agent left the registry.
    #[serde(rename = "agent.unregistered")]
    AgentUnregistered,
    /// An agent changed status.
    #[serde(rename = "agent.status_changed")]
    AgentStatusChanged,
    /// A message was sent between agents.
    #[serde(rename = "message.sent")]
    MessageSent,
    /// A collaboration was requested.
    #[serde(rename = "collaboration.requested")]
    CollaborationRequested,
    /// A collaboration finished.
    #[serde(rename = "collaboration.completed")]
    CollaborationCompleted,
    /// Something went wrong inside the system.
    #[serde(rename = "system.error_occurred")]
    ErrorOccurred,
    /// Periodic statistics snapshot.
    #[serde(rename = "system.stats_updated")]
    StatsUpdated,
    /// A user session began.
    #[serde(rename = "session.started")]
    SessionStarted,
    /// A user session ended.
    #[serde(rename = "session.ended")]
    SessionEnded,
    /// An agent produced code.
    #[serde(rename = "code.generated")]
    CodeGenerated,
    /// Code was reviewed.
    #[serde(rename = "code.reviewed")]
    CodeReviewed,
}

impl EventType {
    /// Every event type, in declaration order.
    pub const ALL: [Self; 18] = [
        Self::TaskCreated,
        Self::TaskAssigned,
        Self::TaskStarted,
        Self::TaskCompleted,
        Self::TaskFailed,
        Self::TaskCancelled,
        Self::AgentRegistered,
        Self::AgentUnregistered,
        Self::AgentStatusChanged,
        Self::MessageSent,
        Self::CollaborationRequested,
        Self::CollaborationCompleted,
        Self::ErrorOccurred,
        Self::StatsUpdated,
        Self::SessionStarted,
        Self::SessionEnded,
        Self::CodeGenerated,
        Self::CodeReviewed,
    ];

    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task.created",
            Self::TaskAssigned => "task.assigned",
            Self::TaskStarted => "task.started",
            Self::TaskCompleted => "task.completed",
            Self::TaskFailed => "task.failed",
            Self::TaskCancelled => "task.cancelled",
            Self::AgentRegistered => "agent.registered",
            Self::AgentUnregistered => "agent.unregistered",
            Self::AgentStatusChanged => "agent.status_changed",
            Self::MessageSent => "message.sent",
            Self::CollaborationRequested => "collaboration.requested",
            Self::CollaborationCompleted => "collaboration.completed",
            Self::ErrorOccurred => "system.error_occurred",
            Self::StatsUpdated => "system.stats_updated",
            Self::SessionStarted => "session.started",
            Self::SessionEnded => "session.ended",
            Self::CodeGenerated => "code.generated",
            Self::CodeReviewed => "code.reviewed",
        }
    }

    /// Returns the payload category this type requires.
    #[must_use]
    pub const fn category(self) -> EventCategory {
        match self {
            Self::TaskCreated
            | Self::TaskAssigned
            | Self::TaskStarted
            | Self::TaskCompleted
            | Self::TaskFailed
            | Self::TaskCancelled => EventCategory::Task,
            Self::AgentRegistered | Self::AgentUnregistered | Self::AgentStatusChanged => {
                EventCategory::Agent
            }
            Self::MessageSent => EventCategory::Message,
            Self::CollaborationRequested | Self::CollaborationCompleted => {
                EventCategory::Collaboration
            }
            Self::ErrorOccurred | Self::StatsUpdated => EventCategory::System,
            Self::SessionStarted | Self::SessionEnded => EventCategory::Session,
            Self::CodeGenerated | Self::CodeReviewed => EventCategory::Code,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EventType {
    type Error = ParseEventTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|event_type| event_type.as_str() == normalized)
            .ok_or_else(|| ParseEventTypeError(value.to_owned()))
    }
}
