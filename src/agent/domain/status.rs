//! Agent activity status.

use super::ParseAgentStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an agent is currently doing.
///
/// `Idle` is the rest state every other status eventually returns to; only
/// idle agents receive new task assignments.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Available for work.
    #[default]
    Idle,
    /// Planning before acting.
    Thinking,
    /// Executing an assigned task.
    Working,
    /// Blocked on an external party.
    Waiting,
    /// Engaged in a collaboration with other agents.
    Collaborating,
}

impl AgentStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Idle,
        Self::Thinking,
        Self::Working,
        Self::Waiting,
        Self::Collaborating,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Thinking => "thinking",
            Self::Working => "working",
            Self::Waiting => "waiting",
            Self::Collaborating => "collaborating",
        }
    }

    /// Returns `true` for the rest state.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AgentStatus {
    type Error = ParseAgentStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "idle" => Ok(Self::Idle),
            "thinking" => Ok(Self::Thinking),
            "working" => Ok(Self::Working),
            "waiting" => Ok(Self::Waiting),
            "collaborating" => Ok(Self::Collaborating),
            _ => Err(ParseAgentStatusError(value.to_owned())),
        }
    }
}
