//! Requirements and constraints attached to a task.

use crate::agent::domain::CapabilitySet;
use serde::{Deserialize, Serialize};

/// Task metadata consulted during agent matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    requirements: CapabilitySet,
    constraints: Vec<String>,
}

impl TaskMetadata {
    /// Creates metadata from capability requirements and free-text
    /// constraints.
    #[must_use]
    pub const fn new(requirements: CapabilitySet, constraints: Vec<String>) -> Self {
        Self {
            requirements,
            constraints,
        }
    }

    /// Returns the capabilities an agent must declare to take the task.
    #[must_use]
    pub const fn requirements(&self) -> &CapabilitySet {
        &self.requirements
    }

    /// Returns free-text constraints passed through to the agent.
    #[must_use]
    pub fn constraints(&self) -> &[String] {
        &self.constraints
    }
}
