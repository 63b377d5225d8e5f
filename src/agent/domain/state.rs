//! Registry-owned agent state.

use super::{AgentId, AgentRole, AgentStatus, CapabilitySet, PerformanceMetrics};
use crate::task::domain::{Complexity, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Maximum workload percentage.
const MAX_WORKLOAD: u8 = 100;

/// Snapshot of one registered agent.
///
/// Instances are created and mutated only by the registries in this crate;
/// callers receive clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    id: AgentId,
    role: AgentRole,
    capabilities: CapabilitySet,
    status: AgentStatus,
    metrics: PerformanceMetrics,
    last_active: DateTime<Utc>,
    /// Sum of the workload shares currently reserved, unclamped.
    reserved: u32,
    current_task: Option<TaskId>,
}

impl AgentState {
    pub(crate) fn new(
        id: AgentId,
        role: AgentRole,
        capabilities: CapabilitySet,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            id,
            role,
            capabilities,
            status: AgentStatus::Idle,
            metrics: PerformanceMetrics::default(),
            last_active: clock.utc(),
            reserved: 0,
            current_task: None,
        }
    }

    /// Returns the agent identifier.
    #[must_use]
    pub const fn id(&self) -> &AgentId {
        &self.id
    }

    /// Returns the role tag.
    #[must_use]
    pub const fn role(&self) -> &AgentRole {
        &self.role
    }

    /// Returns the declared capabilities.
    #[must_use]
    pub const fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// Returns the performance counters.
    #[must_use]
    pub const fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Returns when the agent last changed state.
    #[must_use]
    pub const fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Returns the workload percentage in `[0, 100]`.
    #[must_use]
    pub fn workload(&self) -> u8 {
        u8::try_from(self.reserved)
            .unwrap_or(MAX_WORKLOAD)
            .min(MAX_WORKLOAD)
    }

    /// Returns the sum of reserved workload shares, which may exceed 100.
    #[must_use]
    pub(crate) const fn reserved_workload(&self) -> u32 {
        self.reserved
    }

    /// Returns the task the agent currently holds.
    #[must_use]
    pub const fn current_task(&self) -> Option<TaskId> {
        self.current_task
    }

    /// Returns `true` when the agent can take a new task.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.status.is_idle() && self.current_task.is_none()
    }

    pub(crate) fn assign(&mut self, task_id: TaskId, complexity: Complexity, clock: &dyn Clock) {
        self.current_task = Some(task_id);
        self.add_workload(complexity);
        self.set_status(AgentStatus::Working, clock);
    }

    /// Drops the held task and returns the agent to idle.
    pub(crate) fn release(&mut self, complexity: Complexity, clock: &dyn Clock) {
        self.current_task = None;
        self.remove_workload(complexity);
        self.set_status(AgentStatus::Idle, clock);
    }

    pub(crate) fn add_workload(&mut self, complexity: Complexity) {
        self.reserved = self
            .reserved
            .saturating_add(u32::from(complexity.workload_share()));
    }

    pub(crate) fn remove_workload(&mut self, complexity: Complexity) {
        self.reserved = self
            .reserved
            .saturating_sub(u32::from(complexity.workload_share()));
    }

    /// Sets the status and returns the previous one.
    pub(crate) fn set_status(&mut self, status: AgentStatus, clock: &dyn Clock) -> AgentStatus {
        let previous = self.status;
        self.status = status;
        self.last_active = clock.utc();
        previous
    }

    pub(crate) const fn metrics_mut(&mut self) -> &mut PerformanceMetrics {
        &mut self.metrics
    }
}
