//! Derived system statistics.

use super::{AgentState, AgentStatus};
use crate::task::domain::{Task, TaskStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time snapshot derived from the registry and task table.
///
/// Never cached or persisted; recompute it whenever it is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    total_agents: usize,
    agents_by_status: BTreeMap<AgentStatus, usize>,
    tasks_by_status: BTreeMap<TaskStatus, usize>,
    queue_depth: usize,
    completed_tasks: usize,
    failed_tasks: usize,
    mean_success_rate: f64,
    throughput_per_minute: f64,
    computed_at: DateTime<Utc>,
}

impl SystemStats {
    /// Computes statistics from the current registry contents.
    ///
    /// `uptime` is the time since the owning manager started and is floored
    /// at one second when computing throughput. With no agents the mean
    /// success rate is `0.0`.
    #[must_use]
    pub fn compute<'a>(
        agents: impl IntoIterator<Item = &'a AgentState>,
        tasks: impl IntoIterator<Item = &'a Task>,
        queue_depth: usize,
        uptime: Duration,
        computed_at: DateTime<Utc>,
    ) -> Self {
        let mut agents_by_status: BTreeMap<AgentStatus, usize> =
            AgentStatus::ALL.into_iter().map(|status| (status, 0)).collect();
        let mut total_agents = 0_usize;
        let mut success_sum = 0.0_f64;
        for agent in agents {
            total_agents += 1;
            success_sum += agent.metrics().success_rate();
            *agents_by_status.entry(agent.status()).or_default() += 1;
        }

        let mut tasks_by_status: BTreeMap<TaskStatus, usize> = BTreeMap::new();
        for task in tasks {
            *tasks_by_status.entry(task.status()).or_default() += 1;
        }
        let completed_tasks = tasks_by_status
            .get(&TaskStatus::Completed)
            .copied()
            .unwrap_or_default();
        let failed_tasks = tasks_by_status
            .get(&TaskStatus::Failed)
            .copied()
            .unwrap_or_default();

        let mean_success_rate = if total_agents == 0 {
            0.0
        } else {
            success_sum / count_as_f64(total_agents)
        };
        let uptime_secs = u32::try_from(uptime.num_seconds().max(1)).unwrap_or(u32::MAX);
        let throughput_per_minute = count_as_f64(completed_tasks) * 60.0 / f64::from(uptime_secs);

        Self {
            total_agents,
            agents_by_status,
            tasks_by_status,
            queue_depth,
            completed_tasks,
            failed_tasks,
            mean_success_rate,
            throughput_per_minute,
            computed_at,
        }
    }

    /// Returns the number of registered agents.
    #[must_use]
    pub const fn total_agents(&self) -> usize {
        self.total_agents
    }

    /// Returns how many agents are in `status`.
    #[must_use]
    pub fn agents_with_status(&self, status: AgentStatus) -> usize {
        self.agents_by_status.get(&status).copied().unwrap_or_default()
    }

    /// Returns how many known tasks are in `status`.
    #[must_use]
    pub fn tasks_with_status(&self, status: TaskStatus) -> usize {
        self.tasks_by_status.get(&status).copied().unwrap_or_default()
    }

    /// Returns agent counts keyed by status.
    #[must_use]
    pub const fn agents_by_status(&self) -> &BTreeMap<AgentStatus, usize> {
        &self.agents_by_status
    }

    /// Returns task counts keyed by status.
    #[must_use]
    pub const fn tasks_by_status(&self) -> &BTreeMap<TaskStatus, usize> {
        &self.tasks_by_status
    }

    /// Returns the number of tasks waiting for an agent.
    #[must_use]
    pub const fn queue_depth(&self) -> usize {
        self.queue_depth
    }

    /// Returns the number of completed tasks.
    #[must_use]
    pub const fn completed_tasks(&self) -> usize {
        self.completed_tasks
    }

    /// Returns the number of failed tasks.
    #[must_use]
    pub const fn failed_tasks(&self) -> usize {
        self.failed_tasks
    }

    /// Mean of the agents' success rates.
    #[must_use]
    pub const fn mean_success_rate(&self) -> f64 {
        self.mean_success_rate
    }

    /// Completed tasks per minute of uptime.
    #[must_use]
    pub const fn throughput_per_minute(&self) -> f64 {
        self.throughput_per_minute
    }

    /// Returns when the snapshot was taken.
    #[must_use]
    pub const fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }
}

fn count_as_f64(count: usize) -> f64 {
    f64::from(u32::try_from(count).unwrap_or(u32::MAX))
}
