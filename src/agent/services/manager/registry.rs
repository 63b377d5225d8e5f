//! Registry and queue owned by the agent event manager.
//!
//! Everything here runs inside the manager's critical section and never
//! awaits.

use crate::agent::domain::{AgentId, AgentState, CapabilitySet};
use crate::agent::ports::Agent;
use crate::event::domain::CorrelationId;
use crate::task::domain::{Task, TaskId, TaskPriority, TaskStatus};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Queue position: highest priority first, then submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) struct QueueKey {
    priority: Reverse<TaskPriority>,
    sequence: u64,
    task_id: TaskId,
}

pub(super) struct AgentRecord {
    pub(super) handle: Arc<dyn Agent>,
    pub(super) state: AgentState,
}

pub(super) struct TaskRecord {
    pub(super) task: Task,
    pub(super) queue_key: QueueKey,
    pub(super) agent_id: Option<AgentId>,
    pub(super) started_at: Option<DateTime<Utc>>,
}

pub(super) struct Collaboration {
    pub(super) initiator: AgentId,
    pub(super) participants: Vec<AgentId>,
    pub(super) topic: String,
}

/// A task handed to an agent during a dispatch pass.
pub(super) struct Assignment {
    pub(super) handle: Arc<dyn Agent>,
    pub(super) agent: AgentState,
    pub(super) task: Task,
}

#[derive(Default)]
pub(super) struct Registry {
    order: Vec<AgentId>,
    agents: HashMap<AgentId, AgentRecord>,
    /// Every submitted task, finished ones included, until pruned.
    tasks: HashMap<TaskId, TaskRecord>,
    queue: BTreeSet<QueueKey>,
    collaborations: HashMap<CorrelationId, Collaboration>,
    next_sequence: u64,
}

impl Registry {
    pub(super) fn contains_agent(&self, id: &AgentId) -> bool {
        self.agents.contains_key(id)
    }

    pub(super) fn insert_agent(&mut self, handle: Arc<dyn Agent>, state: AgentState) {
        self.order.push(state.id().clone());
        self.agents
            .insert(state.id().clone(), AgentRecord { handle, state });
    }

    pub(super) fn remove_agent(&mut self, id: &AgentId) -> Option<AgentRecord> {
        let record = self.agents.remove(id)?;
        self.order.retain(|registered| registered != id);
        Some(record)
    }

    pub(super) fn agent(&self, id: &AgentId) -> Option<&AgentRecord> {
        self.agents.get(id)
    }

    pub(super) fn agent_mut(&mut self, id: &AgentId) -> Option<&mut AgentRecord> {
        self.agents.get_mut(id)
    }

    /// Agent states in registration order.
    pub(super) fn agent_states(&self) -> impl Iterator<Item = &AgentState> {
        self.order
            .iter()
            .filter_map(|id| self.agents.get(id))
            .map(|record| &record.state)
    }

    pub(super) fn contains_task(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Records a pending task at the back of its priority tier.
    ///
    /// Returns `false` and leaves the registry untouched when a task with the
    /// same identifier was already submitted.
    pub(super) fn enqueue(&mut self, task: Task) -> bool {
        if self.tasks.contains_key(&task.id()) {
            return false;
        }
        let queue_key = QueueKey {
            priority: Reverse(task.priority()),
            sequence: self.next_sequence,
            task_id: task.id(),
        };
        self.next_sequence += 1;
        self.queue.insert(queue_key);
        self.tasks.insert(
            task.id(),
            TaskRecord {
                task,
                queue_key,
                agent_id: None,
                started_at: None,
            },
        );
        true
    }

    pub(super) fn dequeue(&mut self, id: TaskId) {
        if let Some(record) = self.tasks.get(&id) {
            self.queue.remove(&record.queue_key);
        }
    }

    pub(super) fn task(&self, id: TaskId) -> Option<&TaskRecord> {
        self.tasks.get(&id)
    }

    pub(super) fn task_mut(&mut self, id: TaskId) -> Option<&mut TaskRecord> {
        self.tasks.get_mut(&id)
    }

    pub(super) fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values().map(|record| &record.task)
    }

    /// Pending tasks in dispatch order.
    pub(super) fn queued_tasks(&self) -> impl Iterator<Item = &Task> {
        self.queue
            .iter()
            .filter_map(|key| self.tasks.get(&key.task_id))
            .map(|record| &record.task)
    }

    pub(super) fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` when `id` names a submitted task that completed.
    pub(super) fn is_completed(&self, id: TaskId) -> bool {
        self.tasks
            .get(&id)
            .is_some_and(|record| record.task.status() == TaskStatus::Completed)
    }

    /// Dependencies of `task` that have completed.
    ///
    /// Unknown dependencies never count as completed.
    pub(super) fn completed_dependencies(&self, task: &Task) -> HashSet<TaskId> {
        task.dependencies()
            .iter()
            .copied()
            .filter(|dependency| self.is_completed(*dependency))
            .collect()
    }

    fn first_available(&self, required: &CapabilitySet) -> Option<AgentId> {
        self.order
            .iter()
            .find(|id| {
                self.agents.get(*id).is_some_and(|record| {
                    record.state.is_available() && record.state.capabilities().covers(required)
                })
            })
            .cloned()
    }

    /// Hands queued tasks to idle agents.
    ///
    /// Tasks are visited in queue order. A task is skipped while any
    /// dependency is incomplete or no idle agent covers its requirements;
    /// each agent takes at most one task.
    pub(super) fn plan_assignments(&mut self, clock: &dyn Clock) -> Vec<Assignment> {
        let mut planned = Vec::new();
        let queued: Vec<QueueKey> = self.queue.iter().copied().collect();
        for key in queued {
            let Some(task) = self.tasks.get(&key.task_id).map(|entry| &entry.task) else {
                self.queue.remove(&key);
                continue;
            };
            if !task
                .incomplete_dependencies(|dependency| self.is_completed(dependency))
                .is_empty()
            {
                continue;
            }
            let Some(agent_id) = self.first_available(task.requirements()) else {
                continue;
            };
            let (Some(record), Some(agent)) =
                (self.tasks.get_mut(&key.task_id), self.agents.get_mut(&agent_id))
            else {
                continue;
            };
            if record.task.transition_to(TaskStatus::Assigned, clock).is_err() {
                continue;
            }
            record.agent_id = Some(agent_id);
            agent
                .state
                .assign(record.task.id(), record.task.complexity(), clock);
            self.queue.remove(&key);
            planned.push(Assignment {
                handle: Arc::clone(&agent.handle),
                agent: agent.state.clone(),
                task: record.task.clone(),
            });
        }
        planned
    }

    /// Drops finished tasks last updated before `cutoff`, keeping those an
    /// unfinished task still depends on.
    pub(super) fn prune_finished(&mut self, cutoff: DateTime<Utc>) -> usize {
        let needed: HashSet<TaskId> = self
            .tasks
            .values()
            .filter(|record| !record.task.is_terminal())
            .flat_map(|record| record.task.dependencies().iter().copied())
            .collect();
        let before = self.tasks.len();
        self.tasks.retain(|id, record| {
            !record.task.is_terminal()
                || record.task.updated_at() >= cutoff
                || needed.contains(id)
        });
        before.saturating_sub(self.tasks.len())
    }

    pub(super) fn open_collaboration(&mut self, id: CorrelationId, collaboration: Collaboration) {
        self.collaborations.insert(id, collaboration);
    }

    pub(super) fn close_collaboration(&mut self, id: CorrelationId) -> Option<Collaboration> {
        self.collaborations.remove(&id)
    }
}
