//! Task aggregate root.

use super::{Complexity, TaskDomainError, TaskId, TaskMetadata, TaskPriority, TaskStatus};
use crate::agent::domain::{Capability, CapabilitySet};
use crate::validation::{FieldProblem, IssueCollector, ValidationError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task aggregate root.
///
/// Tasks are created in [`TaskStatus::Pending`] through [`Task::builder`] and
/// only change status through [`Task::transition_to`] and [`Task::start`],
/// which enforce the lifecycle state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    status: TaskStatus,
    priority: TaskPriority,
    dependencies: Vec<TaskId>,
    subtasks: Vec<TaskId>,
    complexity: Complexity,
    metadata: TaskMetadata,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Starts building a task with the given title.
    ///
    /// # Examples
    ///
    /// ```
    /// use agora::task::domain::{Task, TaskPriority, TaskStatus};
    /// use mockable::DefaultClock;
    ///
    /// let task = Task::builder("Write release notes")
    ///     .with_priority(TaskPriority::High)
    ///     .with_requirements(["writing"])
    ///     .build(&DefaultClock)
    ///     .expect("valid task");
    /// assert_eq!(task.status(), TaskStatus::Pending);
    /// ```
    pub fn builder(title: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(title)
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority tier.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the tasks that must complete before this one may start.
    #[must_use]
    pub fn dependencies(&self) -> &[TaskId] {
        &self.dependencies
    }

    /// Returns the subtasks this task decomposes into.
    #[must_use]
    pub fn subtasks(&self) -> &[TaskId] {
        &self.subtasks
    }

    /// Returns the complexity estimate.
    #[must_use]
    pub const fn complexity(&self) -> Complexity {
        self.complexity
    }

    /// Returns requirements and constraints.
    #[must_use]
    pub const fn metadata(&self) -> &TaskMetadata {
        &self.metadata
    }

    /// Shorthand for the capability requirements.
    #[must_use]
    pub const fn requirements(&self) -> &CapabilitySet {
        self.metadata.requirements()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` once the task has reached a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns the dependencies for which `is_completed` is `false`.
    #[must_use]
    pub fn incomplete_dependencies(&self, is_completed: impl Fn(TaskId) -> bool) -> Vec<TaskId> {
        self.dependencies
            .iter()
            .copied()
            .filter(|dependency| !is_completed(*dependency))
            .collect()
    }

    /// Moves the task to `next`.
    ///
    /// Use [`Task::start`] for `InProgress`, which also checks dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] when the state machine
    /// forbids the move, including any move out of a terminal status.
    pub fn transition_to(
        &mut self,
        next: TaskStatus,
        clock: &dyn Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(TaskDomainError::InvalidTransition {
                task_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch(clock);
        Ok(())
    }

    /// Moves an assigned task to `InProgress`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DependenciesIncomplete`] when any dependency
    /// has not completed, or [`TaskDomainError::InvalidTransition`] when the
    /// task is not assigned.
    pub fn start(
        &mut self,
        is_completed: impl Fn(TaskId) -> bool,
        clock: &dyn Clock,
    ) -> Result<(), TaskDomainError> {
        let incomplete = self.incomplete_dependencies(is_completed);
        if !incomplete.is_empty() {
            return Err(TaskDomainError::DependenciesIncomplete {
                task_id: self.id,
                incomplete,
            });
        }
        self.transition_to(TaskStatus::InProgress, clock)
    }

    fn touch(&mut self, clock: &dyn Clock) {
        self.updated_at = clock.utc();
    }
}

/// Builder for [`Task`] values.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct TaskBuilder {
    id: Option<TaskId>,
    title: String,
    description: String,
    priority: TaskPriority,
    dependencies: Vec<TaskId>,
    subtasks: Vec<TaskId>,
    complexity: u8,
    requirements: Vec<String>,
    constraints: Vec<String>,
}

impl TaskBuilder {
    fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            priority: TaskPriority::default(),
            dependencies: Vec::new(),
            subtasks: Vec::new(),
            complexity: Complexity::MIN,
            requirements: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Uses a caller-chosen identifier instead of a random one.
    pub const fn with_id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the priority tier.
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the tasks that must complete first.
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Sets the subtasks this task decomposes into.
    pub fn with_subtasks(mut self, subtasks: impl IntoIterator<Item = TaskId>) -> Self {
        self.subtasks = subtasks.into_iter().collect();
        self
    }

    /// Sets the complexity estimate in points (`1..=10`).
    pub const fn with_complexity(mut self, points: u8) -> Self {
        self.complexity = points;
        self
    }

    /// Sets the capability tags an agent must declare.
    pub fn with_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements = requirements.into_iter().map(Into::into).collect();
        self
    }

    /// Sets free-text constraints.
    pub fn with_constraints<I, S>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints = constraints.into_iter().map(Into::into).collect();
        self
    }

    /// Validates the collected fields and builds a pending task.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every rejected field: a blank
    /// title, a complexity outside `1..=10`, malformed requirement tags, or a
    /// task that lists itself as a dependency or subtask.
    pub fn build(self, clock: &dyn Clock) -> Result<Task, ValidationError> {
        let Self {
            id,
            title,
            description,
            priority,
            dependencies,
            subtasks,
            complexity,
            requirements,
            constraints,
        } = self;

        let mut issues = IssueCollector::new();
        issues.require_text("title", &title);

        let estimate = Complexity::new(complexity);
        if estimate.is_none() {
            issues.push(
                "complexity",
                FieldProblem::Invalid(format!(
                    "must be between {} and {}",
                    Complexity::MIN,
                    Complexity::MAX
                )),
            );
        }

        let mut required = CapabilitySet::default();
        for (index, raw) in requirements.into_iter().enumerate() {
            match Capability::new(raw) {
                Ok(capability) => required.insert(capability),
                Err(err) => issues.push(
                    format!("metadata.requirements[{index}]"),
                    FieldProblem::Invalid(err.to_string()),
                ),
            }
        }

        let task_id = id.unwrap_or_default();
        if dependencies.contains(&task_id) {
            issues.push(
                "dependencies",
                FieldProblem::Invalid("task cannot depend on itself".to_owned()),
            );
        }
        if subtasks.contains(&task_id) {
            issues.push(
                "subtasks",
                FieldProblem::Invalid("task cannot be its own subtask".to_owned()),
            );
        }
        issues.finish()?;

        let timestamp = clock.utc();
        Ok(Task {
            id: task_id,
            title: title.trim().to_owned(),
            description,
            status: TaskStatus::Pending,
            priority,
            dependencies,
            subtasks,
            complexity: estimate.unwrap_or_default(),
            metadata: TaskMetadata::new(required, constraints),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }
}
