//! Unit of work accepted by the swarm coordinator.

use crate::task::domain::{Task, TaskId, TaskStatus};
use crate::validation::{FieldProblem, IssueCollector, ValidationError};
use std::collections::{HashMap, HashSet};

/// A pending task together with the records of the subtasks it lists.
///
/// Subtask records are kept in the order the task lists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwarmJob {
    task: Task,
    subtasks: Vec<Task>,
    completed_dependencies: HashSet<TaskId>,
}

impl SwarmJob {
    /// Pairs `task` with its subtask records.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the task or a subtask is not
    /// pending, a listed subtask has no record, a record is supplied twice,
    /// or a record is not listed by the task.
    ///
    /// # Examples
    ///
    /// ```
    /// use agora::swarm::domain::SwarmJob;
    /// use agora::task::domain::Task;
    /// use mockable::DefaultClock;
    ///
    /// let part = Task::builder("Draft outline").build(&DefaultClock).expect("valid");
    /// let whole = Task::builder("Write report")
    ///     .with_subtasks([part.id()])
    ///     .build(&DefaultClock)
    ///     .expect("valid");
    /// let job = SwarmJob::new(whole, [part]).expect("subtasks match");
    /// assert_eq!(job.subtasks().len(), 1);
    /// ```
    pub fn new(
        task: Task,
        subtasks: impl IntoIterator<Item = Task>,
    ) -> Result<Self, ValidationError> {
        let mut issues = IssueCollector::new();
        if task.status() != TaskStatus::Pending {
            issues.push(
                "status",
                FieldProblem::Invalid(format!("must be pending, found {}", task.status())),
            );
        }

        let listed: HashSet<TaskId> = task.subtasks().iter().copied().collect();
        let mut records: HashMap<TaskId, Task> = HashMap::new();
        for (index, record) in subtasks.into_iter().enumerate() {
            let field = format!("subtask_records[{index}]");
            if !listed.contains(&record.id()) {
                issues.push(field, FieldProblem::Invalid("not listed by the task".to_owned()));
            } else if record.status() != TaskStatus::Pending {
                issues.push(
                    field,
                    FieldProblem::Invalid(format!("must be pending, found {}", record.status())),
                );
            } else if records.contains_key(&record.id()) {
                issues.push(field, FieldProblem::Duplicate);
            } else {
                records.insert(record.id(), record);
            }
        }

        let mut ordered = Vec::with_capacity(task.subtasks().len());
        for (index, id) in task.subtasks().iter().enumerate() {
            match records.remove(id) {
                Some(record) => ordered.push(record),
                None => issues.push(format!("subtasks[{index}]"), FieldProblem::Missing),
            }
        }
        issues.finish()?;

        Ok(Self {
            task,
            subtasks: ordered,
            completed_dependencies: HashSet::new(),
        })
    }

    /// Declares dependencies the caller has already seen complete.
    ///
    /// The coordinator has no task history of its own, so a job whose task
    /// or subtasks depend on anything not declared here fails to start.
    #[must_use]
    pub fn with_completed_dependencies(mut self, ids: impl IntoIterator<Item = TaskId>) -> Self {
        self.completed_dependencies.extend(ids);
        self
    }

    /// Returns the parent task.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Returns the subtask records in listing order.
    #[must_use]
    pub fn subtasks(&self) -> &[Task] {
        &self.subtasks
    }

    /// Returns `true` when `id` was declared complete.
    #[must_use]
    pub fn is_dependency_completed(&self, id: TaskId) -> bool {
        self.completed_dependencies.contains(&id)
    }

    pub(crate) fn into_parts(self) -> (Task, Vec<Task>, HashSet<TaskId>) {
        (self.task, self.subtasks, self.completed_dependencies)
    }
}
