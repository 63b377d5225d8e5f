//! Unit tests for task state transition validation.

use crate::task::domain::{Task, TaskDomainError, TaskId, TaskStatus};
use eyre::ensure;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

#[fixture]
fn pending_task(clock: DefaultClock) -> Task {
    Task::builder("State transition test")
        .build(&clock)
        .expect("valid task")
}

#[rstest]
#[case(TaskStatus::Pending, TaskStatus::Assigned, true)]
#[case(TaskStatus::Pending, TaskStatus::InProgress, false)]
#[case(TaskStatus::Pending, TaskStatus::Completed, false)]
#[case(TaskStatus::Pending, TaskStatus::Failed, true)]
#[case(TaskStatus::Pending, TaskStatus::Cancelled, true)]
#[case(TaskStatus::Assigned, TaskStatus::Pending, false)]
#[case(TaskStatus::Assigned, TaskStatus::InProgress, true)]
#[case(TaskStatus::Assigned, TaskStatus::Completed, false)]
#[case(TaskStatus::Assigned, TaskStatus::Failed, true)]
#[case(TaskStatus::Assigned, TaskStatus::Cancelled, true)]
#[case(TaskStatus::InProgress, TaskStatus::Assigned, false)]
#[case(TaskStatus::InProgress, TaskStatus::Completed, true)]
#[case(TaskStatus::InProgress, TaskStatus::Failed, true)]
#[case(TaskStatus::InProgress, TaskStatus::Cancelled, true)]
#[case(TaskStatus::Completed, TaskStatus::Failed, false)]
#[case(TaskStatus::Completed, TaskStatus::Pending, false)]
#[case(TaskStatus::Failed, TaskStatus::InProgress, false)]
#[case(TaskStatus::Cancelled, TaskStatus::Assigned, false)]
fn can_transition_to_returns_expected(
    #[case] from: TaskStatus,
    #[case] to: TaskStatus,
    #[case] expected: bool,
) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[rstest]
#[case(TaskStatus::Pending, false)]
#[case(TaskStatus::Assigned, false)]
#[case(TaskStatus::InProgress, false)]
#[case(TaskStatus::Completed, true)]
#[case(TaskStatus::Failed, true)]
#[case(TaskStatus::Cancelled, true)]
fn is_terminal_returns_expected(#[case] status: TaskStatus, #[case] expected: bool) {
    assert_eq!(status.is_terminal(), expected);
}

#[rstest]
fn full_lifecycle_reaches_completed(clock: DefaultClock, pending_task: Task) -> eyre::Result<()> {
    let mut task = pending_task;
    let created_at = task.updated_at();

    task.transition_to(TaskStatus::Assigned, &clock)?;
    task.start(|_| true, &clock)?;
    task.transition_to(TaskStatus::Completed, &clock)?;

    ensure!(task.status() == TaskStatus::Completed);
    ensure!(task.is_terminal());
    ensure!(task.updated_at() >= created_at);
    Ok(())
}

#[rstest]
fn pending_task_cannot_complete(clock: DefaultClock, pending_task: Task) {
    let mut task = pending_task;
    let task_id = task.id();

    let result = task.transition_to(TaskStatus::Completed, &clock);

    assert_eq!(
        result,
        Err(TaskDomainError::InvalidTransition {
            task_id,
            from: TaskStatus::Pending,
            to: TaskStatus::Completed,
        })
    );
    assert_eq!(task.status(), TaskStatus::Pending);
}

#[rstest]
fn terminal_status_is_final(clock: DefaultClock, pending_task: Task) {
    let mut task = pending_task;
    task.transition_to(TaskStatus::Cancelled, &clock)
        .expect("pending tasks can be cancelled");

    for next in [
        TaskStatus::Pending,
        TaskStatus::Assigned,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ] {
        assert!(task.transition_to(next, &clock).is_err());
    }
    assert_eq!(task.status(), TaskStatus::Cancelled);
}

#[rstest]
fn start_refuses_incomplete_dependencies(clock: DefaultClock) {
    let done = TaskId::new();
    let open = TaskId::new();
    let mut task = Task::builder("Depends on others")
        .with_dependencies([done, open])
        .build(&clock)
        .expect("valid task");
    task.transition_to(TaskStatus::Assigned, &clock)
        .expect("pending tasks can be assigned");

    let result = task.start(|id| id == done, &clock);

    assert_eq!(
        result,
        Err(TaskDomainError::DependenciesIncomplete {
            task_id: task.id(),
            incomplete: vec![open],
        })
    );
    assert_eq!(task.status(), TaskStatus::Assigned);
}
