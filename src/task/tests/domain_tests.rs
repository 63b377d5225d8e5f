//! Domain-focused tests for task construction and value types.

use crate::agent::domain::Capability;
use crate::task::domain::{Complexity, Task, TaskId, TaskPriority, TaskStatus};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

#[rstest]
fn builder_creates_pending_task_with_defaults(clock: DefaultClock) {
    let task = Task::builder("  Summarise the incident  ")
        .build(&clock)
        .expect("valid task");

    assert_eq!(task.title(), "Summarise the incident");
    assert_eq!(task.status(), TaskStatus::Pending);
    assert_eq!(task.priority(), TaskPriority::Medium);
    assert_eq!(task.complexity().points(), 1);
    assert!(task.requirements().is_empty());
    assert_eq!(task.created_at(), task.updated_at());
}

#[rstest]
fn builder_normalises_requirements(clock: DefaultClock) {
    let task = Task::builder("Review the patch")
        .with_requirements(["Code_Review", "rust", "rust"])
        .with_constraints(["no new dependencies"])
        .build(&clock)
        .expect("valid task");

    let tags: Vec<&str> = task.requirements().iter().map(Capability::as_str).collect();
    assert_eq!(tags, vec!["code_review", "rust"]);
    assert_eq!(task.metadata().constraints(), ["no new dependencies"]);
}

#[rstest]
fn builder_reports_every_invalid_field(clock: DefaultClock) {
    let err = Task::builder("   ")
        .with_complexity(11)
        .with_requirements(["ok", "not valid!"])
        .build(&clock)
        .expect_err("three fields are invalid");

    assert_eq!(err.issues().len(), 3);
    assert!(err.has_field("title"));
    assert!(err.has_field("complexity"));
    assert!(err.has_field("metadata.requirements[1]"));
}

#[rstest]
fn builder_rejects_self_dependency(clock: DefaultClock) {
    let id = TaskId::new();
    let err = Task::builder("Loop")
        .with_id(id)
        .with_dependencies([id])
        .with_subtasks([id])
        .build(&clock)
        .expect_err("task references itself");

    assert!(err.has_field("dependencies"));
    assert!(err.has_field("subtasks"));
}

#[rstest]
#[case(0, false)]
#[case(1, true)]
#[case(10, true)]
#[case(11, false)]
fn complexity_bounds(#[case] points: u8, #[case] expected_ok: bool) {
    assert_eq!(Complexity::new(points).is_some(), expected_ok);
}

#[rstest]
fn complexity_deserialisation_enforces_range() {
    let valid: Complexity = serde_json::from_str("7").expect("in range");
    assert_eq!(valid.points(), 7);
    assert!(serde_json::from_str::<Complexity>("42").is_err());
}

#[rstest]
fn priority_orders_critical_highest() {
    let mut priorities = vec![
        TaskPriority::High,
        TaskPriority::Low,
        TaskPriority::Critical,
        TaskPriority::Medium,
    ];
    priorities.sort_unstable();
    assert_eq!(
        priorities,
        vec![
            TaskPriority::Low,
            TaskPriority::Medium,
            TaskPriority::High,
            TaskPriority::Critical,
        ]
    );
}

#[rstest]
#[case("low", TaskPriority::Low)]
#[case(" HIGH ", TaskPriority::High)]
#[case("critical", TaskPriority::Critical)]
fn priority_parses_storage_values(#[case] raw: &str, #[case] expected: TaskPriority) {
    assert_eq!(TaskPriority::try_from(raw), Ok(expected));
}

#[rstest]
fn task_round_trips_through_json(clock: DefaultClock) {
    let task = Task::builder("Persist me")
        .with_priority(TaskPriority::High)
        .with_complexity(4)
        .with_requirements(["storage"])
        .build(&clock)
        .expect("valid task");

    let json = serde_json::to_string(&task).expect("serialise task");
    let decoded: Task = serde_json::from_str(&json).expect("deserialise task");

    assert_eq!(decoded, task);
}
