//! Unit tests for event construction and payload validation.

use super::fixtures::Stamped;
use crate::agent::domain::{AgentId, AgentRole, AgentStatus};
use crate::event::domain::{
    CollaborationPayload, CorrelationId, EventPayload, EventType, MessagePayload, TaskPayload,
};
use crate::task::domain::{Task, TaskId, TaskPriority, TaskStatus};
use crate::validation::FieldProblem;
use mockable::Clock;
use rstest::rstest;
use serde_json::json;

fn agent(id: &str) -> AgentId {
    AgentId::new(id).expect("valid agent id")
}

fn task_payload(status: TaskStatus) -> TaskPayload {
    TaskPayload {
        task_id: TaskId::new(),
        title: "Write release notes".to_owned(),
        status,
        priority: TaskPriority::Medium,
        agent_id: None,
        result: None,
        error: None,
    }
}

#[rstest]
fn build_stamps_identity_and_clock_time() {
    let stamped = Stamped::new();
    let now = stamped.clock.utc();

    let event = stamped
        .factory
        .message(
            " chat ",
            MessagePayload {
                sender: agent("writer"),
                recipient: None,
                content: "hello".to_owned(),
            },
        )
        .with_metadata("trace", json!("abc"))
        .build()
        .expect("valid message");

    assert_eq!(event.event_type(), EventType::MessageSent);
    assert_eq!(event.source(), "chat");
    assert_eq!(event.timestamp(), now);
    assert_eq!(event.version(), 1);
    assert_eq!(event.metadata().get("trace"), Some(&json!("abc")));
}

#[rstest]
fn task_events_correlate_by_task_id() {
    let stamped = Stamped::new();
    let payload = task_payload(TaskStatus::Pending);
    let task_id = payload.task_id;

    let event = stamped
        .factory
        .task(EventType::TaskCreated, "manager", payload)
        .build()
        .expect("valid task event");

    assert_eq!(event.correlation_id(), CorrelationId::from(task_id));
}

#[rstest]
fn task_snapshot_copies_task_fields() {
    let stamped = Stamped::new();
    let task = Task::builder("Triage bug")
        .with_priority(TaskPriority::High)
        .build(stamped.clock.as_ref())
        .expect("valid task");

    let event = stamped
        .factory
        .task_snapshot(EventType::TaskCreated, "manager", &task)
        .build()
        .expect("valid snapshot");

    let payload = event.payload().as_task().expect("task payload");
    assert_eq!(payload.task_id, task.id());
    assert_eq!(payload.title, "Triage bug");
    assert_eq!(payload.priority, TaskPriority::High);
    assert_eq!(payload.status, TaskStatus::Pending);
}

#[rstest]
#[case(EventType::TaskAssigned, TaskStatus::Pending)]
#[case(EventType::TaskStarted, TaskStatus::Assigned)]
#[case(EventType::TaskCompleted, TaskStatus::InProgress)]
#[case(EventType::TaskCancelled, TaskStatus::Failed)]
fn task_event_status_must_match_type(#[case] event_type: EventType, #[case] status: TaskStatus) {
    let stamped = Stamped::new();
    let mut payload = task_payload(status);
    payload.agent_id = Some(agent("worker"));

    let err = stamped
        .factory
        .task(event_type, "manager", payload)
        .build()
        .expect_err("status disagrees with the event type");

    assert!(err.has_field("payload.status"));
}

#[rstest]
fn assigned_event_requires_an_agent() {
    let stamped = Stamped::new();
    let err = stamped
        .factory
        .task(
            EventType::TaskAssigned,
            "manager",
            task_payload(TaskStatus::Assigned),
        )
        .build()
        .expect_err("agent is missing");

    assert!(err.has_field("payload.agent_id"));
}

#[rstest]
fn failed_event_requires_a_reason() {
    let stamped = Stamped::new();
    let mut payload = task_payload(TaskStatus::Failed);
    payload.error = Some("  ".to_owned());

    let err = stamped
        .factory
        .task(EventType::TaskFailed, "manager", payload)
        .build()
        .expect_err("reason is blank");

    assert!(err.has_field("payload.error"));
}

#[rstest]
fn build_reports_every_problem_at_once() {
    let stamped = Stamped::new();
    let mut payload = task_payload(TaskStatus::Pending);
    payload.title = String::new();

    let err = stamped
        .factory
        .task(EventType::TaskStarted, "  ", payload)
        .with_target(" ")
        .with_version(0)
        .build()
        .expect_err("many fields are invalid");

    for field in [
        "source",
        "target",
        "version",
        "payload.title",
        "payload.status",
        "payload.agent_id",
    ] {
        assert!(err.has_field(field), "expected an issue for {field}");
    }
}

#[rstest]
fn status_change_requires_previous_status() {
    let stamped = Stamped::new();
    let event = stamped
        .factory
        .agent_status_changed(
            "manager",
            agent("worker"),
            AgentRole::new("coder").expect("valid role"),
            AgentStatus::Idle,
            AgentStatus::Working,
        )
        .build()
        .expect("valid status change");

    let payload = event.payload().as_agent().expect("agent payload");
    assert_eq!(payload.previous_status, Some(AgentStatus::Idle));
    assert_eq!(payload.status, AgentStatus::Working);
}

#[rstest]
fn completed_collaboration_requires_a_verdict() {
    let stamped = Stamped::new();
    let err = stamped
        .factory
        .collaboration(
            EventType::CollaborationCompleted,
            "manager",
            CollaborationPayload {
                initiator: agent("lead"),
                participants: Vec::new(),
                topic: "schema".to_owned(),
                succeeded: None,
                outcome: None,
            },
        )
        .build()
        .expect_err("participants and verdict are missing");

    assert!(err.has_field("payload.participants"));
    assert!(err.has_field("payload.succeeded"));
}

#[rstest]
fn system_error_carries_details() {
    let stamped = Stamped::new();
    let event = stamped
        .factory
        .system_error("bus", "handler failed", json!({ "attempts": 4 }))
        .build()
        .expect("valid error event");

    assert_eq!(event.event_type(), EventType::ErrorOccurred);
    let payload = event.payload().as_system().expect("system payload");
    assert_eq!(payload.details["attempts"], json!(4));
}

#[rstest]
fn from_json_decodes_a_valid_payload() {
    let stamped = Stamped::new();
    let event = stamped
        .factory
        .from_json(
            EventType::CodeReviewed,
            "reviewer",
            json!({ "language": "rust", "content": "fn main() {}", "approved": true }),
        )
        .expect("schema matches")
        .build()
        .expect("valid code event");

    let EventPayload::Code(code) = event.payload() else {
        panic!("expected a code payload");
    };
    assert_eq!(code.approved, Some(true));
}

#[rstest]
#[case(json!("not an object"), "payload")]
#[case(json!({ "severity": "error" }), "payload.message")]
#[case(json!({ "severity": 3, "message": "boom" }), "payload.severity")]
fn from_json_names_offending_fields(#[case] payload: serde_json::Value, #[case] field: &str) {
    let stamped = Stamped::new();
    let err = stamped
        .factory
        .from_json(EventType::ErrorOccurred, "tests", payload)
        .expect_err("payload violates the schema");

    assert!(err.has_field(field));
}

#[rstest]
fn from_json_rejects_unknown_enum_values() {
    let stamped = Stamped::new();
    let err = stamped
        .factory
        .from_json(
            EventType::ErrorOccurred,
            "tests",
            json!({ "severity": "apocalyptic", "message": "boom" }),
        )
        .expect_err("severity is not a known level");

    assert!(matches!(
        err.issues().first().map(crate::validation::FieldIssue::problem),
        Some(FieldProblem::Invalid(_))
    ));
}
