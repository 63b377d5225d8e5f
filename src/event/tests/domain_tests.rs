//! Unit tests for event type tags, payloads, and filters.

use super::fixtures::Stamped;
use crate::event::domain::{
    CorrelationId, Event, EventCategory, EventFilter, EventSchemaError, EventType,
};
use crate::task::domain::TaskId;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(EventType::TaskCreated, "task.created", EventCategory::Task)]
#[case(EventType::AgentStatusChanged, "agent.status_changed", EventCategory::Agent)]
#[case(EventType::MessageSent, "message.sent", EventCategory::Message)]
#[case(
    EventType::CollaborationCompleted,
    "collaboration.completed",
    EventCategory::Collaboration
)]
#[case(EventType::ErrorOccurred, "system.error_occurred", EventCategory::System)]
#[case(EventType::SessionEnded, "session.ended", EventCategory::Session)]
#[case(EventType::CodeReviewed, "code.reviewed", EventCategory::Code)]
fn event_type_wire_names(
    #[case] event_type: EventType,
    #[case] wire: &str,
    #[case] category: EventCategory,
) {
    assert_eq!(event_type.as_str(), wire);
    assert_eq!(event_type.category(), category);
    assert_eq!(EventType::try_from(wire), Ok(event_type));
    assert_eq!(
        serde_json::to_value(event_type).expect("serializes"),
        json!(wire)
    );
}

#[rstest]
fn event_type_parsing_normalises_case() {
    assert_eq!(
        EventType::try_from("  Task.Completed "),
        Ok(EventType::TaskCompleted)
    );
    assert!(EventType::try_from("task.exploded").is_err());
}

#[rstest]
fn every_type_round_trips_through_its_name() {
    for event_type in EventType::ALL {
        assert_eq!(EventType::try_from(event_type.as_str()), Ok(event_type));
    }
}

#[rstest]
fn task_correlation_id_reuses_the_task_uuid() {
    let task_id = TaskId::new();
    assert_eq!(
        CorrelationId::from(task_id).into_inner(),
        task_id.into_inner()
    );
}

#[rstest]
fn decoded_event_rejects_category_mismatch() {
    let stamped = Stamped::new();
    let event = stamped.session("tests", "s-1");
    let mut encoded = serde_json::to_value(&event).expect("serializes");
    encoded["event_type"] = json!("task.created");

    let err = serde_json::from_value::<Event>(encoded).expect_err("payload is a session payload");

    let expected = EventSchemaError::CategoryMismatch {
        event_type: EventType::TaskCreated,
        expected: EventCategory::Task,
        found: EventCategory::Session,
    };
    assert!(err.to_string().contains(&expected.to_string()));
}

#[rstest]
fn decoded_event_rejects_zero_version() {
    let stamped = Stamped::new();
    let mut encoded = serde_json::to_value(stamped.session("tests", "s-1")).expect("serializes");
    encoded["version"] = json!(0);

    assert!(serde_json::from_value::<Event>(encoded).is_err());
}

#[rstest]
fn serialized_event_round_trips() {
    let stamped = Stamped::new();
    let event = stamped.session("tests", "s-1");

    let encoded = serde_json::to_string(&event).expect("serializes");
    let decoded: Event = serde_json::from_str(&encoded).expect("decodes");

    assert_eq!(decoded, event);
}

#[rstest]
fn filter_criteria_combine() {
    let stamped = Stamped::new();
    let first = stamped.session("alpha", "s-1");
    let second = stamped.session("beta", "s-2");

    let by_source = EventFilter::new().with_source("alpha");
    assert!(by_source.matches(&first));
    assert!(!by_source.matches(&second));

    let by_type = EventFilter::new().with_event_types([EventType::SessionEnded]);
    assert!(!by_type.matches(&first));

    let by_range = EventFilter::new()
        .with_from(second.timestamp())
        .with_to(second.timestamp());
    assert!(!by_range.matches(&first));
    assert!(by_range.matches(&second));

    let by_correlation = EventFilter::new().with_correlation_id(first.correlation_id());
    assert!(by_correlation.matches(&first));
    assert!(!by_correlation.matches(&second));
}

#[rstest]
fn filter_on_target_requires_a_target() {
    let stamped = Stamped::new();
    let untargeted = stamped.session("alpha", "s-1");

    assert!(!EventFilter::new().with_target("beta").matches(&untargeted));
    assert!(EventFilter::new().matches(&untargeted));
}
