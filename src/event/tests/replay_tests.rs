//! Unit tests for replaying stored history.

use super::fixtures::Stamped;
use crate::event::adapters::InMemoryEventStore;
use crate::event::domain::{Event, EventFilter, EventPayload, EventType, SessionPayload};
use crate::event::ports::EventStore;
use crate::event::services::bus::{HandlerError, SubscribeOptions};
use crate::event::services::{EventBusConfig, ReplayStatus};
use crate::test_support::immediate_bus_with;
use chrono::Duration;
use rstest::rstest;
use std::future::ready;
use std::sync::{Arc, Mutex};

#[rstest]
#[tokio::test]
async fn replay_redelivers_the_selected_window_once() {
    let stamped = Stamped::new();
    let store = Arc::new(InMemoryEventStore::new());
    let bus = immediate_bus_with(
        Arc::clone(&store),
        stamped.shared_clock(),
        EventBusConfig::default(),
    );
    let before = stamped.session("tests", "before");
    let inside = stamped.session("tests", "inside");
    let ended = stamped
        .factory
        .session(
            EventType::SessionEnded,
            "tests",
            SessionPayload {
                session_id: "ended".to_owned(),
                user: None,
                summary: Some("done".to_owned()),
            },
        )
        .build()
        .expect("valid session event");
    stamped.clock.advance(Duration::seconds(1));
    let after = stamped.session("tests", "after");
    for event in [&before, &inside, &ended, &after] {
        bus.publish(event.clone()).await.expect("publish succeeds");
    }
    let replayed: Arc<Mutex<Vec<String>>> = Arc::default();
    let log = Arc::clone(&replayed);
    bus.subscribe(
        EventType::SessionStarted,
        move |event: Event| {
            if let EventPayload::Session(session) = event.payload() {
                log.lock()
                    .expect("replay log")
                    .push(session.session_id.clone());
            }
            ready(Ok::<(), HandlerError>(()))
        },
        SubscribeOptions::new(),
    );

    let job = bus.replay(
        inside.timestamp(),
        ended.timestamp(),
        [EventType::SessionStarted],
    );
    let status = job.wait().await;

    assert_eq!(status, ReplayStatus::Completed);
    assert_eq!(*replayed.lock().expect("replay log"), vec!["inside"]);
    let progress = job.progress();
    assert_eq!((progress.processed, progress.total), (1, 1));
    assert!(job.errors().is_empty());
    assert_eq!(store.len(), 4);
}

#[rstest]
#[tokio::test]
async fn replay_collects_handler_errors_without_failing() {
    let stamped = Stamped::new();
    let store = Arc::new(InMemoryEventStore::new());
    let bus = immediate_bus_with(
        Arc::clone(&store),
        stamped.shared_clock(),
        EventBusConfig::default().with_max_retries(0),
    );
    let first = stamped.session("tests", "one");
    let last = stamped.session("tests", "two");
    bus.publish(first.clone()).await.expect("publish one");
    bus.publish(last.clone()).await.expect("publish two");
    bus.subscribe(
        EventType::SessionStarted,
        |_event: Event| ready(Err(HandlerError::new("still broken"))),
        SubscribeOptions::new(),
    );

    let job = bus.replay(first.timestamp(), last.timestamp(), []);

    assert_eq!(job.wait().await, ReplayStatus::Completed);
    assert_eq!(job.progress().processed, 2);
    assert_eq!(job.errors().len(), 2);
    assert!(
        job.errors()
            .iter()
            .all(|message| message.contains("still broken"))
    );
    let errors = store
        .get_events(&EventFilter::new().with_event_types([EventType::ErrorOccurred]))
        .await
        .expect("query succeeds");
    assert_eq!(errors.count(), 0);
}

#[rstest]
#[tokio::test]
async fn replay_of_an_empty_window_completes() {
    let stamped = Stamped::new();
    let bus = immediate_bus_with(
        Arc::new(InMemoryEventStore::new()),
        stamped.shared_clock(),
        EventBusConfig::default(),
    );
    let now = stamped.session("tests", "unused").timestamp();

    let job = bus.replay(now, now + Duration::hours(1), []);

    assert_eq!(job.wait().await, ReplayStatus::Completed);
    assert_eq!(job.progress().total, 0);
}

#[rstest]
fn replay_without_a_runtime_fails_immediately() {
    let stamped = Stamped::new();
    let bus = immediate_bus_with(
        Arc::new(InMemoryEventStore::new()),
        stamped.shared_clock(),
        EventBusConfig::default(),
    );
    let now = stamped.session("tests", "unused").timestamp();

    let job = bus.replay(now, now, []);

    assert_eq!(job.status(), ReplayStatus::Failed);
    assert_eq!(job.errors().len(), 1);
}
