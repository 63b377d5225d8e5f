//! Durable journal behaviour across process restarts.

use crate::test_helpers::{EchoAgent, immediate_bus, system_clock};
use agora::agent::services::{AgentEventManager, ManagerConfig};
use agora::event::adapters::JsonlEventStore;
use agora::event::domain::{CorrelationId, Event, EventFilter, EventType, SessionPayload};
use agora::event::ports::EventStore;
use agora::event::services::bus::{HandlerError, SubscribeOptions};
use agora::event::services::{EventBus, EventBusConfig, EventFactory};
use agora::task::domain::{Task, TaskPriority};
use camino::Utf8PathBuf;
use chrono::Utc;
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

struct Journal {
    _dir: TempDir,
    path: Utf8PathBuf,
}

impl Journal {
    fn open(&self) -> Arc<JsonlEventStore> {
        Arc::new(JsonlEventStore::open(&self.path).expect("journal opens"))
    }
}

#[fixture]
fn journal() -> Journal {
    let dir = TempDir::new().expect("temporary directory");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("events.jsonl"))
        .expect("utf-8 temporary path");
    Journal { _dir: dir, path }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_history_survives_a_restart(journal: Journal) {
    let store = journal.open();
    let manager = AgentEventManager::new(immediate_bus(store), ManagerConfig::default());
    manager
        .register_agent(EchoAgent::new("scribe", "writer", &["writing"]).shared())
        .await
        .expect("agent registers");
    let task = Task::builder("Draft the changelog")
        .with_priority(TaskPriority::High)
        .with_requirements(["writing"])
        .build(&mockable::DefaultClock)
        .expect("valid task");
    let task_id = manager.submit_task(task).await.expect("task submitted");
    manager.shutdown().await;
    manager.bus().shutdown().await;

    let reopened = journal.open();
    let chain = reopened
        .get_events_by_correlation_id(CorrelationId::from(task_id))
        .await
        .expect("query succeeds");

    let kinds: Vec<EventType> = chain.iter().map(Event::event_type).collect();
    assert_eq!(
        kinds,
        vec![
            EventType::TaskCreated,
            EventType::TaskAssigned,
            EventType::TaskStarted,
            EventType::TaskCompleted,
        ]
    );
    let registrations: Vec<Event> = reopened
        .get_events(&EventFilter::new().with_event_types([EventType::AgentRegistered]))
        .await
        .expect("query succeeds")
        .collect();
    assert_eq!(registrations.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn batched_events_are_journaled_before_delivery(journal: Journal) {
    let store = journal.open();
    let bus = EventBus::new(
        Arc::clone(&store) as Arc<dyn EventStore>,
        EventFactory::new(system_clock()),
        EventBusConfig::default()
            .with_batch_size(10)
            .with_flush_interval(Duration::from_secs(3600)),
    )
    .expect("valid bus configuration");
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);
    bus.subscribe(
        EventType::SessionStarted,
        move |_event: Event| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok::<(), HandlerError>(()))
        },
        SubscribeOptions::new(),
    );

    for index in 0..3 {
        let event = bus
            .factory()
            .session(
                EventType::SessionStarted,
                "gateway",
                SessionPayload {
                    session_id: format!("session-{index}"),
                    user: None,
                    summary: None,
                },
            )
            .build()
            .expect("valid event");
        bus.publish(event).await.expect("event buffered");
    }
    assert_eq!(bus.pending_events(), 3);
    assert_eq!(store.len(), 3);
    assert_eq!(delivered.load(Ordering::SeqCst), 0);

    bus.shutdown().await;

    assert_eq!(bus.pending_events(), 0);
    assert_eq!(delivered.load(Ordering::SeqCst), 3);
    assert_eq!(journal.open().len(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retention_rewrites_the_journal(journal: Journal) {
    let store = journal.open();
    let bus = immediate_bus(Arc::clone(&store) as Arc<dyn EventStore>);
    let manager = AgentEventManager::new(bus, ManagerConfig::default());
    manager
        .register_agent(EchoAgent::new("scribe", "writer", &[]).shared())
        .await
        .expect("agent registers");
    manager.publish_stats().await.expect("stats published");
    assert_eq!(store.len(), 2);

    let removed = store
        .delete_events(Utc::now() + chrono::Duration::seconds(1))
        .await
        .expect("retention succeeds");

    assert_eq!(removed, 2);
    assert!(journal.open().is_empty());
}
