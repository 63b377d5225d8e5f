//! Replaying stored history to new subscribers.

use crate::test_helpers::{EchoAgent, immediate_bus};
use agora::agent::services::{AgentEventManager, ManagerConfig};
use agora::event::adapters::InMemoryEventStore;
use agora::event::domain::{Event, EventType};
use agora::event::ports::EventStore;
use agora::event::services::ReplayStatus;
use agora::event::services::bus::{HandlerError, SubscribeOptions};
use agora::task::domain::Task;
use chrono::Utc;
use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replay_reaches_late_subscribers_without_duplicating_history() {
    let store = Arc::new(InMemoryEventStore::new());
    let started = Utc::now();
    let manager = AgentEventManager::new(
        immediate_bus(Arc::clone(&store) as Arc<dyn EventStore>),
        ManagerConfig::default(),
    );
    manager
        .register_agent(EchoAgent::new("scribe", "writer", &[]).shared())
        .await
        .expect("agent registers");
    for title in ["One", "Two"] {
        let task = Task::builder(title)
            .build(&mockable::DefaultClock)
            .expect("valid task");
        manager.submit_task(task).await.expect("task submitted");
    }
    manager.drain().await;
    let stored = store.len();

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    manager.bus().subscribe(
        EventType::TaskCompleted,
        move |_event: Event| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok::<(), HandlerError>(()))
        },
        SubscribeOptions::new(),
    );
    let job = manager.bus().replay(
        started,
        Utc::now(),
        [EventType::TaskCreated, EventType::TaskCompleted],
    );

    assert_eq!(job.wait().await, ReplayStatus::Completed);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(job.progress().total, 4);
    assert_eq!(job.progress().processed, 4);
    assert!(job.errors().is_empty());
    assert_eq!(store.len(), stored);
}
