//! Swarm fan-out through the public API.

use crate::test_helpers::{EchoAgent, system_clock};
use agora::swarm::domain::SwarmJob;
use agora::swarm::services::SwarmCoordinator;
use agora::task::domain::{Task, TaskStatus};
use mockable::DefaultClock;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn decomposed_work_is_spread_over_specialists() {
    let swarm = SwarmCoordinator::new(system_clock());
    for (id, tags) in [
        ("researcher", &["research"][..]),
        ("coder", &["rust", "testing"][..]),
        ("reviewer", &["review"][..]),
    ] {
        swarm
            .register_swarm_agent(EchoAgent::new(id, "specialist", tags).shared())
            .expect("agent registers");
    }
    let parts: Vec<Task> = [
        ("Survey prior art", "research"),
        ("Implement parser", "rust"),
        ("fail review", "review"),
    ]
    .into_iter()
    .map(|(title, tag)| {
        Task::builder(title)
            .with_requirements([tag])
            .build(&DefaultClock)
            .expect("valid task")
    })
    .collect();
    let parent = Task::builder("Ship the parser")
        .with_subtasks(parts.iter().map(Task::id))
        .build(&DefaultClock)
        .expect("valid task");

    let outcome = swarm
        .process_task(SwarmJob::new(parent, parts).expect("subtasks match"))
        .await;

    assert_eq!(outcome.task().status(), TaskStatus::Failed);
    let handled: Vec<&str> = outcome
        .outputs()
        .iter()
        .map(|entry| entry.agent_id.as_str())
        .collect();
    assert_eq!(handled, vec!["researcher", "coder"]);
    let failure = outcome.errors().first().expect("review failed");
    assert_eq!(failure.reason, "reviewer refused");
    assert_eq!(
        outcome.result().get("errors").and_then(serde_json::Value::as_array).map(Vec::len),
        Some(1)
    );
}
