//! Domain-focused tests for agent values, metrics, and statistics.

use crate::agent::domain::{
    AgentDomainError, AgentId, AgentRole, AgentState, AgentStatus, Capability, CapabilitySet,
    PerformanceMetrics, SystemStats, elapsed_ms,
};
use crate::task::domain::{Complexity, Task, TaskId, TaskStatus};
use crate::test_support::{ManualClock, epoch};
use chrono::Duration;
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

fn state(id: &str, tags: &[&str], clock: &dyn Clock) -> AgentState {
    AgentState::new(
        AgentId::new(id).expect("valid id"),
        AgentRole::new("worker").expect("valid role"),
        CapabilitySet::parse(tags.iter().copied()).expect("valid tags"),
        clock,
    )
}

#[rstest]
#[case("", AgentDomainError::EmptyAgentId)]
#[case("   ", AgentDomainError::EmptyAgentId)]
#[case("has space", AgentDomainError::InvalidAgentId("has space".to_owned()))]
#[case("emoji-🙂", AgentDomainError::InvalidAgentId("emoji-🙂".to_owned()))]
fn agent_id_rejects_malformed_values(#[case] raw: &str, #[case] expected: AgentDomainError) {
    assert_eq!(AgentId::new(raw), Err(expected));
}

#[rstest]
fn agent_id_deserialization_validates() {
    let id: AgentId = serde_json::from_str("\"coder_2\"").expect("valid id");
    assert_eq!(id.as_str(), "coder_2");
    assert!(serde_json::from_str::<AgentId>("\"bad id\"").is_err());
}

#[rstest]
fn capabilities_normalise_and_reject_bad_tags() {
    assert_eq!(
        Capability::new(" Data.Analysis ").map(|tag| tag.as_str().to_owned()),
        Ok("data.analysis".to_owned())
    );
    assert_eq!(Capability::new(" "), Err(AgentDomainError::EmptyCapability));
    assert!(matches!(
        Capability::new("c++"),
        Err(AgentDomainError::InvalidCapability(_))
    ));
}

#[rstest]
fn coverage_and_overlap() {
    let offered = CapabilitySet::parse(["rust", "review", "docs"]).expect("valid tags");
    let partial = CapabilitySet::parse(["rust", "python"]).expect("valid tags");

    assert!(offered.covers(&CapabilitySet::new()));
    assert!(!offered.covers(&partial));
    assert_eq!(offered.overlap(&partial), 1);
    assert_eq!(CapabilitySet::new().overlap(&partial), 0);
}

#[rstest]
#[case("idle", AgentStatus::Idle)]
#[case(" Collaborating ", AgentStatus::Collaborating)]
#[case("WAITING", AgentStatus::Waiting)]
fn agent_status_parses(#[case] raw: &str, #[case] expected: AgentStatus) {
    assert_eq!(AgentStatus::try_from(raw), Ok(expected));
}

#[rstest]
fn fresh_metrics_are_neutral() {
    let metrics = PerformanceMetrics::default();

    assert_eq!(metrics.tasks_completed(), 0);
    assert!((metrics.success_rate() - 1.0).abs() < f64::EPSILON);
    assert!((metrics.collaboration_rating() - 0.5).abs() < f64::EPSILON);
}

#[rstest]
fn metrics_track_mean_time_and_success_rate() {
    let mut metrics = PerformanceMetrics::default();
    metrics.record_completion(100);
    metrics.record_completion(300);
    metrics.record_failure();
    metrics.record_failure();

    assert_eq!(metrics.tasks_completed(), 2);
    assert_eq!(metrics.tasks_failed(), 2);
    assert!((metrics.average_completion_ms() - 200.0).abs() < 1e-9);
    assert!((metrics.success_rate() - 0.5).abs() < 1e-9);
}

#[rstest]
fn collaboration_rating_moves_towards_outcomes() {
    let mut metrics = PerformanceMetrics::default();
    metrics.record_collaboration(true);
    assert!((metrics.collaboration_rating() - 0.6).abs() < 1e-9);

    for _ in 0..50 {
        metrics.record_collaboration(false);
    }
    assert!(metrics.collaboration_rating() >= 0.0);
    assert!(metrics.collaboration_rating() < 0.01);
}

#[rstest]
fn elapsed_ms_clamps_negative_spans() {
    let start = epoch();
    assert_eq!(elapsed_ms(start, start + Duration::milliseconds(1500)), 1500);
    assert_eq!(elapsed_ms(start, start - Duration::seconds(5)), 0);
}

#[rstest]
fn workload_tracks_assignment_and_saturates(clock: DefaultClock) {
    let mut agent = state("worker", &[], &clock);
    let heavy = Complexity::new(8).expect("valid complexity");
    let task_id = TaskId::new();

    agent.assign(task_id, heavy, &clock);
    assert_eq!(agent.workload(), 80);
    assert_eq!(agent.status(), AgentStatus::Working);
    assert!(!agent.is_available());

    agent.add_workload(heavy);
    assert_eq!(agent.workload(), 100);

    agent.release(heavy, &clock);
    assert_eq!(agent.workload(), 80);
    agent.remove_workload(heavy);
    agent.remove_workload(heavy);
    assert_eq!(agent.workload(), 0);
    assert_eq!(agent.current_task(), None);
    assert!(agent.is_available());
}

#[rstest]
fn status_changes_refresh_last_active() {
    let clock = ManualClock::at(epoch());
    let mut agent = state("worker", &[], &clock);
    clock.advance(Duration::seconds(30));

    let previous = agent.set_status(AgentStatus::Thinking, &clock);

    assert_eq!(previous, AgentStatus::Idle);
    assert_eq!(agent.last_active(), epoch() + Duration::seconds(30));
}

#[rstest]
fn stats_without_agents_report_zero_success() {
    let stats = SystemStats::compute([], [], 0, Duration::zero(), epoch());

    assert_eq!(stats.total_agents(), 0);
    assert!(stats.mean_success_rate().abs() < f64::EPSILON);
    assert!(stats.throughput_per_minute().abs() < f64::EPSILON);
    assert_eq!(stats.agents_with_status(AgentStatus::Idle), 0);
}

#[rstest]
fn stats_aggregate_agents_and_tasks(clock: DefaultClock) {
    let mut busy = state("busy", &[], &clock);
    busy.set_status(AgentStatus::Working, &clock);
    busy.metrics_mut().record_failure();
    let idle = state("idle", &[], &clock);
    let mut done = Task::builder("done").build(&clock).expect("valid task");
    done.transition_to(TaskStatus::Assigned, &clock)
        .and_then(|()| done.start(|_| true, &clock))
        .and_then(|()| done.transition_to(TaskStatus::Completed, &clock))
        .expect("valid lifecycle");
    let waiting = Task::builder("waiting").build(&clock).expect("valid task");

    let stats = SystemStats::compute(
        [&busy, &idle],
        [&done, &waiting],
        1,
        Duration::seconds(30),
        epoch(),
    );

    assert_eq!(stats.total_agents(), 2);
    assert_eq!(stats.agents_with_status(AgentStatus::Working), 1);
    assert_eq!(stats.agents_with_status(AgentStatus::Idle), 1);
    assert_eq!(stats.tasks_with_status(TaskStatus::Completed), 1);
    assert_eq!(stats.tasks_with_status(TaskStatus::Pending), 1);
    assert_eq!(stats.completed_tasks(), 1);
    assert_eq!(stats.queue_depth(), 1);
    assert!((stats.mean_success_rate() - 0.5).abs() < 1e-9);
    assert!((stats.throughput_per_minute() - 2.0).abs() < 1e-9);
}

#[rstest]
fn throughput_floors_uptime_at_one_second(clock: DefaultClock) {
    let mut done = Task::builder("done").build(&clock).expect("valid task");
    done.transition_to(TaskStatus::Assigned, &clock)
        .and_then(|()| done.start(|_| true, &clock))
        .and_then(|()| done.transition_to(TaskStatus::Completed, &clock))
        .expect("valid lifecycle");

    let stats = SystemStats::compute([], [&done], 0, Duration::milliseconds(10), epoch());

    assert!((stats.throughput_per_minute() - 60.0).abs() < 1e-9);
}
