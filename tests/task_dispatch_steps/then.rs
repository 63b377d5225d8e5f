//! Then steps for task dispatch BDD scenarios.

use super::world::{DispatchWorld, run_async};
use agora::agent::domain::AgentId;
use agora::event::domain::{EventFilter, EventType};
use agora::event::ports::EventStore;
use agora::task::domain::TaskStatus;
use rstest_bdd_macros::then;

#[then(r#"the task "{title}" is "{status}""#)]
fn task_has_status(world: &DispatchWorld, title: String, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world
        .manager
        .task(world.task_id(&title)?)
        .ok_or_else(|| eyre::eyre!("manager lost task {title:?}"))?;
    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected {title:?} to be {expected}, found {}",
            task.status()
        ));
    }
    Ok(())
}

#[then(r#"agent "{id}" has completed {count:u32} task"#)]
fn agent_completed(world: &DispatchWorld, id: String, count: u32) -> Result<(), eyre::Report> {
    let agent_id = AgentId::new(id.as_str()).map_err(|err| eyre::eyre!("bad agent id: {err}"))?;
    let state = world
        .manager
        .agent_state(&agent_id)
        .ok_or_else(|| eyre::eyre!("agent {id:?} is not registered"))?;
    let completed = state.metrics().tasks_completed();
    if completed != count {
        return Err(eyre::eyre!("expected {count} completed tasks, found {completed}"));
    }
    Ok(())
}

#[then(r#"{count:usize} "{kind}" event was stored"#)]
fn events_stored(world: &DispatchWorld, count: usize, kind: String) -> Result<(), eyre::Report> {
    let event_type = EventType::try_from(kind.as_str()).map_err(|err| eyre::eyre!("bad event type: {err}"))?;
    let stored = run_async(
        world
            .store
            .get_events(&EventFilter::new().with_event_types([event_type])),
    )
    .map_err(|err| eyre::eyre!("query failed: {err}"))?
    .count();
    if stored != count {
        return Err(eyre::eyre!("expected {count} {kind} events, found {stored}"));
    }
    Ok(())
}
