//! When steps for task dispatch BDD scenarios.

use super::world::{DispatchWorld, run_async};
use crate::test_helpers::EchoAgent;
use agora::task::domain::Task;
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest_bdd_macros::when;

#[when(r#"a task "{title}" requiring "{tag}" is submitted"#)]
fn submit_task(world: &mut DispatchWorld, title: String, tag: String) -> Result<(), eyre::Report> {
    let task = Task::builder(title.as_str())
        .with_requirements([tag])
        .build(&DefaultClock)
        .wrap_err("build scenario task")?;
    let task_id = run_async(world.manager.submit_task(task)).wrap_err("submit scenario task")?;
    world.tasks.insert(title, task_id);
    Ok(())
}

#[when(r#"an agent "{id}" offering "{tag}" registers"#)]
fn agent_registers(world: &mut DispatchWorld, id: String, tag: String) -> Result<(), eyre::Report> {
    let agent = EchoAgent::new(&id, "worker", &[tag.as_str()]).shared();
    run_async(world.manager.register_agent(agent)).wrap_err("register late agent")?;
    Ok(())
}

#[when("in-flight work has finished")]
fn work_finished(world: &mut DispatchWorld) {
    run_async(world.manager.drain());
}
