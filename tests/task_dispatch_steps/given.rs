//! Given steps for task dispatch BDD scenarios.

use super::world::{DispatchWorld, run_async};
use crate::test_helpers::EchoAgent;
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"an agent "{id}" offering "{tag}""#)]
fn agent_offering(world: &mut DispatchWorld, id: String, tag: String) -> Result<(), eyre::Report> {
    let agent = EchoAgent::new(&id, "worker", &[tag.as_str()]).shared();
    run_async(world.manager.register_agent(agent)).wrap_err("register scenario agent")?;
    Ok(())
}
