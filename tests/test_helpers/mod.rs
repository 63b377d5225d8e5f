//! Agents and wiring shared by the integration tests.

use agora::SharedClock;
use agora::agent::domain::{AgentId, AgentRole, CapabilitySet};
use agora::agent::ports::{Agent, AgentFailure, AgentOutput};
use agora::event::ports::EventStore;
use agora::event::services::{EventBus, EventBusConfig, EventFactory};
use agora::task::domain::Task;
use async_trait::async_trait;
use mockable::DefaultClock;
use serde_json::json;
use std::sync::Arc;

/// Agent that echoes the task title, failing titles that start with `fail`.
pub struct EchoAgent {
    id: AgentId,
    role: AgentRole,
    capabilities: CapabilitySet,
}

impl EchoAgent {
    /// Builds an echo agent offering `tags`.
    ///
    /// # Panics
    ///
    /// Panics when `id`, `role`, or a tag is malformed.
    pub fn new(id: &str, role: &str, tags: &[&str]) -> Self {
        Self {
            id: AgentId::new(id).expect("valid agent id"),
            role: AgentRole::new(role).expect("valid role"),
            capabilities: CapabilitySet::parse(tags.iter().copied()).expect("valid tags"),
        }
    }

    /// Wraps the agent for registration.
    pub fn shared(self) -> Arc<dyn Agent> {
        Arc::new(self)
    }
}

#[async_trait]
impl Agent for EchoAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn role(&self) -> &AgentRole {
        &self.role
    }

    fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    async fn process(&self, task: &Task) -> Result<AgentOutput, AgentFailure> {
        if task.title().starts_with("fail") {
            return Err(AgentFailure::new(format!("{} refused", self.id)));
        }
        Ok(AgentOutput::new(task.title()).with_data(json!({ "agent": self.id.as_str() })))
    }
}

/// Returns the wall clock as a shared handle.
pub fn system_clock() -> SharedClock {
    Arc::new(DefaultClock)
}

/// Builds a bus over `store` that persists and delivers each event at once.
///
/// # Panics
///
/// Panics if the fixed configuration is rejected.
pub fn immediate_bus(store: Arc<dyn EventStore>) -> EventBus {
    EventBus::new(
        store,
        EventFactory::new(system_clock()),
        EventBusConfig::default().with_batch_size(1),
    )
    .expect("valid bus configuration")
}
