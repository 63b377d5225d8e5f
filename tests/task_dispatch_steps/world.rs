//! Shared world state for task dispatch BDD scenarios.

use crate::test_helpers::immediate_bus;
use agora::agent::services::{AgentEventManager, ManagerConfig};
use agora::event::adapters::InMemoryEventStore;
use agora::event::ports::EventStore;
use agora::task::domain::TaskId;
use rstest::fixture;
use std::collections::HashMap;
use std::sync::Arc;

/// Scenario world for task dispatch behaviour tests.
pub struct DispatchWorld {
    pub store: Arc<InMemoryEventStore>,
    pub manager: AgentEventManager,
    pub tasks: HashMap<String, TaskId>,
}

impl DispatchWorld {
    /// Creates a world with an empty registry and event log.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        let manager = AgentEventManager::new(
            immediate_bus(Arc::clone(&store) as Arc<dyn EventStore>),
            ManagerConfig::default(),
        );
        Self {
            store,
            manager,
            tasks: HashMap::new(),
        }
    }

    /// Looks up a task submitted earlier in the scenario.
    pub fn task_id(&self, title: &str) -> Result<TaskId, eyre::Report> {
        self.tasks
            .get(title)
            .copied()
            .ok_or_else(|| eyre::eyre!("no task titled {title:?} was submitted"))
    }
}

impl Default for DispatchWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> DispatchWorld {
    DispatchWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
