//! Runs a short coordination session against the agora runtime.
//!
//! Usage:
//!
//! ```text
//! agora-demo [config-path]
//! ```
//!
//! The optional JSON document at `config-path` must deserialize a
//! [`DemoConfig`]. Every field is optional; a representative document is:
//!
//! ```json
//! {
//!   "event_log": "/tmp/agora/events.jsonl",
//!   "bus": { "batch_size": 1, "max_retries": 2, "retry_delay": 250 },
//!   "manager": { "source": "demo-manager", "stats_interval": 1000 }
//! }
//! ```
//!
//! Without `event_log` events are kept in memory. Progress is reported
//! through `tracing`; set `RUST_LOG` to adjust the verbosity.

use agora::SharedClock;
use agora::agent::domain::{AgentId, AgentRole, CapabilitySet};
use agora::agent::ports::{Agent, AgentFailure, AgentOutput};
use agora::agent::services::{AgentEventManager, ManagerConfig};
use agora::event::adapters::{InMemoryEventStore, JsonlEventStore};
use agora::event::domain::EventType;
use agora::event::ports::EventStore;
use agora::event::services::{EventBus, EventBusConfig, EventFactory};
use agora::swarm::domain::SwarmJob;
use agora::swarm::services::SwarmCoordinator;
use agora::task::domain::{Task, TaskPriority};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use chrono::Utc;
use mockable::{Clock, DefaultClock};
use serde::Deserialize;
use serde_json::json;
use std::env;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that stop the demo.
#[derive(Debug, Error)]
enum DemoError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("failed to read demo config: {0}")]
    ConfigRead(#[source] std::io::Error),
    #[error("failed to parse demo config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("setup failed: {0}")]
    Setup(#[source] BoxError),
}

/// Settings for one demo run.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DemoConfig {
    /// JSON-lines event log; events stay in memory when absent.
    event_log: Option<Utf8PathBuf>,
    bus: EventBusConfig,
    manager: ManagerConfig,
}

/// Agent that answers from a fixed script.
struct ScriptedAgent {
    id: AgentId,
    role: AgentRole,
    capabilities: CapabilitySet,
}

impl ScriptedAgent {
    fn shared(id: &str, role: &str, tags: &[&str]) -> Result<Arc<dyn Agent>, BoxError> {
        Ok(Arc::new(Self {
            id: AgentId::new(id)?,
            role: AgentRole::new(role)?,
            capabilities: CapabilitySet::parse(tags.iter().copied())?,
        }))
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
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
        if task.requirements().iter().any(|tag| tag.as_str() == "flaky") {
            return Err(AgentFailure::new(format!("{} lost its notes", self.id)));
        }
        Ok(AgentOutput::new(format!("{} handled {}", self.role, task.title()))
            .with_data(json!({ "agent": self.id.as_str(), "complexity": task.complexity().points() })))
    }
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let config_path = parse_args(env::args().skip(1))?;
    let config = match config_path {
        Some(path) => load_config(&path)?,
        None => DemoConfig::default(),
    };
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(DemoError::RuntimeInit)?;
    runtime.block_on(run(config))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Utf8PathBuf>, DemoError> {
    let config_path = args.next().map(Utf8PathBuf::from);
    if let Some(extra) = args.next() {
        return Err(DemoError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok(config_path)
}

fn load_config(path: &Utf8Path) -> Result<DemoConfig, DemoError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| DemoError::InvalidArgs(format!("{path} does not name a file")))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(DemoError::ConfigRead)?;
    let contents = dir.read_to_string(file_name).map_err(DemoError::ConfigRead)?;
    parse_config(&contents)
}

fn parse_config(contents: &str) -> Result<DemoConfig, DemoError> {
    serde_json::from_str(contents).map_err(DemoError::ConfigParse)
}

fn open_store(config: &DemoConfig) -> Result<Arc<dyn EventStore>, DemoError> {
    match &config.event_log {
        Some(path) => Ok(Arc::new(
            JsonlEventStore::open(path).map_err(|err| DemoError::Setup(err.into()))?,
        )),
        None => Ok(Arc::new(InMemoryEventStore::new())),
    }
}

async fn run(config: DemoConfig) -> Result<(), BoxError> {
    let clock: SharedClock = Arc::new(DefaultClock);
    let session_start = clock.utc();
    let store = open_store(&config)?;
    let bus = EventBus::new(store, EventFactory::new(Arc::clone(&clock)), config.bus)
        .map_err(|err| DemoError::Setup(err.into()))?;
    let manager = AgentEventManager::new(bus.clone(), config.manager);

    run_manager(&manager, clock.as_ref()).await?;
    run_swarm(&clock).await?;

    let replay = bus.replay(session_start, Utc::now(), [EventType::TaskCompleted]);
    let status = replay.wait().await;
    info!(status = %status, replayed = replay.progress().processed, "replayed completed tasks");

    manager.shutdown().await;
    bus.shutdown().await;
    Ok(())
}

async fn run_manager(manager: &AgentEventManager, clock: &dyn Clock) -> Result<(), BoxError> {
    let planner = ScriptedAgent::shared("planner", "architect", &["design", "planning"])?;
    let coder = ScriptedAgent::shared("coder", "developer", &["rust", "testing"])?;
    let critic = ScriptedAgent::shared("critic", "reviewer", &["review", "flaky"])?;
    for agent in [planner, coder, critic] {
        manager.register_agent(agent).await?;
    }

    let design = Task::builder("Sketch the storage layer")
        .with_priority(TaskPriority::High)
        .with_requirements(["design"])
        .build(clock)?;
    let build = Task::builder("Implement the storage layer")
        .with_dependencies([design.id()])
        .with_complexity(5)
        .with_requirements(["rust"])
        .build(clock)?;
    let review = Task::builder("Review the storage layer")
        .with_dependencies([build.id()])
        .with_requirements(["review", "flaky"])
        .build(clock)?;
    for task in [review, build, design] {
        manager.submit_task(task).await?;
    }
    manager.drain().await;

    let planner_id = AgentId::new("planner")?;
    let coder_id = AgentId::new("coder")?;
    manager
        .send_message(&planner_id, Some(&coder_id), "storage layer is ready for review")
        .await?;
    let collaboration = manager
        .request_collaboration(&planner_id, vec![coder_id], "index layout")
        .await?;
    manager
        .complete_collaboration(collaboration, true, Some("kept the B-tree".to_owned()))
        .await?;

    let stats = manager.get_system_stats();
    info!(
        agents = stats.total_agents(),
        completed = stats.completed_tasks(),
        failed = stats.failed_tasks(),
        throughput = stats.throughput_per_minute(),
        "manager session finished"
    );
    manager.publish_stats().await?;
    Ok(())
}

async fn run_swarm(clock: &SharedClock) -> Result<(), BoxError> {
    let swarm = SwarmCoordinator::new(Arc::clone(clock));
    swarm.register_swarm_agent(ScriptedAgent::shared("researcher", "analyst", &["research"])?)?;
    swarm.register_swarm_agent(ScriptedAgent::shared("writer", "author", &["docs"])?)?;
    swarm.register_swarm_agent(ScriptedAgent::shared("skeptic", "reviewer", &["flaky"])?)?;

    let parts = [
        ("Collect benchmarks", "research"),
        ("Write the summary", "docs"),
        ("Challenge the numbers", "flaky"),
    ]
    .into_iter()
    .map(|(title, tag)| Task::builder(title).with_requirements([tag]).build(clock.as_ref()))
    .collect::<Result<Vec<_>, _>>()?;
    let report = Task::builder("Publish the performance report")
        .with_subtasks(parts.iter().map(Task::id))
        .build(clock.as_ref())?;

    let outcome = swarm.process_task(SwarmJob::new(report, parts)?).await;
    if outcome.is_success() {
        info!(result = %outcome.result(), "swarm report finished");
    } else {
        warn!(
            errors = outcome.errors().len(),
            result = %outcome.result(),
            "swarm report finished with failures"
        );
    }
    Ok(())
}
