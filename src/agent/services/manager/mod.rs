//! Agent event manager.
//!
//! The manager owns the agent registry and the pending-task queue. It hands
//! queued tasks to idle agents whose capabilities cover the task, runs each
//! agent invocation as a tracked Tokio task, and reports every lifecycle
//! change through the event bus. Registry state lives behind a single mutex
//! that is never held across an `.await`.

mod config;
mod error;
mod registry;

pub use config::ManagerConfig;
pub use error::{AgentManagerError, AgentManagerResult};

use crate::SharedClock;
use crate::agent::domain::{AgentId, AgentState, AgentStatus, SystemStats, elapsed_ms};
use crate::agent::ports::{Agent, AgentFailure, AgentOutput};
use crate::event::domain::{
    AgentPayload, CollaborationPayload, CorrelationId, EventId, EventType, MessagePayload,
    Severity, SystemPayload, TaskPayload,
};
use crate::event::services::{EventBus, EventDraft};
use crate::task::domain::{Complexity, Task, TaskId, TaskStatus};
use crate::validation::{FieldProblem, ValidationError};
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use mockable::Clock;
use registry::{Assignment, Collaboration, Registry};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

struct ManagerInner {
    bus: EventBus,
    clock: SharedClock,
    config: ManagerConfig,
    registry: Mutex<Registry>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    started_at: DateTime<Utc>,
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// How an agent invocation ended, as seen by the registry.
enum Settlement {
    Completed(AgentOutput),
    Failed(AgentFailure),
    /// The task never started, usually because it was cancelled first.
    Withdrawn,
}

/// Cloneable handle to a shared agent registry and task dispatcher.
///
/// # Examples
///
/// ```
/// use agora::SharedClock;
/// use agora::agent::domain::{AgentId, AgentRole, CapabilitySet};
/// use agora::agent::ports::{Agent, AgentFailure, AgentOutput};
/// use agora::agent::services::{AgentEventManager, ManagerConfig};
/// use agora::event::adapters::InMemoryEventStore;
/// use agora::event::services::{EventBus, EventBusConfig, EventFactory};
/// use agora::task::domain::{Task, TaskStatus};
/// use async_trait::async_trait;
/// use mockable::DefaultClock;
/// use std::sync::Arc;
///
/// struct Echo {
///     id: AgentId,
///     role: AgentRole,
///     capabilities: CapabilitySet,
/// }
///
/// #[async_trait]
/// impl Agent for Echo {
///     fn id(&self) -> &AgentId { &self.id }
///     fn role(&self) -> &AgentRole { &self.role }
///     fn capabilities(&self) -> &CapabilitySet { &self.capabilities }
///     async fn process(&self, task: &Task) -> Result<AgentOutput, AgentFailure> {
///         Ok(AgentOutput::new(task.title()))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let clock: SharedClock = Arc::new(DefaultClock);
/// let store = Arc::new(InMemoryEventStore::new());
/// let bus = EventBus::new(
///     store,
///     EventFactory::new(clock.clone()),
///     EventBusConfig::default().with_batch_size(1),
/// )?;
/// let manager = AgentEventManager::new(bus, ManagerConfig::default());
///
/// manager
///     .register_agent(Arc::new(Echo {
///         id: AgentId::new("echo")?,
///         role: AgentRole::new("writer")?,
///         capabilities: CapabilitySet::parse(["writing"])?,
///     }))
///     .await?;
/// let task = Task::builder("Draft notes")
///     .with_requirements(["writing"])
///     .build(clock.as_ref())?;
/// let task_id = manager.submit_task(task).await?;
/// manager.drain().await;
/// assert_eq!(manager.task(task_id).map(|t| t.status()), Some(TaskStatus::Completed));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AgentEventManager {
    inner: Arc<ManagerInner>,
}

impl std::fmt::Debug for AgentEventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentEventManager")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl AgentEventManager {
    /// Creates a manager that publishes through `bus`.
    ///
    /// The manager stamps state with the bus factory's clock. When
    /// `config` enables periodic statistics and a Tokio runtime is running,
    /// the statistics timer starts immediately.
    #[must_use]
    pub fn new(bus: EventBus, config: ManagerConfig) -> Self {
        let clock = SharedClock::clone(bus.factory().clock());
        let started_at = clock.utc();
        let manager = Self {
            inner: Arc::new(ManagerInner {
                bus,
                clock,
                config,
                registry: Mutex::new(Registry::default()),
                tracker: TaskTracker::new(),
                shutdown: CancellationToken::new(),
                started_at,
            }),
        };
        if let Some(period) = manager
            .inner
            .config
            .stats_interval()
            .filter(|period| !period.is_zero())
        {
            manager.start_stats_timer(period);
        }
        manager
    }

    fn start_stats_timer(&self, period: Duration) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("no Tokio runtime; periodic statistics disabled");
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        let token = self.inner.shutdown.clone();
        runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else { break };
                        let manager = Self { inner };
                        if let Err(err) = manager.publish_stats().await {
                            warn!(error = %err, "failed to publish statistics");
                        }
                    }
                }
            }
            debug!("statistics timer stopped");
        });
    }

    /// Returns the bus this manager publishes through.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Returns the configuration the manager was built with.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Registers an agent as idle and emits `agent.registered`.
    ///
    /// Queued tasks the new agent can take are dispatched straight away.
    ///
    /// # Errors
    ///
    /// Returns [`AgentManagerError::Validation`] when an agent with the same
    /// identifier is registered, and [`AgentManagerError::Bus`] when the
    /// registration event cannot be published.
    pub async fn register_agent(&self, agent: Arc<dyn Agent>) -> AgentManagerResult<AgentState> {
        let state = {
            let mut registry = self.registry();
            if registry.contains_agent(agent.id()) {
                return Err(ValidationError::single("agent.id", FieldProblem::Duplicate).into());
            }
            let fresh = AgentState::new(
                agent.id().clone(),
                agent.role().clone(),
                agent.capabilities().clone(),
                self.clock(),
            );
            registry.insert_agent(agent, fresh.clone());
            fresh
        };
        info!(agent_id = %state.id(), role = %state.role(), "agent registered");
        self.emit(self.agent_draft(EventType::AgentRegistered, &state))
            .await?;
        self.dispatch().await;
        Ok(state)
    }

    /// Removes an idle agent and emits `agent.unregistered`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentManagerError::UnknownAgent`] for an unregistered id and
    /// [`AgentManagerError::AgentBusy`] while the agent holds a task.
    pub async fn unregister_agent(&self, agent_id: &AgentId) -> AgentManagerResult<AgentState> {
        let state = {
            let mut registry = self.registry();
            let Some(record) = registry.agent(agent_id) else {
                return Err(AgentManagerError::UnknownAgent(agent_id.clone()));
            };
            if let Some(task_id) = record.state.current_task() {
                return Err(AgentManagerError::AgentBusy {
                    agent_id: agent_id.clone(),
                    task_id,
                });
            }
            registry
                .remove_agent(agent_id)
                .map(|removed| removed.state)
                .ok_or_else(|| AgentManagerError::UnknownAgent(agent_id.clone()))?
        };
        info!(agent_id = %agent_id, "agent unregistered");
        self.emit(self.agent_draft(EventType::AgentUnregistered, &state))
            .await?;
        Ok(state)
    }

    /// Submits a pending task and dispatches it if a capable agent is idle.
    ///
    /// A task with no capable idle agent, or with incomplete dependencies,
    /// waits in the queue; that is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AgentManagerError::Validation`] when the task is not pending
    /// or was already submitted, and [`AgentManagerError::Bus`] when
    /// `task.created` cannot be published, in which case the task is not
    /// queued.
    pub async fn submit_task(&self, task: Task) -> AgentManagerResult<TaskId> {
        if task.status() != TaskStatus::Pending {
            return Err(ValidationError::single(
                "status",
                FieldProblem::Invalid(format!("must be pending, found {}", task.status())),
            )
            .into());
        }
        let task_id = task.id();
        if self.registry().contains_task(task_id) {
            return Err(ValidationError::single("task.id", FieldProblem::Duplicate).into());
        }
        self.emit(self.task_draft(EventType::TaskCreated, &task, None))
            .await?;
        if !self.registry().enqueue(task) {
            return Err(ValidationError::single("task.id", FieldProblem::Duplicate).into());
        }
        debug!(task_id = %task_id, "task queued");
        self.dispatch().await;
        Ok(task_id)
    }

    /// Cancels a task that has not finished.
    ///
    /// Cancellation is cooperative: an agent already working on the task is
    /// not interrupted, but its result is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`AgentManagerError::UnknownTask`] for an unknown id and
    /// [`AgentManagerError::Task`] when the task already finished.
    pub async fn cancel_task(&self, task_id: TaskId) -> AgentManagerResult<Task> {
        let (task, agent_id) = {
            let mut registry = self.registry();
            let Some(record) = registry.task_mut(task_id) else {
                return Err(AgentManagerError::UnknownTask(task_id));
            };
            record.task.transition_to(TaskStatus::Cancelled, self.clock())?;
            let snapshot = (record.task.clone(), record.agent_id.clone());
            registry.dequeue(task_id);
            snapshot
        };
        info!(task_id = %task_id, "task cancelled");
        self.emit(self.task_draft(EventType::TaskCancelled, &task, agent_id))
            .await?;
        Ok(task)
    }

    /// Changes an agent's status and emits `agent.status_changed`.
    ///
    /// Returning an agent to idle re-scans the queue.
    ///
    /// # Errors
    ///
    /// Returns [`AgentManagerError::UnknownAgent`] for an unregistered id and
    /// [`AgentManagerError::AgentBusy`] when idling an agent that holds a
    /// task.
    pub async fn set_agent_status(
        &self,
        agent_id: &AgentId,
        status: AgentStatus,
    ) -> AgentManagerResult<AgentState> {
        let (state, previous) = {
            let mut registry = self.registry();
            let Some(record) = registry.agent_mut(agent_id) else {
                return Err(AgentManagerError::UnknownAgent(agent_id.clone()));
            };
            if let Some(task_id) = record.state.current_task().filter(|_| status.is_idle()) {
                return Err(AgentManagerError::AgentBusy {
                    agent_id: agent_id.clone(),
                    task_id,
                });
            }
            let before = record.state.set_status(status, self.clock());
            (record.state.clone(), before)
        };
        if previous != status {
            self.emit(self.status_draft(&state, previous)).await?;
        }
        if status.is_idle() {
            self.dispatch().await;
        }
        Ok(state)
    }

    /// Emits a `message.sent` event from one registered agent to another, or
    /// to everyone when `recipient` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentManagerError::UnknownAgent`] when either party is not
    /// registered and [`AgentManagerError::Validation`] for blank content.
    pub async fn send_message(
        &self,
        sender: &AgentId,
        recipient: Option<&AgentId>,
        content: impl Into<String>,
    ) -> AgentManagerResult<EventId> {
        {
            let registry = self.registry();
            for party in std::iter::once(sender).chain(recipient) {
                if !registry.contains_agent(party) {
                    return Err(AgentManagerError::UnknownAgent(party.clone()));
                }
            }
        }
        let mut draft = self.inner.bus.factory().message(
            sender.as_str(),
            MessagePayload {
                sender: sender.clone(),
                recipient: recipient.cloned(),
                content: content.into(),
            },
        );
        if let Some(receiver) = recipient {
            draft = draft.with_target(receiver.as_str());
        }
        self.emit(draft).await
    }

    /// Starts a collaboration between idle agents.
    ///
    /// Every agent involved moves to `collaborating` until
    /// [`AgentEventManager::complete_collaboration`] is called with the
    /// returned identifier, which also correlates the collaboration events.
    ///
    /// # Errors
    ///
    /// Returns [`AgentManagerError::Validation`] for a blank topic, no
    /// participants, or an initiator listed as a participant;
    /// [`AgentManagerError::UnknownAgent`] and
    /// [`AgentManagerError::AgentUnavailable`] when an agent is missing or
    /// not idle.
    pub async fn request_collaboration(
        &self,
        initiator: &AgentId,
        participants: Vec<AgentId>,
        topic: impl Into<String>,
    ) -> AgentManagerResult<CorrelationId> {
        if participants.contains(initiator) {
            return Err(ValidationError::single(
                "participants",
                FieldProblem::Invalid("initiator cannot also be a participant".to_owned()),
            )
            .into());
        }
        let collaboration_id = CorrelationId::new();
        let payload = CollaborationPayload {
            initiator: initiator.clone(),
            participants,
            topic: topic.into(),
            succeeded: None,
            outcome: None,
        };
        let event = self
            .inner
            .bus
            .factory()
            .collaboration(
                EventType::CollaborationRequested,
                initiator.as_str(),
                payload.clone(),
            )
            .with_correlation_id(collaboration_id)
            .build()?;

        let changes = {
            let mut registry = self.registry();
            let members: Vec<&AgentId> = std::iter::once(initiator)
                .chain(payload.participants.iter())
                .collect();
            for member in &members {
                let Some(record) = registry.agent(member) else {
                    return Err(AgentManagerError::UnknownAgent((*member).clone()));
                };
                if !record.state.is_available() {
                    return Err(AgentManagerError::AgentUnavailable {
                        agent_id: (*member).clone(),
                        status: record.state.status(),
                    });
                }
            }
            let mut changes = Vec::with_capacity(members.len());
            for member in members {
                if let Some(record) = registry.agent_mut(member) {
                    let before = record
                        .state
                        .set_status(AgentStatus::Collaborating, self.clock());
                    changes.push((record.state.clone(), before));
                }
            }
            registry.open_collaboration(
                collaboration_id,
                Collaboration {
                    initiator: payload.initiator,
                    participants: payload.participants,
                    topic: payload.topic,
                },
            );
            changes
        };
        info!(collaboration_id = %collaboration_id, agents = changes.len(), "collaboration requested");
        self.inner.bus.publish(event).await?;
        for (state, previous) in &changes {
            self.emit_logged(
                self.status_draft(state, *previous)
                    .with_correlation_id(collaboration_id),
            )
            .await;
        }
        Ok(collaboration_id)
    }

    /// Closes a collaboration, records its outcome in every member's
    /// collaboration rating, and returns the members to idle.
    ///
    /// # Errors
    ///
    /// Returns [`AgentManagerError::UnknownCollaboration`] when no open
    /// collaboration has this identifier.
    pub async fn complete_collaboration(
        &self,
        collaboration_id: CorrelationId,
        succeeded: bool,
        outcome: Option<String>,
    ) -> AgentManagerResult<EventId> {
        let (collaboration, changes) = {
            let mut registry = self.registry();
            let Some(collaboration) = registry.close_collaboration(collaboration_id) else {
                return Err(AgentManagerError::UnknownCollaboration(collaboration_id));
            };
            let mut changes = Vec::new();
            let members = std::iter::once(&collaboration.initiator)
                .chain(collaboration.participants.iter());
            for member in members {
                let Some(record) = registry.agent_mut(member) else {
                    continue;
                };
                record.state.metrics_mut().record_collaboration(succeeded);
                if record.state.status() == AgentStatus::Collaborating {
                    let before = record.state.set_status(AgentStatus::Idle, self.clock());
                    changes.push((record.state.clone(), before));
                }
            }
            (collaboration, changes)
        };
        let source = collaboration.initiator.as_str().to_owned();
        let event = self
            .inner
            .bus
            .factory()
            .collaboration(
                EventType::CollaborationCompleted,
                source,
                CollaborationPayload {
                    initiator: collaboration.initiator,
                    participants: collaboration.participants,
                    topic: collaboration.topic,
                    succeeded: Some(succeeded),
                    outcome,
                },
            )
            .with_correlation_id(collaboration_id)
            .build()?;
        info!(collaboration_id = %collaboration_id, succeeded, "collaboration completed");
        let event_id = self.inner.bus.publish(event).await?;
        for (state, previous) in &changes {
            self.emit_logged(
                self.status_draft(state, *previous)
                    .with_correlation_id(collaboration_id),
            )
            .await;
        }
        self.dispatch().await;
        Ok(event_id)
    }

    /// Computes statistics from the current registry contents.
    #[must_use]
    pub fn get_system_stats(&self) -> SystemStats {
        let now = self.clock().utc();
        let uptime = now.signed_duration_since(self.inner.started_at);
        let registry = self.registry();
        SystemStats::compute(
            registry.agent_states(),
            registry.tasks(),
            registry.queue_depth(),
            uptime,
            now,
        )
    }

    /// Publishes the current statistics as `system.stats_updated`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentManagerError::Bus`] when the event cannot be published.
    pub async fn publish_stats(&self) -> AgentManagerResult<EventId> {
        let stats = self.get_system_stats();
        let details = serde_json::to_value(&stats).unwrap_or_else(|err| {
            error!(error = %err, "could not serialise statistics; publishing without details");
            serde_json::Value::Null
        });
        let draft = self.inner.bus.factory().system(
            EventType::StatsUpdated,
            self.inner.config.source(),
            SystemPayload {
                severity: Severity::Info,
                message: format!(
                    "{} agents, {} queued tasks",
                    stats.total_agents(),
                    stats.queue_depth()
                ),
                details,
            },
        );
        self.emit(draft).await
    }

    /// Returns a snapshot of one agent.
    #[must_use]
    pub fn agent_state(&self, agent_id: &AgentId) -> Option<AgentState> {
        self.registry()
            .agent(agent_id)
            .map(|record| record.state.clone())
    }

    /// Returns snapshots of every agent in registration order.
    #[must_use]
    pub fn agents(&self) -> Vec<AgentState> {
        self.registry().agent_states().cloned().collect()
    }

    /// Returns a snapshot of one submitted task.
    #[must_use]
    pub fn task(&self, task_id: TaskId) -> Option<Task> {
        self.registry()
            .task(task_id)
            .map(|record| record.task.clone())
    }

    /// Returns queued tasks in dispatch order.
    #[must_use]
    pub fn pending_tasks(&self) -> Vec<Task> {
        self.registry().queued_tasks().cloned().collect()
    }

    /// Forgets finished tasks last updated before `older_than` and returns
    /// how many were dropped.
    ///
    /// Submitted tasks are otherwise kept for the life of the manager, since
    /// dependency checks read completions from them. A completed task that an
    /// unfinished task depends on is always kept.
    #[must_use]
    pub fn prune_finished_tasks(&self, older_than: DateTime<Utc>) -> usize {
        let removed = self.registry().prune_finished(older_than);
        debug!(removed, "finished tasks pruned");
        removed
    }

    /// Waits until every in-flight agent invocation, including any it
    /// dispatches in turn, has finished.
    pub async fn drain(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
        self.inner.tracker.reopen();
    }

    /// Stops the statistics timer and drains in-flight work.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.drain().await;
        info!("agent event manager shut down");
    }

    /// Hands queued work to idle agents.
    ///
    /// Boxed: settling a finished task re-enters this from the spawned
    /// invocation.
    fn dispatch(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let assignments = self.registry().plan_assignments(self.clock());
            for assignment in assignments {
                self.launch(assignment).await;
            }
        })
    }

    async fn launch(&self, assignment: Assignment) {
        let Assignment {
            handle,
            agent,
            task,
        } = assignment;
        info!(task_id = %task.id(), agent_id = %agent.id(), "task assigned");
        self.emit_logged(
            self.task_draft(EventType::TaskAssigned, &task, Some(agent.id().clone()))
                .with_target(agent.id().as_str()),
        )
        .await;
        self.emit_logged(self.status_draft(&agent, AgentStatus::Idle))
            .await;

        let manager = self.clone();
        let agent_id = agent.id().clone();
        let task_id = task.id();
        self.inner.tracker.spawn(async move {
            manager.execute(handle.as_ref(), &agent_id, task_id).await;
        });
    }

    async fn execute(&self, handle: &dyn Agent, agent_id: &AgentId, task_id: TaskId) {
        let Some(task) = self.begin(task_id) else {
            self.settle(agent_id, task_id, Settlement::Withdrawn).await;
            return;
        };
        self.emit_logged(self.task_draft(EventType::TaskStarted, &task, Some(agent_id.clone())))
            .await;
        let settlement = match handle.process(&task).await {
            Ok(output) => Settlement::Completed(output),
            Err(failure) => Settlement::Failed(failure),
        };
        self.settle(agent_id, task_id, settlement).await;
    }

    /// Moves an assigned task to in progress; `None` once it was withdrawn.
    fn begin(&self, task_id: TaskId) -> Option<Task> {
        let mut registry = self.registry();
        let completed = registry.completed_dependencies(&registry.task(task_id)?.task);
        let record = registry.task_mut(task_id)?;
        if record.task.status() != TaskStatus::Assigned {
            return None;
        }
        if let Err(err) = record
            .task
            .start(|dependency| completed.contains(&dependency), self.clock())
        {
            warn!(task_id = %task_id, error = %err, "assigned task could not start");
            return None;
        }
        record.started_at = Some(self.clock().utc());
        Some(record.task.clone())
    }

    async fn settle(&self, agent_id: &AgentId, task_id: TaskId, settlement: Settlement) {
        let (task_draft, agent_change) = self.record_settlement(agent_id, task_id, settlement);
        if let Some(draft) = task_draft {
            self.emit_logged(draft).await;
        }
        if let Some((state, previous)) =
            agent_change.filter(|(state, previous)| *previous != state.status())
        {
            self.emit_logged(self.status_draft(&state, previous)).await;
        }
        self.dispatch().await;
    }

    /// Applies an invocation's result to the registry and releases the agent.
    ///
    /// Returns the task event to publish, if any, and the agent's new state
    /// with its previous status.
    fn record_settlement(
        &self,
        agent_id: &AgentId,
        task_id: TaskId,
        settlement: Settlement,
    ) -> (Option<EventDraft>, Option<(AgentState, AgentStatus)>) {
        let clock = self.clock();
        let now = clock.utc();
        let mut registry = self.registry();
        let mut complexity = Complexity::default();
        let mut elapsed = None;
        let mut verdict = None;
        if let Some(record) = registry.task_mut(task_id) {
            complexity = record.task.complexity();
            elapsed = record.started_at.map(|started| elapsed_ms(started, now));
            if record.task.is_terminal() {
                debug!(task_id = %task_id, "discarding result of cancelled task");
            } else {
                verdict = self.conclude(&mut record.task, agent_id, settlement);
            }
        }
        let succeeded = verdict.as_ref().and_then(|(_, succeeded)| *succeeded);
        let agent_change = registry.agent_mut(agent_id).map(|record| {
            match succeeded {
                Some(true) => record
                    .state
                    .metrics_mut()
                    .record_completion(elapsed.unwrap_or_default()),
                Some(false) => record.state.metrics_mut().record_failure(),
                None => {}
            }
            let before = record.state.status();
            record.state.release(complexity, clock);
            (record.state.clone(), before)
        });
        (verdict.map(|(draft, _)| draft), agent_change)
    }

    /// Moves an unfinished task to its final status and drafts the matching
    /// event.
    ///
    /// The flag is `Some(true)` for a completion and `Some(false)` for an
    /// agent failure; a task that could not start fails without counting
    /// against the agent.
    fn conclude(
        &self,
        task: &mut Task,
        agent_id: &AgentId,
        settlement: Settlement,
    ) -> Option<(EventDraft, Option<bool>)> {
        let (event_type, payload, verdict) = match settlement {
            Settlement::Withdrawn => {
                task.transition_to(TaskStatus::Failed, self.clock()).ok()?;
                warn!(task_id = %task.id(), "assigned task failed to start");
                let mut payload = task_payload(task, Some(agent_id.clone()));
                payload.error = Some("task could not start".to_owned());
                (EventType::TaskFailed, payload, None)
            }
            Settlement::Completed(output) => {
                task.transition_to(TaskStatus::Completed, self.clock()).ok()?;
                info!(task_id = %task.id(), agent_id = %agent_id, "task completed");
                let mut payload = task_payload(task, Some(agent_id.clone()));
                payload.result = Some(output.into_json());
                (EventType::TaskCompleted, payload, Some(true))
            }
            Settlement::Failed(failure) => {
                task.transition_to(TaskStatus::Failed, self.clock()).ok()?;
                warn!(task_id = %task.id(), agent_id = %agent_id, reason = %failure, "task failed");
                let mut payload = task_payload(task, Some(agent_id.clone()));
                payload.error = Some(failure.into_reason());
                (EventType::TaskFailed, payload, Some(false))
            }
        };
        let draft = self
            .inner
            .bus
            .factory()
            .task(event_type, self.inner.config.source(), payload);
        Some((draft, verdict))
    }

    async fn emit(&self, draft: EventDraft) -> AgentManagerResult<EventId> {
        let event = draft.build()?;
        Ok(self.inner.bus.publish(event).await?)
    }

    async fn emit_logged(&self, draft: EventDraft) {
        if let Err(err) = self.emit(draft).await {
            error!(error = %err, "failed to publish manager event");
        }
    }

    fn task_draft(
        &self,
        event_type: EventType,
        task: &Task,
        agent_id: Option<AgentId>,
    ) -> EventDraft {
        self.inner.bus.factory().task(
            event_type,
            self.inner.config.source(),
            task_payload(task, agent_id),
        )
    }

    fn agent_draft(&self, event_type: EventType, state: &AgentState) -> EventDraft {
        self.inner.bus.factory().agent(
            event_type,
            self.inner.config.source(),
            AgentPayload {
                agent_id: state.id().clone(),
                role: state.role().clone(),
                status: state.status(),
                previous_status: None,
            },
        )
    }

    fn status_draft(&self, state: &AgentState, previous: AgentStatus) -> EventDraft {
        self.inner.bus.factory().agent_status_changed(
            self.inner.config.source(),
            state.id().clone(),
            state.role().clone(),
            previous,
            state.status(),
        )
    }

    fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn task_payload(task: &Task, agent_id: Option<AgentId>) -> TaskPayload {
    TaskPayload {
        task_id: task.id(),
        title: task.title().to_owned(),
        status: task.status(),
        priority: task.priority(),
        agent_id,
        result: None,
        error: None,
    }
}
