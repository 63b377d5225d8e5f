//! Specialty-matched fan-out over a pool of swarm agents.

use crate::SharedClock;
use crate::agent::domain::{AgentId, AgentState, AgentStatus, CapabilitySet, elapsed_ms};
use crate::agent::ports::{Agent, AgentFailure, AgentOutput};
use crate::swarm::domain::{
    SubtaskOutput, SwarmError, SwarmFailure, SwarmJob, SwarmOutcome, SwarmResult,
};
use crate::task::domain::{Complexity, Task, TaskId, TaskStatus};
use crate::validation::{FieldProblem, ValidationError};
use futures_util::future::join_all;
use mockable::Clock;
use std::cmp::Reverse;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Result of one agent call: unit index, agent, outcome, elapsed milliseconds.
type CallResult = (usize, AgentId, Result<AgentOutput, AgentFailure>, u32);

/// Units of one job and what became of them, keyed by unit index.
struct Run {
    units: Vec<Task>,
    decomposed: bool,
    outputs: Vec<(usize, SubtaskOutput)>,
    errors: Vec<(usize, SwarmFailure)>,
}

struct SwarmMember {
    handle: Arc<dyn Agent>,
    state: AgentState,
    in_flight: u32,
}

impl SwarmMember {
    fn reserve(&mut self, complexity: Complexity, clock: &dyn Clock) {
        self.in_flight = self.in_flight.saturating_add(1);
        self.state.add_workload(complexity);
        if self.in_flight == 1 {
            self.state.set_status(AgentStatus::Working, clock);
        }
    }

    /// Returns a reservation; `timing` is `Some` for a successful call.
    fn release(&mut self, complexity: Complexity, timing: Option<u32>, clock: &dyn Clock) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.state.remove_workload(complexity);
        match timing {
            Some(elapsed) => self.state.metrics_mut().record_completion(elapsed),
            None => self.state.metrics_mut().record_failure(),
        }
        if self.in_flight == 0 {
            self.state.set_status(AgentStatus::Idle, clock);
        }
    }
}

/// Agent pool that matches work by specialty overlap.
///
/// Clones share the same pool.
#[derive(Clone)]
pub struct SwarmCoordinator {
    clock: SharedClock,
    members: Arc<Mutex<Vec<SwarmMember>>>,
}

impl std::fmt::Debug for SwarmCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwarmCoordinator")
            .field("agents", &self.members().len())
            .finish_non_exhaustive()
    }
}

impl SwarmCoordinator {
    /// Creates an empty pool stamped with `clock`.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            members: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds an agent to the pool; its capabilities are its specialty tags.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::Validation`] when an agent with the same
    /// identifier is already in the pool.
    pub fn register_swarm_agent(&self, agent: Arc<dyn Agent>) -> SwarmResult<AgentState> {
        let mut members = self.members();
        if members.iter().any(|member| member.state.id() == agent.id()) {
            return Err(ValidationError::single("agent.id", FieldProblem::Duplicate).into());
        }
        let state = AgentState::new(
            agent.id().clone(),
            agent.role().clone(),
            agent.capabilities().clone(),
            self.clock.as_ref(),
        );
        info!(agent_id = %state.id(), specialties = state.capabilities().len(), "swarm agent registered");
        members.push(SwarmMember {
            handle: agent,
            state: state.clone(),
            in_flight: 0,
        });
        Ok(state)
    }

    /// Removes an agent that has no work in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::UnknownAgent`] when the agent is not in the pool
    /// and [`SwarmError::AgentBusy`] while it is processing work.
    pub fn unregister_swarm_agent(&self, agent_id: &AgentId) -> SwarmResult<AgentState> {
        let mut members = self.members();
        let position = members
            .iter()
            .position(|member| member.state.id() == agent_id)
            .ok_or_else(|| SwarmError::UnknownAgent(agent_id.clone()))?;
        if members
            .get(position)
            .is_some_and(|member| member.in_flight > 0)
        {
            return Err(SwarmError::AgentBusy(agent_id.clone()));
        }
        let removed = members.remove(position);
        info!(agent_id = %agent_id, "swarm agent unregistered");
        Ok(removed.state)
    }

    /// Returns snapshots of the pool in registration order.
    #[must_use]
    pub fn swarm_agents(&self) -> Vec<AgentState> {
        self.members()
            .iter()
            .map(|member| member.state.clone())
            .collect()
    }

    /// Processes a job and reports every unit's result.
    ///
    /// Only agents whose specialties match the task's requirements take
    /// part (empty requirements admit the whole pool). A job with subtasks
    /// dispatches each subtask concurrently to its best match among them;
    /// otherwise the whole task goes to one agent. The best match has the
    /// largest specialty overlap with the unit's requirements (empty
    /// requirements match every agent), then the lowest workload, then the
    /// earliest registration. Each dispatch reserves workload on its agent,
    /// so equally good agents share a job's subtasks.
    ///
    /// Nothing here fails: a unit with no matching agent, unmet
    /// dependencies, or a failing agent becomes an entry in
    /// [`SwarmOutcome::errors`], and the task ends failed while every
    /// successful output is still returned.
    pub async fn process_task(&self, job: SwarmJob) -> SwarmOutcome {
        let (mut task, subtasks, completed) = job.into_parts();
        let clock = self.clock.as_ref();
        let is_completed = |id: TaskId| completed.contains(&id);

        if let Err(err) = task
            .transition_to(TaskStatus::Assigned, clock)
            .and_then(|()| task.start(is_completed, clock))
        {
            warn!(task_id = %task.id(), error = %err, "swarm task could not start");
            let failure = SwarmFailure {
                task_id: task.id(),
                agent_id: None,
                reason: err.to_string(),
            };
            settle(&mut task, false, clock);
            return SwarmOutcome::new(task, subtasks, Vec::new(), vec![failure]);
        }

        let decomposed = !subtasks.is_empty();
        let mut run = Run {
            units: if decomposed {
                subtasks
            } else {
                vec![task.clone()]
            },
            decomposed,
            outputs: Vec::new(),
            errors: Vec::new(),
        };
        let dispatched = self.reserve(&mut run, task.requirements(), is_completed);

        let calls = dispatched.iter().filter_map(|(index, handle, agent_id)| {
            let unit = run.units.get(*index)?;
            Some(async move {
                let started = clock.utc();
                let result = handle.process(unit).await;
                let elapsed = elapsed_ms(started, clock.utc());
                (*index, agent_id.clone(), result, elapsed)
            })
        });
        let results = join_all(calls).await;
        self.collect(&mut run, results);

        let Run {
            units,
            mut outputs,
            mut errors,
            ..
        } = run;
        outputs.sort_by_key(|(index, _)| *index);
        errors.sort_by_key(|(index, _)| *index);
        settle(&mut task, errors.is_empty(), clock);
        info!(
            task_id = %task.id(),
            status = %task.status(),
            outputs = outputs.len(),
            errors = errors.len(),
            "swarm task processed"
        );
        SwarmOutcome::new(
            task,
            if decomposed { units } else { Vec::new() },
            outputs.into_iter().map(|(_, output)| output).collect(),
            errors.into_iter().map(|(_, failure)| failure).collect(),
        )
    }

    /// Picks an agent for every unit from the members matching `scope` and
    /// reserves workload on it.
    ///
    /// Units without a match, or subtasks that cannot start, are settled as
    /// failed and recorded in `run.errors`.
    fn reserve(
        &self,
        run: &mut Run,
        scope: &CapabilitySet,
        is_completed: impl Fn(TaskId) -> bool + Copy,
    ) -> Vec<(usize, Arc<dyn Agent>, AgentId)> {
        let clock = self.clock.as_ref();
        let mut dispatched = Vec::new();
        let mut members = self.members();
        for (index, unit) in run.units.iter_mut().enumerate() {
            let Some(member) =
                best_match(&members, scope, unit.requirements()).and_then(|at| members.get_mut(at))
            else {
                debug!(task_id = %unit.id(), "no swarm agent matches");
                run.errors.push((
                    index,
                    SwarmFailure {
                        task_id: unit.id(),
                        agent_id: None,
                        reason: "no swarm agent matches the requirements".to_owned(),
                    },
                ));
                if run.decomposed {
                    settle(unit, false, clock);
                }
                continue;
            };
            let started = if run.decomposed {
                unit.transition_to(TaskStatus::Assigned, clock)
                    .and_then(|()| unit.start(is_completed, clock))
            } else {
                Ok(())
            };
            if let Err(err) = started {
                run.errors.push((
                    index,
                    SwarmFailure {
                        task_id: unit.id(),
                        agent_id: None,
                        reason: err.to_string(),
                    },
                ));
                settle(unit, false, clock);
                continue;
            }
            member.reserve(unit.complexity(), clock);
            debug!(task_id = %unit.id(), agent_id = %member.state.id(), "swarm unit dispatched");
            dispatched.push((index, Arc::clone(&member.handle), member.state.id().clone()));
        }
        dispatched
    }

    /// Releases reservations, updates metrics, and files each call's result.
    fn collect(&self, run: &mut Run, results: Vec<CallResult>) {
        let clock = self.clock.as_ref();
        let mut members = self.members();
        for (index, agent_id, result, elapsed) in results {
            let Some(unit) = run.units.get_mut(index) else {
                continue;
            };
            if let Some(member) = members
                .iter_mut()
                .find(|member| member.state.id() == &agent_id)
            {
                member.release(unit.complexity(), result.is_ok().then_some(elapsed), clock);
            }
            match result {
                Ok(output) => {
                    if run.decomposed {
                        settle(unit, true, clock);
                    }
                    run.outputs.push((
                        index,
                        SubtaskOutput {
                            task_id: unit.id(),
                            agent_id,
                            output,
                        },
                    ));
                }
                Err(failure) => {
                    warn!(task_id = %unit.id(), agent_id = %agent_id, reason = %failure, "swarm agent failed");
                    if run.decomposed {
                        settle(unit, false, clock);
                    }
                    run.errors.push((
                        index,
                        SwarmFailure {
                            task_id: unit.id(),
                            agent_id: Some(agent_id),
                            reason: failure.into_reason(),
                        },
                    ));
                }
            }
        }
    }

    fn members(&self) -> MutexGuard<'_, Vec<SwarmMember>> {
        self.members
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Picks, among the members matching `scope`, the one with the largest
/// overlap with `required`, then the lowest workload, then the earliest
/// registration.
fn best_match(
    members: &[SwarmMember],
    scope: &CapabilitySet,
    required: &CapabilitySet,
) -> Option<usize> {
    members
        .iter()
        .enumerate()
        .filter(|(_, member)| matches_any(member, scope))
        .filter_map(|(position, member)| {
            matches_any(member, required).then(|| {
                (
                    position,
                    member.state.capabilities().overlap(required),
                    member.state.reserved_workload(),
                )
            })
        })
        .min_by_key(|&(position, overlap, workload)| (Reverse(overlap), workload, position))
        .map(|(position, _, _)| position)
}

fn matches_any(member: &SwarmMember, required: &CapabilitySet) -> bool {
    required.is_empty() || member.state.capabilities().overlap(required) > 0
}

fn settle(task: &mut Task, succeeded: bool, clock: &dyn Clock) {
    let next = if succeeded {
        TaskStatus::Completed
    } else {
        TaskStatus::Failed
    };
    if let Err(err) = task.transition_to(next, clock) {
        debug!(task_id = %task.id(), error = %err, "swarm task already settled");
    }
}
