//! Replay of stored history through the bus.

use super::bus::EventBus;
use crate::event::domain::EventFilter;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

/// Lifecycle of a replay job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStatus {
    /// Created but not yet reading the store.
    Pending,
    /// Re-delivering events.
    Running,
    /// Every selected event was re-delivered.
    Completed,
    /// The store could not be read; the job stopped early.
    Failed,
}

impl ReplayStatus {
    /// Returns `true` once the job can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ReplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far a replay has got.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayProgress {
    /// Events re-delivered so far.
    pub processed: usize,
    /// Events selected for replay; `0` until the store has been read.
    pub total: usize,
}

#[derive(Debug, Clone)]
struct ReplayState {
    status: ReplayStatus,
    progress: ReplayProgress,
    errors: Vec<String>,
}

/// Handle to a running or finished replay.
///
/// Handler failures during replay are collected in [`ReplayJob::errors`]
/// without failing the job; only an unreadable store does that.
#[derive(Debug, Clone)]
pub struct ReplayJob {
    id: Uuid,
    state: watch::Receiver<ReplayState>,
}

impl ReplayJob {
    /// Returns the job identifier used in log records.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> ReplayStatus {
        self.state.borrow().status
    }

    /// Returns processed and total event counts.
    #[must_use]
    pub fn progress(&self) -> ReplayProgress {
        self.state.borrow().progress
    }

    /// Returns the errors collected so far.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    /// Waits for the job to finish and returns its final status.
    pub async fn wait(&self) -> ReplayStatus {
        let mut state = self.state.clone();
        state
            .wait_for(|current| current.status.is_terminal())
            .await
            .map_or(ReplayStatus::Failed, |current| current.status)
    }
}

pub(super) fn start(bus: EventBus, filter: EventFilter) -> ReplayJob {
    let id = Uuid::new_v4();
    let (sender, receiver) = watch::channel(ReplayState {
        status: ReplayStatus::Pending,
        progress: ReplayProgress::default(),
        errors: Vec::new(),
    });
    let job = ReplayJob {
        id,
        state: receiver,
    };
    match Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(run(id, bus, filter, sender));
        }
        Err(err) => {
            sender.send_modify(|state| {
                state.status = ReplayStatus::Failed;
                state.errors.push(format!("replay needs a Tokio runtime: {err}"));
            });
        }
    }
    job
}

async fn run(id: Uuid, bus: EventBus, filter: EventFilter, sender: watch::Sender<ReplayState>) {
    sender.send_modify(|state| state.status = ReplayStatus::Running);
    let events = match bus.store().get_events(&filter).await {
        Ok(events) => events,
        Err(err) => {
            warn!(replay_id = %id, error = %err, "replay could not read the event store");
            sender.send_modify(|state| {
                state.status = ReplayStatus::Failed;
                state.errors.push(err.to_string());
            });
            return;
        }
    };
    let total = events.clone().count();
    sender.send_modify(|state| state.progress.total = total);
    info!(replay_id = %id, total, "replay started");

    for stored in events {
        let event_id = stored.id();
        let event = match bus.decode_stored(stored) {
            Ok(event) => event,
            Err(err) => {
                warn!(replay_id = %id, event_id = %event_id, error = %err, "replay aborted");
                sender.send_modify(|state| {
                    state.status = ReplayStatus::Failed;
                    state.errors.push(format!("event {event_id}: {err}"));
                });
                return;
            }
        };
        let failures = bus.deliver_once(&event).await;
        sender.send_modify(|state| {
            state.progress.processed += 1;
            state.errors.extend(failures.iter().map(|(subscription_id, err)| {
                format!("event {event_id} subscription {subscription_id}: {err}")
            }));
        });
    }

    sender.send_modify(|state| state.status = ReplayStatus::Completed);
    info!(replay_id = %id, total, "replay completed");
}
