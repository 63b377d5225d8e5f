//! Error types for swarm registration.

use crate::agent::domain::AgentId;
use crate::validation::ValidationError;
use thiserror::Error;

/// Result type for swarm coordinator operations.
pub type SwarmResult<T> = Result<T, SwarmError>;

/// Errors returned by swarm registration and job construction.
///
/// Processing a job never fails; agent failures are reported inside the
/// outcome instead.
#[derive(Debug, Clone, Error)]
pub enum SwarmError {
    /// Input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No swarm agent with this identifier is registered.
    #[error("swarm agent {0} is not registered")]
    UnknownAgent(AgentId),

    /// The agent is still processing work.
    #[error("swarm agent {0} has work in flight")]
    AgentBusy(AgentId),
}
