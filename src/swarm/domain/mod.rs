//! Swarm domain types.

mod error;
mod job;
mod outcome;

pub use error::{SwarmError, SwarmResult};
pub use job::SwarmJob;
pub use outcome::{SubtaskOutput, SwarmFailure, SwarmOutcome};
