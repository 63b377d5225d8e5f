//! Domain model for agents and the registry's derived statistics.
//!
//! Agent states are owned by the registry that created them; callers only
//! ever receive clones.

mod capability;
mod error;
mod ids;
mod metrics;
mod state;
mod stats;
mod status;

pub use capability::{Capability, CapabilitySet};
pub use error::{AgentDomainError, ParseAgentStatusError};
pub use ids::{AgentId, AgentRole};
pub use metrics::PerformanceMetrics;
pub(crate) use metrics::elapsed_ms;
pub use state::AgentState;
pub use stats::SystemStats;
pub use status::AgentStatus;
