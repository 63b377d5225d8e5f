//! Agent orchestration services.

pub mod manager;

pub use manager::{AgentEventManager, AgentManagerError, AgentManagerResult, ManagerConfig};
