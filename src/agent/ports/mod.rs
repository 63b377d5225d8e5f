//! Port definitions for the agent subsystem.

pub mod agent;

pub use agent::{Agent, AgentFailure, AgentOutput};
