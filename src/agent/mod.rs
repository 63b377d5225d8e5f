//! Agent registry, capability contract, and task dispatch.
//!
//! Agents are opaque workers that accept a task and asynchronously produce an
//! output or a failure. The [`services::manager::AgentEventManager`] owns the
//! registry of agent states and the pending-task queue and reports every
//! lifecycle change on the event bus. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
