//! Agora: event-driven coordination core for agent swarms.
//!
//! This crate provides an append-only event log, a publish/subscribe bus with
//! retry, batching, and write-ahead persistence, an agent registry that
//! dispatches tasks to capable agents, and a swarm coordinator that fans
//! decomposed work out to specialty-matched agents.
//!
//! # Architecture
//!
//! Agora follows hexagonal architecture principles:
//!
//! - **Domain**: Pure types with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and agents
//! - **Adapters**: Concrete implementations of ports (memory, JSON lines)
//! - **Services**: Orchestration built on top of ports
//!
//! # Modules
//!
//! - [`event`]: Event schema, factory, store, bus, and replay
//! - [`task`]: Task aggregate and lifecycle state machine
//! - [`agent`]: Agent capability contract and the agent event manager
//! - [`swarm`]: Specialty-matched fan-out with partial-failure aggregation
//! - [`validation`]: Field-level validation errors shared by all boundaries

pub mod agent;
mod duration_ms;
pub mod event;
pub mod swarm;
pub mod task;
#[cfg(test)]
mod test_support;
pub mod validation;

use mockable::Clock;
use std::sync::Arc;

/// Shared, thread-safe clock handle injected into services.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;
