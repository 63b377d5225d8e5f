//! Event log, factory, publish/subscribe bus, and replay.
//!
//! Every state change in the system is recorded as an immutable [`Event`]
//! built by the [`services::factory::EventFactory`]. The
//! [`services::bus::EventBus`] persists events to an
//! [`ports::store::EventStore`] before delivering them to subscribers, retries
//! failing handlers, and can replay a time-bounded slice of history. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//!
//! [`Event`]: domain::Event

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
