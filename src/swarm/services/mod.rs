//! Swarm orchestration services.

pub mod coordinator;

pub use coordinator::SwarmCoordinator;
