//! End-to-end tests over the public API.
//!
//! Tests are organized into modules by functionality:
//! - `journal_tests`: Durable event logs written by the manager and the bus
//! - `replay_tests`: Re-delivery of stored history
//! - `swarm_tests`: Fan-out through the swarm coordinator

#[path = "test_helpers/mod.rs"]
mod test_helpers;

mod pipeline {
    mod journal_tests;
    mod replay_tests;
    mod swarm_tests;
}
