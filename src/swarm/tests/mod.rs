//! Unit tests for swarm jobs and the coordinator.
