//! Unit tests for the event subsystem.

mod domain_tests;
mod factory_tests;
mod replay_tests;
