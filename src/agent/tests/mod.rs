//! Unit tests for the agent subsystem.

mod domain_tests;
