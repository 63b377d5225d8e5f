//! Unit tests for the task domain.

mod domain_tests;
mod state_transition_tests;
