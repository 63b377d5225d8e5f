//! Swarm coordination.
//!
//! A swarm is an agent pool, independent of the agent event manager, that
//! matches work to agents by specialty overlap. Jobs that decompose into
//! subtasks are fanned out concurrently, and each agent call is isolated so a
//! failing agent yields an error entry instead of aborting the job.

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
