//! Task model for agent dispatch.
//!
//! Tasks are units of work with a priority, dependency and subtask links, a
//! complexity estimate, and a lifecycle that runs from `pending` to one of
//! the terminal states. The lifecycle is enforced by the domain state
//! machine; services never set a status directly.
//!
//! - Domain types in [`domain`]

pub mod domain;

#[cfg(test)]
mod tests;
