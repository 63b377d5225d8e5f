//! Step definitions for task dispatch scenarios.

mod given;
mod then;
mod when;
pub mod world;
