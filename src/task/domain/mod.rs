//! Domain model for tasks.
//!
//! The task domain models creation, priority ordering, and validated status
//! transitions while keeping dispatch concerns outside of the domain
//! boundary.

mod error;
mod estimate;
mod ids;
mod metadata;
mod priority;
mod status;
mod task;

pub use error::{ParseTaskPriorityError, ParseTaskStatusError, TaskDomainError};
pub use estimate::Complexity;
pub use ids::TaskId;
pub use metadata::TaskMetadata;
pub use priority::TaskPriority;
pub use status::TaskStatus;
pub use task::{Task, TaskBuilder};
