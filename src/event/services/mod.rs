//! Event services: construction, dispatch, and replay.

pub mod bus;
pub mod factory;
pub mod replay;

pub use bus::{EventBus, EventBusConfig, EventBusError, EventBusResult};
pub use factory::{EventDraft, EventFactory};
pub use replay::{ReplayJob, ReplayProgress, ReplayStatus};
