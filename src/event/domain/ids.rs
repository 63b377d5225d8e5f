//! Identifier types for the event domain.

use crate::task::domain::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Globally unique event identifier.
    EventId
}

uuid_id! {
    /// Groups causally related events into one chain.
    ///
    /// Task lifecycle events share the task's identifier as their
    /// correlation identifier, so a task's history can be reconstructed with
    /// a single query.
    CorrelationId
}

uuid_id! {
    /// Identifies a subscription on the event bus.
    SubscriptionId
}

impl From<TaskId> for CorrelationId {
    fn from(value: TaskId) -> Self {
        Self(value.into_inner())
    }
}
