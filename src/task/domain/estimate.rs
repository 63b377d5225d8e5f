//! Task complexity estimate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer complexity estimate in the range `1..=10`.
///
/// The estimate drives how much of an agent's workload a task occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Complexity(u8);

impl Complexity {
    /// Smallest accepted estimate.
    pub const MIN: u8 = 1;
    /// Largest accepted estimate.
    pub const MAX: u8 = 10;

    /// Creates a validated complexity estimate.
    ///
    /// Returns `None` when `points` is outside `1..=10`.
    #[must_use]
    pub const fn new(points: u8) -> Option<Self> {
        if points >= Self::MIN && points <= Self::MAX {
            Some(Self(points))
        } else {
            None
        }
    }

    /// Returns the estimate in points.
    #[must_use]
    pub const fn points(self) -> u8 {
        self.0
    }

    /// Workload percentage an agent takes on while holding the task.
    ///
    /// Ten percent per point, so a complexity-10 task saturates an agent.
    #[must_use]
    pub const fn workload_share(self) -> u8 {
        self.0.saturating_mul(10)
    }
}

impl Default for Complexity {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for Complexity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!(
                "complexity {value} outside {}..={}",
                Self::MIN,
                Self::MAX
            )
        })
    }
}

impl From<Complexity> for u8 {
    fn from(value: Complexity) -> Self {
        value.0
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
