//! Identifier and role types for agents.

use super::AgentDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-chosen, validated agent identifier.
///
/// Identifiers are trimmed and may contain ASCII letters, digits, hyphens,
/// and underscores.
///
/// # Examples
///
/// ```
/// use agora::agent::domain::AgentId;
///
/// let id = AgentId::new(" reviewer-1 ").expect("valid id");
/// assert_eq!(id.as_str(), "reviewer-1");
/// assert!(AgentId::new("two words").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentId(String);

impl AgentId {
    /// Creates a validated agent identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::EmptyAgentId`] when the value is blank, or
    /// [`AgentDomainError::InvalidAgentId`] when it contains other characters.
    pub fn new(value: impl Into<String>) -> Result<Self, AgentDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AgentDomainError::EmptyAgentId);
        }
        let is_valid = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !is_valid {
            return Err(AgentDomainError::InvalidAgentId(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AgentId {
    type Error = AgentDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AgentId> for String {
    fn from(value: AgentId) -> Self {
        value.0
    }
}

/// Free-form role tag describing what an agent does (e.g. `reviewer`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentRole(String);

impl AgentRole {
    /// Creates a role tag.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::EmptyRole`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, AgentDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AgentDomainError::EmptyRole);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the role as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
