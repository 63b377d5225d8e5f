//! Error types for agent domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing agent domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentDomainError {
    /// The agent identifier is empty after trimming.
    #[error("agent id must not be empty")]
    EmptyAgentId,

    /// The agent identifier contains characters outside `[A-Za-z0-9_-]`.
    #[error(
        "agent id '{0}' contains invalid characters (only alphanumeric, hyphens, and underscores allowed)"
    )]
    InvalidAgentId(String),

    /// The role tag is empty after trimming.
    #[error("agent role must not be empty")]
    EmptyRole,

    /// The capability tag is empty after trimming.
    #[error("capability must not be empty")]
    EmptyCapability,

    /// The capability tag contains characters outside `[a-z0-9_.-]`.
    #[error("capability '{0}' contains invalid characters")]
    InvalidCapability(String),
}

/// Error returned while parsing an agent status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent status: {0}")]
pub struct ParseAgentStatusError(pub String);
