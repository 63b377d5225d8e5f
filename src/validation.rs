//! Field-level validation errors.
//!
//! Every boundary that rejects malformed input (event construction, task
//! construction, agent registration) reports a [`ValidationError`] listing
//! each offending field rather than stopping at the first problem.

use std::fmt;
use thiserror::Error;

/// Describes what is wrong with a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    /// The field is absent.
    Missing,
    /// The field is present but holds the wrong kind of value.
    Mistyped {
        /// Human-readable name of the expected kind.
        expected: &'static str,
    },
    /// The field is present but its value is rejected.
    Invalid(String),
    /// The value collides with an existing entry.
    Duplicate,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("is missing"),
            Self::Mistyped { expected } => write!(f, "expected {expected}"),
            Self::Invalid(reason) => f.write_str(reason),
            Self::Duplicate => f.write_str("is already registered"),
        }
    }
}

/// A single offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    field: String,
    problem: FieldProblem,
}

impl FieldIssue {
    /// Creates an issue for the named field.
    #[must_use]
    pub fn new(field: impl Into<String>, problem: FieldProblem) -> Self {
        Self {
            field: field.into(),
            problem,
        }
    }

    /// Returns the field path, e.g. `payload.task_id`.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the problem with the field.
    #[must_use]
    pub const fn problem(&self) -> &FieldProblem {
        &self.problem
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.problem)
    }
}

/// Input was rejected before entering the system.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("validation failed: {}", format_issues(.issues))]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Creates an error for a single field.
    #[must_use]
    pub fn single(field: impl Into<String>, problem: FieldProblem) -> Self {
        Self {
            issues: vec![FieldIssue::new(field, problem)],
        }
    }

    /// Returns every offending field.
    #[must_use]
    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Returns `true` when the named field is among the issues.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

/// Accumulates field issues and converts them into a result.
#[derive(Debug, Default)]
pub struct IssueCollector {
    issues: Vec<FieldIssue>,
}

impl IssueCollector {
    /// Creates an empty collector.
    #[must_use]
    pub const fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Records a problem with a field.
    pub fn push(&mut self, field: impl Into<String>, problem: FieldProblem) {
        self.issues.push(FieldIssue::new(field, problem));
    }

    /// Records [`FieldProblem::Missing`] when `value` is blank.
    pub fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, FieldProblem::Missing);
        }
    }

    /// Returns `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every recorded issue.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                issues: self.issues,
            })
        }
    }
}
