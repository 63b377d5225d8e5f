//! Capability tags and capability sets.
//!
//! Capabilities are the currency of matching: a task declares the tags it
//! requires and an agent declares the tags it offers. The manager requires
//! full coverage; the swarm coordinator ranks by overlap.

use super::AgentDomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Normalised capability tag.
///
/// Tags are trimmed, lowercased, and limited to `[a-z0-9_.-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Capability(String);

impl Capability {
    /// Creates a validated capability tag.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::EmptyCapability`] when the value is blank,
    /// or [`AgentDomainError::InvalidCapability`] when it contains characters
    /// outside `[a-z0-9_.-]` after lowercasing.
    pub fn new(value: impl Into<String>) -> Result<Self, AgentDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(AgentDomainError::EmptyCapability);
        }
        let is_valid = normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.'));
        if !is_valid {
            return Err(AgentDomainError::InvalidCapability(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Capability {
    type Error = AgentDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Capability> for String {
    fn from(value: Capability) -> Self {
        value.0
    }
}

/// Ordered, duplicate-free set of capability tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Parses and normalises every tag.
    ///
    /// # Errors
    ///
    /// Returns the first [`AgentDomainError`] produced by [`Capability::new`].
    ///
    /// # Examples
    ///
    /// ```
    /// use agora::agent::domain::CapabilitySet;
    ///
    /// let offered = CapabilitySet::parse(["rust", "review", "docs"]).expect("valid tags");
    /// let required = CapabilitySet::parse(["Rust"]).expect("valid tags");
    /// assert!(offered.covers(&required));
    /// assert_eq!(offered.overlap(&required), 1);
    /// ```
    pub fn parse<I, S>(tags: I) -> Result<Self, AgentDomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        tags.into_iter()
            .map(Capability::new)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    /// Adds a tag; duplicates are ignored.
    pub fn insert(&mut self, capability: Capability) {
        self.0.insert(capability);
    }

    /// Returns `true` when every tag in `required` is in this set.
    ///
    /// An empty requirement set is covered by every set.
    #[must_use]
    pub fn covers(&self, required: &Self) -> bool {
        required.0.is_subset(&self.0)
    }

    /// Counts the tags shared with `other`.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> usize {
        self.0.intersection(&other.0).count()
    }

    /// Returns `true` when the tag is present.
    #[must_use]
    pub fn contains(&self, capability: &Capability) -> bool {
        self.0.contains(capability)
    }

    /// Returns `true` when the set holds no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CapabilitySet {
    type Item = &'a Capability;
    type IntoIter = std::collections::btree_set::Iter<'a, Capability>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
