// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Committee identifiers
//!
//! A committee identifier selects which dataset the upstream service returns.
//! The upstream decides what is valid: [`CommitteeName`] only guarantees the
//! value is present, while [`KnownCommittee`] lists the identifiers advertised
//! to callers in health and error responses.

use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error returned when a committee identifier is empty or whitespace-only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("committee identifier cannot be empty or whitespace-only")]
pub struct InvalidCommitteeName;

/// A committee identifier that is guaranteed to be non-blank
///
/// The raw value is kept as supplied, surrounding whitespace included, so the
/// upstream receives exactly what the caller sent.
///
/// ```rust
/// use shared_types::CommitteeName;
///
/// let name = CommitteeName::new("UN Women").unwrap();
/// assert_eq!(name.as_str(), "UN Women");
///
/// assert!(CommitteeName::new("").is_err());
/// assert!(CommitteeName::new(" \t").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitteeName(Box<str>);

impl CommitteeName {
    /// Create a new `CommitteeName`, rejecting blank input
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidCommitteeName> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(InvalidCommitteeName);
        }
        Ok(Self(value.into_boxed_str()))
    }

    /// Build a `CommitteeName` from an optional query value
    ///
    /// Returns `None` for an absent, empty, or whitespace-only value.
    pub fn from_optional(value: Option<String>) -> Option<Self> {
        value.and_then(|value| Self::new(value).ok())
    }

    /// Get a string slice of the identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitteeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CommitteeName {
    type Err = InvalidCommitteeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CommitteeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<KnownCommittee> for CommitteeName {
    fn from(committee: KnownCommittee) -> Self {
        Self(Box::from(committee.as_str()))
    }
}

impl Serialize for CommitteeName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Committees advertised by the service
///
/// This list is informational. Requests for identifiers outside it are still
/// forwarded upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownCommittee {
    /// All India Political Parties Meet
    Aippm,
    /// Formula One
    F1,
    /// UN Women
    UnWomen,
    /// United Nations Office on Drugs and Crime
    Unodc,
}

impl KnownCommittee {
    /// Every advertised committee, in display order
    pub const ALL: [Self; 4] = [Self::Aippm, Self::F1, Self::UnWomen, Self::Unodc];

    /// The identifier the upstream expects for this committee
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aippm => "AIPPM",
            Self::F1 => "F1",
            Self::UnWomen => "UNWomen",
            Self::Unodc => "UNODC",
        }
    }

    /// Human-readable committee name
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Aippm => "AIPPM",
            Self::F1 => "F1",
            Self::UnWomen => "UN Women",
            Self::Unodc => "UNODC",
        }
    }
}

impl fmt::Display for KnownCommittee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for KnownCommittee {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
