//! Response assertions.
//!
//! This module provides the assertion kinds a fixture can attach to an
//! expected response, and the mismatch value produced when one of them
//! does not hold for an actual response.

use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::error::{DomainError, DomainResult};
use crate::path::PathQuery;

/// An assertion over one actual response, other than its status code.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// Response carries a header with this name (case-insensitive) and
    /// exactly this value.
    Header {
        /// Header name as written in the fixture.
        name: String,
        /// Expected value, compared verbatim.
        value: String,
    },
    /// Body contains this literal text.
    BodyContains {
        /// Text to search for.
        text: String,
    },
    /// Body has at least one match of this regular expression.
    BodyMatches {
        /// Compiled pattern.
        pattern: BodyPattern,
    },
    /// Body, parsed as a document, has at least one node selected by
    /// this query.
    BodyPath {
        /// Compiled structural path query.
        query: PathQuery,
    },
}

impl Assertion {
    /// Returns true for the assertions evaluated against the body.
    #[must_use]
    pub const fn is_body(&self) -> bool {
        !matches!(self, Self::Header { .. })
    }

    /// Renders the assertion the way it is written in a fixture.
    #[must_use]
    pub fn fixture_form(&self) -> String {
        match self {
            Self::Header { name, value } => format!("{name}: {value}"),
            Self::BodyContains { text } => format!("={text}"),
            Self::BodyMatches { pattern } => format!("~{pattern}"),
            Self::BodyPath { query } => query.to_string(),
        }
    }

    /// Get a human-readable description of this assertion.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Header { name, value } => format!("Header '{name}' equals '{value}'"),
            Self::BodyContains { text } => format!("Body contains '{text}'"),
            Self::BodyMatches { pattern } => format!("Body matches /{pattern}/"),
            Self::BodyPath { query } => format!("Body has a node at {query}"),
        }
    }
}

/// An assertion together with the fixture line it was read from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssertionEntry {
    /// 1-based fixture line.
    pub line: usize,
    /// The assertion itself.
    #[serde(flatten)]
    pub assertion: Assertion,
}

impl AssertionEntry {
    /// Create a new entry.
    #[must_use]
    pub const fn new(line: usize, assertion: Assertion) -> Self {
        Self { line, assertion }
    }
}

/// A regular expression searched for anywhere in a response body.
#[derive(Debug, Clone)]
pub struct BodyPattern(Regex);

impl BodyPattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPattern` if the regex does not compile.
    pub fn new(pattern: &str) -> DomainResult<Self> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| DomainError::InvalidPattern(e.to_string()))
    }

    /// Returns the pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Search semantics: true if the pattern matches anywhere in `haystack`.
    #[must_use]
    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }
}

impl PartialEq for BodyPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Display for BodyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BodyPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// What part of the response a mismatch is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchSubject {
    /// The status code.
    Status,
    /// The named header.
    Header(String),
    /// The body.
    Body,
}

/// The first assertion of an expectation block that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason}")]
pub struct AssertionMismatch {
    /// Fixture line of the failing status or assertion.
    pub line: usize,
    /// What was being checked.
    pub subject: MismatchSubject,
    /// Expected value in fixture form.
    pub expected: String,
    /// Actual value, when there is a short one worth showing.
    pub actual: Option<String>,
    /// Human-readable explanation.
    pub reason: String,
}

impl AssertionMismatch {
    /// Status code differs.
    #[must_use]
    pub fn status(line: usize, expected: u16, actual: u16) -> Self {
        Self {
            line,
            subject: MismatchSubject::Status,
            expected: expected.to_string(),
            actual: Some(actual.to_string()),
            reason: format!("expected status {expected}, got {actual}"),
        }
    }

    /// Header is absent or carries other values.
    #[must_use]
    pub fn header(line: usize, name: &str, expected: &str, actual: &[&str]) -> Self {
        let (actual, reason) = if actual.is_empty() {
            (None, format!("header '{name}' not found"))
        } else {
            let joined = actual.join(", ");
            let reason = format!("header '{name}' value mismatch: expected '{expected}', got '{joined}'");
            (Some(joined), reason)
        };
        Self {
            line,
            subject: MismatchSubject::Header(name.to_string()),
            expected: expected.to_string(),
            actual,
            reason,
        }
    }

    /// A body assertion did not hold.
    #[must_use]
    pub fn body(line: usize, assertion: &Assertion, reason: impl Into<String>) -> Self {
        Self {
            line,
            subject: MismatchSubject::Body,
            expected: assertion.fixture_form(),
            actual: None,
            reason: reason.into(),
        }
    }
}
