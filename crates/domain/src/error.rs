//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur while building fixture values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A status code is outside the range an HTTP response can carry.
    #[error("invalid status code: {0}")]
    InvalidStatus(String),

    /// A body pattern is not a valid regular expression.
    #[error("invalid regular expression: {0}")]
    InvalidPattern(String),

    /// A structural path query could not be compiled.
    #[error("invalid path query `{query}`: {message}")]
    InvalidPathQuery {
        /// The query text as written in the fixture.
        query: String,
        /// What is wrong with it.
        message: String,
    },

    /// A configured request header is malformed.
    #[error("invalid header setting: {0}")]
    InvalidHeader(String),

    /// A configured cookie is malformed.
    #[error("invalid cookie setting: {0}")]
    InvalidCookie(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
