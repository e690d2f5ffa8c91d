//! Application error types

use hopcheck_domain::AssertionMismatch;
use thiserror::Error;

use crate::ports::TransportError;

/// Why a hop of a redirect chain failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HopFailure {
    /// The request could not be completed.
    #[error("request failed: {0}")]
    Transport(#[from] TransportError),

    /// The response did not match its expectation block.
    #[error("{0}")]
    Mismatch(#[from] AssertionMismatch),

    /// More hops are expected but the response names no redirect target.
    #[error(
        "response {status} has no usable Location header, but {remaining} more response(s) are expected"
    )]
    MissingRedirectTarget {
        /// Status of the response lacking the header.
        status: u16,
        /// Expectations left unchecked in the chain.
        remaining: usize,
    },

    /// The redirect target cannot be resolved to an absolute URI.
    #[error("cannot follow Location `{location}`: {message}")]
    InvalidRedirectTarget {
        /// The header value.
        location: String,
        /// The resolution error.
        message: String,
    },
}
