//! A single request within a redirect chain.

use serde::Serialize;
use std::fmt;

use super::HttpMethod;

/// One request sent by the executor: the check's method and the URI of
/// the current hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopRequest {
    /// Request method, unchanged across the hops of a chain.
    pub method: HttpMethod,
    /// Absolute URI of this hop.
    pub uri: String,
}

impl HopRequest {
    /// Creates a new hop request.
    #[must_use]
    pub fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
        }
    }

    /// Returns the request for the next hop: same method, new target.
    #[must_use]
    pub fn redirected_to(&self, uri: impl Into<String>) -> Self {
        Self::new(self.method, uri)
    }
}

impl fmt::Display for HopRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}
