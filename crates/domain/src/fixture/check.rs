//! Parsed checks.

use serde::Serialize;

use crate::request::{HopRequest, HttpMethod};
use crate::testing::AssertionEntry;

/// One request plus the expected responses of its redirect chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    /// Fixture line of the request.
    pub line: usize,
    /// Request method, `GET` when the fixture names none.
    pub method: HttpMethod,
    /// Absolute URI of the first request.
    pub uri: String,
    /// Expected responses, one per hop. Never empty.
    pub chain: Vec<ResponseExpectation>,
}

impl Check {
    /// The first request of the chain.
    #[must_use]
    pub fn initial_request(&self) -> HopRequest {
        HopRequest::new(self.method, self.uri.clone())
    }

    /// Number of hops the fixture declares.
    #[must_use]
    pub fn hop_count(&self) -> usize {
        self.chain.len()
    }
}

/// Expected status and assertions for one hop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseExpectation {
    /// Fixture line of the status.
    pub line: usize,
    /// Expected status code.
    pub status: u16,
    /// Header and body assertions in fixture order.
    pub assertions: Vec<AssertionEntry>,
}

impl ResponseExpectation {
    /// Create an expectation with no assertions yet.
    #[must_use]
    pub const fn new(line: usize, status: u16) -> Self {
        Self {
            line,
            status,
            assertions: Vec::new(),
        }
    }

    /// Header assertions, in fixture order.
    pub fn header_assertions(&self) -> impl Iterator<Item = &AssertionEntry> {
        self.assertions.iter().filter(|e| !e.assertion.is_body())
    }

    /// Body assertions, in fixture order.
    pub fn body_assertions(&self) -> impl Iterator<Item = &AssertionEntry> {
        self.assertions.iter().filter(|e| e.assertion.is_body())
    }
}
