//! Mock ports shared by the use case tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use hopcheck_domain::{
    Assertion, AssertionMismatch, Check, HopRequest, HttpResponse, ResponseExpectation,
    parse_fixture,
};

use crate::ports::{HttpClient, ResponseEvaluator, TransportError};

/// Mock HTTP client answering with a fixed script and recording requests.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    sent: Mutex<Vec<HopRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<HttpResponse, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<HopRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl HttpClient for ScriptedClient {
    fn send(
        &self,
        request: &HopRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        self.sent.lock().unwrap().push(request.clone());
        let result = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())));
        async move { result }
    }
}

/// Evaluator checking status and headers only.
pub struct StatusAndHeaders;

impl ResponseEvaluator for StatusAndHeaders {
    fn evaluate(
        &self,
        expectation: &ResponseExpectation,
        response: &HttpResponse,
    ) -> Result<(), AssertionMismatch> {
        if response.status != expectation.status {
            return Err(AssertionMismatch::status(
                expectation.line,
                expectation.status,
                response.status,
            ));
        }
        for entry in expectation.header_assertions() {
            if let Assertion::Header { name, value } = &entry.assertion {
                let actual: Vec<_> = response.header_values(name).collect();
                if !actual.contains(&value.as_str()) {
                    return Err(AssertionMismatch::header(entry.line, name, value, &actual));
                }
            }
        }
        Ok(())
    }
}

/// A redirect response.
pub fn redirect(status: u16, location: &str) -> HttpResponse {
    HttpResponse::new(status, Vec::new(), Vec::new()).with_header("Location", location)
}

/// Parses a fixture holding exactly one check.
pub fn check(fixture: &str) -> Check {
    let mut checks = parse_fixture(fixture).expect("fixture should parse");
    assert_eq!(checks.len(), 1);
    checks.remove(0)
}
