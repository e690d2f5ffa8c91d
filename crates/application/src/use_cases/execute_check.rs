//! Execute Check Use Case
//!
//! Sends a check's request and walks its redirect chain one hop per
//! expectation block. The number of blocks in the fixture, not the
//! server's status codes, decides how many hops are taken.

use std::sync::Arc;

use hopcheck_domain::{Check, HopRequest, HttpResponse};
use tracing::{debug, warn};
use url::Url;

use crate::error::HopFailure;
use crate::ports::{HttpClient, ResponseEvaluator};

/// Result of executing one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Every declared hop matched.
    Pass {
        /// Number of hops taken.
        hops: usize,
    },
    /// A hop failed; later hops were not requested.
    Fail {
        /// 0-based index of the failing expectation in the chain.
        expectation_index: usize,
        /// URI requested for the failing hop.
        uri: String,
        /// What went wrong.
        reason: HopFailure,
    },
}

impl ExecutionResult {
    /// Returns true for `Pass`.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass { .. })
    }

    fn fail(expectation_index: usize, request: &HopRequest, reason: HopFailure) -> Self {
        Self::Fail {
            expectation_index,
            uri: request.uri.clone(),
            reason,
        }
    }
}

/// Use case for executing one check against a server.
///
/// # Example
///
/// ```ignore
/// let executor = ExecuteCheck::new(Arc::new(client), ExpectationEvaluator::new());
/// let result = executor.execute(&check).await;
/// ```
pub struct ExecuteCheck<C: HttpClient, E: ResponseEvaluator> {
    client: Arc<C>,
    evaluator: E,
}

impl<C: HttpClient, E: ResponseEvaluator> ExecuteCheck<C, E> {
    /// Creates a new `ExecuteCheck` with the given transport and evaluator.
    pub const fn new(client: Arc<C>, evaluator: E) -> Self {
        Self { client, evaluator }
    }

    /// Executes the check, one request per expectation block.
    pub async fn execute(&self, check: &Check) -> ExecutionResult {
        let mut request = check.initial_request();
        let hops = check.chain.len();

        for (index, expectation) in check.chain.iter().enumerate() {
            debug!(hop = index + 1, %request, "sending request");
            if request.method.has_bodiless_response() && expectation.body_assertions().next().is_some() {
                warn!(
                    line = expectation.line,
                    "{} responses have no body, body assertions cannot match",
                    request.method
                );
            }

            let response = match self.client.send(&request).await {
                Ok(response) => response,
                Err(e) => return ExecutionResult::fail(index, &request, e.into()),
            };

            debug!(
                hop = index + 1,
                status = %response.status_line(),
                redirect = response.is_redirection(),
                elapsed_ms = u64::try_from(response.duration.as_millis()).unwrap_or(u64::MAX),
                "received response"
            );

            if let Err(mismatch) = self.evaluator.evaluate(expectation, &response) {
                return ExecutionResult::fail(index, &request, mismatch.into());
            }

            let remaining = hops - index - 1;
            if remaining == 0 {
                break;
            }

            request = match next_hop(&request, &response, remaining) {
                Ok(next) => next,
                Err(reason) => return ExecutionResult::fail(index, &request, reason),
            };
        }

        ExecutionResult::Pass { hops }
    }
}

/// Builds the request for the hop after `response`, resolving a relative
/// `Location` against the URI that produced it.
fn next_hop(
    request: &HopRequest,
    response: &HttpResponse,
    remaining: usize,
) -> Result<HopRequest, HopFailure> {
    let location = response
        .location()
        .map(str::trim)
        .filter(|location| !location.is_empty())
        .ok_or(HopFailure::MissingRedirectTarget {
            status: response.status,
            remaining,
        })?;

    let invalid = |message: String| HopFailure::InvalidRedirectTarget {
        location: location.to_string(),
        message,
    };

    let base = Url::parse(&request.uri).map_err(|e| invalid(e.to_string()))?;
    let target = base.join(location).map_err(|e| invalid(e.to_string()))?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", target.scheme())));
    }

    Ok(request.redirected_to(target))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::TransportError;
    use crate::use_cases::test_support::{ScriptedClient, StatusAndHeaders, check, redirect};
    use hopcheck_domain::{HttpMethod, MismatchSubject};
    use pretty_assertions::assert_eq;

    fn executor(client: &Arc<ScriptedClient>) -> ExecuteCheck<ScriptedClient, StatusAndHeaders> {
        ExecuteCheck::new(Arc::clone(client), StatusAndHeaders)
    }

    #[tokio::test]
    async fn test_follows_declared_chain() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(redirect(301, "https://example.net/")),
            Ok(redirect(302, "https://example.net/")),
        ]));
        let check = check(
            "< HEAD http://example.net\n> 301\n> Location: https://example.net/\n> 302\n> Location: https://example.net/\n",
        );

        let result = executor(&client).execute(&check).await;

        assert_eq!(result, ExecutionResult::Pass { hops: 2 });
        assert_eq!(
            client.sent(),
            vec![
                HopRequest::new(HttpMethod::Head, "http://example.net"),
                HopRequest::new(HttpMethod::Head, "https://example.net/"),
            ]
        );
    }

    #[tokio::test]
    async fn test_first_hop_mismatch_stops_chain() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(redirect(302, "https://example.net/")),
            Ok(redirect(302, "https://example.net/")),
        ]));
        let check = check("< HEAD http://example.net\n> 301\n> Location: https://example.net/\n> 302\n");

        let result = executor(&client).execute(&check).await;

        match result {
            ExecutionResult::Fail {
                expectation_index,
                uri,
                reason: HopFailure::Mismatch(mismatch),
            } => {
                assert_eq!(expectation_index, 0);
                assert_eq!(uri, "http://example.net");
                assert_eq!(mismatch.subject, MismatchSubject::Status);
                assert_eq!(mismatch.expected, "301");
                assert_eq!(mismatch.actual.as_deref(), Some("302"));
                assert_eq!(mismatch.line, 2);
            }
            other => panic!("expected status mismatch, got {other:?}"),
        }
        assert_eq!(client.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_declared_hop_count_limits_requests() {
        let responses = (1..=5)
            .map(|n| Ok(redirect(302, &format!("/step{n}"))))
            .collect();
        let client = Arc::new(ScriptedClient::new(responses));
        let check = check("< http://localhost/start\n> 302\n> 302\n");

        let result = executor(&client).execute(&check).await;

        assert_eq!(result, ExecutionResult::Pass { hops: 2 });
        let uris: Vec<_> = client.sent().into_iter().map(|r| r.uri).collect();
        assert_eq!(uris, vec!["http://localhost/start", "http://localhost/step1"]);
    }

    #[tokio::test]
    async fn test_relative_locations_are_resolved() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(redirect(301, "/docs/")),
            Ok(redirect(301, "intro")),
            Ok(redirect(301, "//cdn.example.org/x")),
            Ok(HttpResponse::new(200, Vec::new(), Vec::new())),
        ]));
        let check = check("< http://example.org/a/b\n> 301\n> 301\n> 301\n> 200\n");

        let result = executor(&client).execute(&check).await;

        assert!(result.is_pass());
        let uris: Vec<_> = client.sent().into_iter().map(|r| r.uri).collect();
        assert_eq!(
            uris,
            vec![
                "http://example.org/a/b",
                "http://example.org/docs/",
                "http://example.org/docs/intro",
                "http://cdn.example.org/x",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_location_with_hops_left() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(HttpResponse::new(
            200,
            Vec::new(),
            Vec::new(),
        ))]));
        let check = check("< http://localhost/\n> 200\n> 200\n> 200\n");

        let result = executor(&client).execute(&check).await;

        assert_eq!(
            result,
            ExecutionResult::Fail {
                expectation_index: 0,
                uri: "http://localhost/".to_string(),
                reason: HopFailure::MissingRedirectTarget {
                    status: 200,
                    remaining: 2
                },
            }
        );
    }

    #[tokio::test]
    async fn test_blank_location_is_missing_target() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(redirect(301, "  ")),
            Ok(HttpResponse::new(200, Vec::new(), Vec::new())),
        ]));
        let check = check("< http://localhost/a\n> 301\n> 200\n");

        let result = executor(&client).execute(&check).await;

        assert_eq!(
            result,
            ExecutionResult::Fail {
                expectation_index: 0,
                uri: "http://localhost/a".to_string(),
                reason: HopFailure::MissingRedirectTarget {
                    status: 301,
                    remaining: 1
                },
            }
        );
        assert_eq!(client.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_last_hop_may_still_redirect() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(redirect(301, "/elsewhere"))]));
        let check = check("< http://localhost/\n> 301\n");

        let result = executor(&client).execute(&check).await;

        assert_eq!(result, ExecutionResult::Pass { hops: 1 });
        assert_eq!(client.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_unusable_location() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(redirect(
            301,
            "mailto:someone@example.org",
        ))]));
        let check = check("< http://localhost/\n> 301\n> 200\n");

        let result = executor(&client).execute(&check).await;

        match result {
            ExecutionResult::Fail {
                reason: HopFailure::InvalidRedirectTarget { location, .. },
                ..
            } => assert_eq!(location, "mailto:someone@example.org"),
            other => panic!("expected invalid redirect target, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_on_second_hop() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(redirect(301, "https://localhost/")),
            Err(TransportError::Timeout { timeout_ms: 100 }),
        ]));
        let check = check("< http://localhost/\n> 301\n> 200\n");

        let result = executor(&client).execute(&check).await;

        assert_eq!(
            result,
            ExecutionResult::Fail {
                expectation_index: 1,
                uri: "https://localhost/".to_string(),
                reason: HopFailure::Transport(TransportError::Timeout { timeout_ms: 100 }),
            }
        );
    }
}
