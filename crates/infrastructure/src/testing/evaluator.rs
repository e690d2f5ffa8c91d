//! Expectation evaluator.
//!
//! Matches one actual response against one expectation block: the status
//! first, then header assertions, then body assertions, each group in
//! fixture order. Every body assertion searches the whole body on its own,
//! so fragments may overlap and appear in any order.

use std::borrow::Cow;
use std::cell::OnceCell;

use hopcheck_application::ports::ResponseEvaluator;
use hopcheck_domain::{Assertion, AssertionEntry, AssertionMismatch, HttpResponse, ResponseExpectation};
use tracing::trace;

use super::document::{DocumentError, HtmlDocument};

/// Evaluator backing the `ResponseEvaluator` port.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectationEvaluator;

impl ExpectationEvaluator {
    /// Create a new evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn check_status(
        expectation: &ResponseExpectation,
        response: &HttpResponse,
    ) -> Result<(), AssertionMismatch> {
        if response.status == expectation.status {
            Ok(())
        } else {
            Err(AssertionMismatch::status(
                expectation.line,
                expectation.status,
                response.status,
            ))
        }
    }

    fn check_assertion(entry: &AssertionEntry, body: &Body<'_>) -> Result<(), AssertionMismatch> {
        let line = entry.line;
        let assertion = &entry.assertion;
        trace!(line, "checking {}", assertion.description());

        match assertion {
            Assertion::Header { name, value } => {
                let actual: Vec<&str> = body.response.header_values(name).collect();
                if actual.contains(&value.as_str()) {
                    Ok(())
                } else {
                    Err(AssertionMismatch::header(line, name, value, &actual))
                }
            }
            Assertion::BodyContains { text } => {
                if body.text().contains(text.as_str()) {
                    Ok(())
                } else {
                    Err(AssertionMismatch::body(
                        line,
                        assertion,
                        format!("body does not contain '{text}'"),
                    ))
                }
            }
            Assertion::BodyMatches { pattern } => {
                if pattern.is_match(body.text()) {
                    Ok(())
                } else {
                    Err(AssertionMismatch::body(
                        line,
                        assertion,
                        format!("body does not match /{pattern}/"),
                    ))
                }
            }
            Assertion::BodyPath { query } => match body.document() {
                Ok(document) if document.matches(query) => Ok(()),
                Ok(_) => Err(AssertionMismatch::body(
                    line,
                    assertion,
                    format!("no node selected by {query}"),
                )),
                Err(e) => Err(AssertionMismatch::body(
                    line,
                    assertion,
                    format!("cannot evaluate {query}: {e}"),
                )),
            },
        }
    }
}

impl ResponseEvaluator for ExpectationEvaluator {
    fn evaluate(
        &self,
        expectation: &ResponseExpectation,
        response: &HttpResponse,
    ) -> Result<(), AssertionMismatch> {
        Self::check_status(expectation, response)?;

        let body = Body::new(response);
        for entry in expectation
            .header_assertions()
            .chain(expectation.body_assertions())
        {
            Self::check_assertion(entry, &body)?;
        }
        Ok(())
    }
}

/// Views of a response body, each computed at most once.
struct Body<'r> {
    response: &'r HttpResponse,
    text: OnceCell<Cow<'r, str>>,
    document: OnceCell<Result<HtmlDocument, DocumentError>>,
}

impl<'r> Body<'r> {
    const fn new(response: &'r HttpResponse) -> Self {
        Self {
            response,
            text: OnceCell::new(),
            document: OnceCell::new(),
        }
    }

    fn text(&self) -> &str {
        self.text.get_or_init(|| self.response.body_text())
    }

    fn document(&self) -> Result<&HtmlDocument, DocumentError> {
        self.document
            .get_or_init(|| HtmlDocument::parse(&self.response.body))
            .as_ref()
            .map_err(|e| *e)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use hopcheck_domain::{MismatchSubject, parse_fixture};
    use pretty_assertions::assert_eq;

    /// Parses expectation lines (starting on fixture line 2) into one block.
    fn expectation(lines: &str) -> ResponseExpectation {
        let source = format!("< http://localhost/\n{lines}");
        let mut checks = parse_fixture(&source).expect("valid fixture");
        checks.remove(0).chain.remove(0)
    }

    fn html(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(status, Vec::new(), body.as_bytes().to_vec())
            .with_header("Content-Type", "text/html")
    }

    fn evaluate(lines: &str, response: &HttpResponse) -> Result<(), AssertionMismatch> {
        ExpectationEvaluator::new().evaluate(&expectation(lines), response)
    }

    #[test]
    fn test_status_only() {
        assert!(evaluate("> 200\n", &html(200, "")).is_ok());

        let mismatch = evaluate("> 301\n", &html(302, "")).unwrap_err();
        assert_eq!(mismatch.subject, MismatchSubject::Status);
        assert_eq!(mismatch.line, 2);
        assert_eq!(mismatch.expected, "301");
        assert_eq!(mismatch.actual.as_deref(), Some("302"));
    }

    #[test]
    fn test_fragments_are_order_independent() {
        let lines = "> 200\n> =</html>\n> =<html>\n";
        assert!(evaluate(lines, &html(200, "<html><body></body></html>")).is_ok());
        assert!(evaluate(lines, &html(200, "</html> then <html>")).is_ok());

        let mismatch = evaluate(lines, &html(200, "<html><body>")).unwrap_err();
        assert_eq!(mismatch.line, 3);
        assert_eq!(mismatch.expected, "=</html>");
        assert_eq!(mismatch.reason, "body does not contain '</html>'");
    }

    #[test]
    fn test_overlapping_fragments() {
        let lines = "> 200\n> =abc\n> =bcd\n";
        assert!(evaluate(lines, &html(200, "abcd")).is_ok());
    }

    #[test]
    fn test_regex_is_a_search() {
        let lines = "> 200\n> ~<title>[^<]+</title>\n";
        assert!(evaluate(lines, &html(200, "<head><title>Home</title></head>")).is_ok());

        let mismatch = evaluate(lines, &html(200, "<head><title></title></head>")).unwrap_err();
        assert_eq!(mismatch.subject, MismatchSubject::Body);
        assert_eq!(mismatch.expected, "~<title>[^<]+</title>");
        assert_eq!(mismatch.actual, None);
    }

    #[test]
    fn test_header_names_ignore_case_values_do_not() {
        let response = html(301, "").with_header("location", "https://example.net/");

        assert!(evaluate("> 301\n> Location: https://example.net/\n", &response).is_ok());

        let mismatch =
            evaluate("> 301\n> LOCATION: https://Example.net/\n", &response).unwrap_err();
        assert_eq!(mismatch.subject, MismatchSubject::Header("LOCATION".to_string()));
        assert_eq!(mismatch.actual.as_deref(), Some("https://example.net/"));
    }

    #[test]
    fn test_missing_header() {
        let mismatch = evaluate("> 200\n> X-Frame-Options: DENY\n", &html(200, "")).unwrap_err();
        assert_eq!(mismatch.actual, None);
        assert_eq!(mismatch.reason, "header 'X-Frame-Options' not found");
    }

    #[test]
    fn test_any_duplicate_header_value_matches() {
        let response = html(200, "")
            .with_header("Set-Cookie", "a=1")
            .with_header("Set-Cookie", "b=2");

        assert!(evaluate("> 200\n> Set-Cookie: b=2\n", &response).is_ok());

        let mismatch = evaluate("> 200\n> Set-Cookie: c=3\n", &response).unwrap_err();
        assert_eq!(mismatch.actual.as_deref(), Some("a=1, b=2"));
    }

    #[test]
    fn test_path_queries() {
        let page = "<html><head><title>Home</title></head><body><a href='/x'>x</a></body></html>";
        assert!(evaluate("> 200\n> /html/head/title\n> //a[@href='/x']\n", &html(200, page)).is_ok());

        let mismatch = evaluate("> 200\n> //table\n", &html(200, page)).unwrap_err();
        assert_eq!(mismatch.expected, "//table");
        assert_eq!(mismatch.reason, "no node selected by //table");
    }

    #[test]
    fn test_path_query_on_unusable_body() {
        let mismatch = evaluate("> 200\n> //title\n", &html(200, "")).unwrap_err();
        assert_eq!(mismatch.reason, "cannot evaluate //title: response body is empty");

        let binary = HttpResponse::new(200, Vec::new(), vec![0xff, 0xfe, 0x00]);
        let mismatch = evaluate("> 200\n> //title\n", &binary).unwrap_err();
        assert_eq!(
            mismatch.reason,
            "cannot evaluate //title: response body is not valid UTF-8"
        );
    }

    #[test]
    fn test_status_reported_before_assertions() {
        let mismatch = evaluate("> 200\n> =missing\n", &html(404, "")).unwrap_err();
        assert_eq!(mismatch.subject, MismatchSubject::Status);
    }

    #[test]
    fn test_headers_reported_before_body() {
        let lines = "> 200\n> =missing\n> X-Missing: yes\n";
        let mismatch = evaluate(lines, &html(200, "")).unwrap_err();
        assert_eq!(mismatch.subject, MismatchSubject::Header("X-Missing".to_string()));
        assert_eq!(mismatch.line, 4);
    }

    #[test]
    fn test_first_failing_body_assertion_in_fixture_order() {
        let lines = "> 200\n> =present\n> ~^nothing$\n> =absent\n";
        let mismatch = evaluate(lines, &html(200, "present")).unwrap_err();
        assert_eq!(mismatch.line, 4);
    }
}
