//! Fixture parser.
//!
//! Lines are trimmed before they are looked at, so indentation is free.
//! A line is one of:
//! - blank: ends the current check
//! - `# ...`: comment, ignored
//! - `< [METHOD] URI`: request line, starts a check (method defaults to `GET`)
//! - `> ...`: expectation item, classified in this order:
//!   1. bare integer: status code, starts a new expected response
//!   2. `Name: value` with a header-like name: header assertion
//!   3. `=text`: body contains `text`
//!   4. `~pattern`: body matches the regular expression
//!   5. anything else: structural path query over the body

use thiserror::Error;
use url::Url;

use super::check::{Check, ResponseExpectation};
use crate::error::DomainError;
use crate::path::PathQuery;
use crate::request::HttpMethod;
use crate::testing::{Assertion, AssertionEntry, BodyPattern};

/// Error type for fixture parsing. Every variant names the 1-based line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixtureSyntaxError {
    /// Line is neither a request, an expectation, a comment nor blank.
    #[error("line {line}: expected a request (`<`), an expectation (`>`) or a comment (`#`)")]
    UnexpectedLine {
        /// The line number.
        line: usize,
    },
    /// Expectation line without a request to attach it to.
    #[error("line {line}: expectation is not preceded by a request line")]
    ExpectationBeforeRequest {
        /// The line number.
        line: usize,
    },
    /// Request line inside a check that is still open.
    #[error("line {line}: request line must start a new block after a blank line")]
    RequestInsideBlock {
        /// The line number.
        line: usize,
    },
    /// Header or body assertion before the first status of the chain.
    #[error("line {line}: `{item}` appears before a status code; each response must start with one")]
    AssertionBeforeStatus {
        /// The line number.
        line: usize,
        /// The offending item.
        item: String,
    },
    /// Request with no expected responses.
    #[error("line {line}: request has no expected responses")]
    EmptyChain {
        /// The line number of the request.
        line: usize,
    },
    /// `>` with nothing after it.
    #[error("line {line}: empty expectation")]
    EmptyExpectation {
        /// The line number.
        line: usize,
    },
    /// Request line that cannot be understood.
    #[error("line {line}: invalid request: {message}")]
    InvalidRequest {
        /// The line number.
        line: usize,
        /// The error message.
        message: String,
    },
    /// Item that is not a usable status, pattern or path.
    #[error("line {line}: {source}")]
    InvalidItem {
        /// The line number.
        line: usize,
        /// The underlying domain error.
        source: DomainError,
    },
}

impl FixtureSyntaxError {
    /// The 1-based line the error was found on.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::UnexpectedLine { line }
            | Self::ExpectationBeforeRequest { line }
            | Self::RequestInsideBlock { line }
            | Self::AssertionBeforeStatus { line, .. }
            | Self::EmptyChain { line }
            | Self::EmptyExpectation { line }
            | Self::InvalidRequest { line, .. }
            | Self::InvalidItem { line, .. } => *line,
        }
    }
}

/// One classified `>` line.
#[derive(Debug)]
enum ExpectationItem {
    Status(u16),
    Assertion(Assertion),
}

/// Check being assembled while its block is read.
struct CheckBuilder {
    line: usize,
    method: HttpMethod,
    uri: String,
    chain: Vec<ResponseExpectation>,
}

impl CheckBuilder {
    fn push(&mut self, line: usize, item: ExpectationItem, text: &str) -> Result<(), FixtureSyntaxError> {
        match item {
            ExpectationItem::Status(status) => {
                self.chain.push(ResponseExpectation::new(line, status));
            }
            ExpectationItem::Assertion(assertion) => {
                let Some(current) = self.chain.last_mut() else {
                    return Err(FixtureSyntaxError::AssertionBeforeStatus {
                        line,
                        item: text.to_string(),
                    });
                };
                current.assertions.push(AssertionEntry::new(line, assertion));
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Check, FixtureSyntaxError> {
        if self.chain.is_empty() {
            return Err(FixtureSyntaxError::EmptyChain { line: self.line });
        }
        Ok(Check {
            line: self.line,
            method: self.method,
            uri: self.uri,
            chain: self.chain,
        })
    }
}

/// Parse fixture text into checks, in file order.
///
/// # Errors
///
/// Returns the first syntax error found; no partial result is produced.
pub fn parse_fixture(source: &str) -> Result<Vec<Check>, FixtureSyntaxError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut checks = Vec::new();
    let mut current: Option<CheckBuilder> = None;

    for (index, raw) in source.lines().enumerate() {
        let line_num = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            if let Some(builder) = current.take() {
                checks.push(builder.finish()?);
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('<') {
            if current.is_some() {
                return Err(FixtureSyntaxError::RequestInsideBlock { line: line_num });
            }
            current = Some(parse_request(rest.trim(), line_num)?);
        } else if let Some(rest) = line.strip_prefix('>') {
            let Some(builder) = current.as_mut() else {
                return Err(FixtureSyntaxError::ExpectationBeforeRequest { line: line_num });
            };
            let text = rest.trim();
            let item = classify_item(text, line_num)?;
            builder.push(line_num, item, text)?;
        } else {
            return Err(FixtureSyntaxError::UnexpectedLine { line: line_num });
        }
    }

    if let Some(builder) = current.take() {
        checks.push(builder.finish()?);
    }

    Ok(checks)
}

fn parse_request(rest: &str, line: usize) -> Result<CheckBuilder, FixtureSyntaxError> {
    let invalid = |message: String| FixtureSyntaxError::InvalidRequest { line, message };

    let mut parts = rest.split_whitespace();
    let (method, uri) = match (parts.next(), parts.next(), parts.next()) {
        (None, _, _) => return Err(invalid("missing URI".to_string())),
        (Some(uri), None, _) => (HttpMethod::default(), uri),
        (Some(method), Some(uri), None) => {
            let method = method.parse().map_err(|e: DomainError| invalid(e.to_string()))?;
            (method, uri)
        }
        (Some(_), Some(_), Some(extra)) => {
            return Err(invalid(format!("unexpected `{extra}` after the URI")));
        }
    };

    let parsed = Url::parse(uri).map_err(|e| invalid(format!("{e}: {uri}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("URI must start with http:// or https://: {uri}")));
    }

    Ok(CheckBuilder {
        line,
        method,
        uri: uri.to_string(),
        chain: Vec::new(),
    })
}

fn classify_item(text: &str, line: usize) -> Result<ExpectationItem, FixtureSyntaxError> {
    let invalid = |source: DomainError| FixtureSyntaxError::InvalidItem { line, source };

    if text.is_empty() {
        return Err(FixtureSyntaxError::EmptyExpectation { line });
    }

    if text.bytes().all(|b| b.is_ascii_digit()) {
        return parse_status(text).map(ExpectationItem::Status).map_err(invalid);
    }

    if let Some((name, value)) = split_header(text) {
        return Ok(ExpectationItem::Assertion(Assertion::Header {
            name: name.to_string(),
            value: value.to_string(),
        }));
    }

    if let Some(literal) = text.strip_prefix('=') {
        return Ok(ExpectationItem::Assertion(Assertion::BodyContains {
            text: literal.to_string(),
        }));
    }

    if let Some(pattern) = text.strip_prefix('~') {
        let pattern = BodyPattern::new(pattern).map_err(invalid)?;
        return Ok(ExpectationItem::Assertion(Assertion::BodyMatches { pattern }));
    }

    let query: PathQuery = text.parse().map_err(invalid)?;
    Ok(ExpectationItem::Assertion(Assertion::BodyPath { query }))
}

fn parse_status(text: &str) -> Result<u16, DomainError> {
    text.parse::<u16>()
        .ok()
        .filter(|status| (100..=999).contains(status))
        .ok_or_else(|| DomainError::InvalidStatus(text.to_string()))
}

/// Splits `Name: value` when `Name` looks like an HTTP header name: an
/// ASCII letter or digit followed by RFC 7230 token characters.
fn split_header(text: &str) -> Option<(&str, &str)> {
    let (name, value) = text.split_once(':')?;
    let mut chars = name.chars();
    let first = chars.next()?;
    let is_token = first.is_ascii_alphanumeric() && chars.all(is_tchar);
    is_token.then(|| (name, value.trim()))
}

const fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}
