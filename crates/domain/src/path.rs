//! Structural path queries.
//!
//! A small XPath-like language selecting nodes of a parsed document:
//!
//! ```text
//! query     := ("/" | "//")? step (("/" | "//") step)*
//! step      := nametest predicate* | "@" name | "text()"
//! nametest  := name | "*"
//! predicate := "[" integer "]" | "[" "@" name "]"
//!            | "[" "@" name "=" quoted "]" | "[" "text()" "=" quoted "]"
//! ```
//!
//! A leading `/` anchors the query at the document node, a leading `//`
//! selects from every descendant of the document, and a query without a
//! leading slash is evaluated with the root element as context node.
//! `@name` and `text()` may only appear as the last step.
//!
//! Queries are compiled when the fixture is parsed; evaluation against a
//! document lives with the evaluator.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{DomainError, DomainResult};

/// How a step relates to its context nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Direct children (`/`).
    Child,
    /// Children of the context node or of any of its descendants (`//`).
    Descendant,
}

/// What a step selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// Elements with this (lowercased) name.
    Element(String),
    /// Any element (`*`).
    AnyElement,
    /// An attribute with this (lowercased) name.
    Attribute(String),
    /// Text nodes (`text()`).
    Text,
}

/// A filter applied to the nodes selected by a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// 1-based position among the nodes selected under the same parent.
    Position(usize),
    /// Element carries the attribute.
    HasAttribute(String),
    /// Element carries the attribute with exactly this value.
    AttributeEquals {
        /// Attribute name (lowercased).
        name: String,
        /// Expected value.
        value: String,
    },
    /// Element has a direct text child equal to this value, ignoring
    /// surrounding whitespace.
    TextEquals(String),
}

/// One location step of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Relation to the context nodes.
    pub axis: Axis,
    /// Node test.
    pub test: NodeTest,
    /// Filters, applied in order.
    pub predicates: Vec<Predicate>,
}

/// A compiled structural path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    source: String,
    absolute: bool,
    steps: Vec<Step>,
}

impl PathQuery {
    /// Returns the query as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the query starts at the document node rather than the
    /// root element.
    #[must_use]
    pub const fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// The location steps, never empty.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl fmt::Display for PathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for PathQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl FromStr for PathQuery {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        let source = s.trim();
        let invalid = |message: &str| DomainError::InvalidPathQuery {
            query: source.to_string(),
            message: message.to_string(),
        };

        if source.is_empty() {
            return Err(invalid("query is empty"));
        }

        let (absolute, mut axis, mut rest) = if let Some(rest) = source.strip_prefix("//") {
            (true, Axis::Descendant, rest)
        } else if let Some(rest) = source.strip_prefix('/') {
            (true, Axis::Child, rest)
        } else {
            (false, Axis::Child, source)
        };

        let mut steps = Vec::new();
        loop {
            let (step_text, next) = split_step(rest).map_err(|m| invalid(&m))?;
            if step_text.is_empty() {
                return Err(invalid("empty location step"));
            }
            steps.push(parse_step(axis, step_text).map_err(|m| invalid(&m))?);

            match next {
                Some((next_axis, remainder)) => {
                    axis = next_axis;
                    rest = remainder;
                }
                None => break,
            }
        }

        let last = steps.len() - 1;
        if steps[..last]
            .iter()
            .any(|step| matches!(step.test, NodeTest::Attribute(_) | NodeTest::Text))
        {
            return Err(invalid("`@attribute` and `text()` must be the last step"));
        }

        Ok(Self {
            source: source.to_string(),
            absolute,
            steps,
        })
    }
}

/// Splits off the text of the next step. Returns the step text and, if a
/// separator follows, the axis it introduces and the remaining input.
fn split_step(input: &str) -> Result<(&str, Option<(Axis, &str)>), String> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, ch) in input.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' if depth > 0 => quote = Some(ch),
            '[' => depth += 1,
            ']' => {
                if depth == 0 {
                    return Err("unexpected `]`".to_string());
                }
                depth -= 1;
            }
            '/' if depth == 0 => {
                let after = &input[i + 1..];
                let next = after
                    .strip_prefix('/')
                    .map_or((Axis::Child, after), |r| (Axis::Descendant, r));
                return Ok((&input[..i], Some(next)));
            }
            _ => {}
        }
    }

    if quote.is_some() {
        return Err("unterminated string literal".to_string());
    }
    if depth > 0 {
        return Err("unclosed `[`".to_string());
    }
    Ok((input, None))
}

fn parse_step(axis: Axis, text: &str) -> Result<Step, String> {
    if let Some(rest) = text.strip_prefix("text()") {
        if !rest.is_empty() {
            return Err("`text()` takes no predicates".to_string());
        }
        return Ok(Step {
            axis,
            test: NodeTest::Text,
            predicates: Vec::new(),
        });
    }

    if let Some(name) = text.strip_prefix('@') {
        return Ok(Step {
            axis,
            test: NodeTest::Attribute(parse_name(name)?),
            predicates: Vec::new(),
        });
    }

    let (name, mut rest) = text.find('[').map_or((text, ""), |i| text.split_at(i));
    let test = if name == "*" {
        NodeTest::AnyElement
    } else {
        NodeTest::Element(parse_name(name)?)
    };

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('[') else {
            return Err(format!("unexpected `{rest}` after predicate"));
        };
        let close = closing_bracket(body).ok_or_else(|| "unclosed `[`".to_string())?;
        predicates.push(parse_predicate(body[..close].trim())?);
        rest = &body[close + 1..];
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

/// Index of the `]` closing a predicate body, skipping quoted text.
fn closing_bracket(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, ch) in body.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, ']') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

fn parse_predicate(content: &str) -> Result<Predicate, String> {
    if content.is_empty() {
        return Err("empty predicate".to_string());
    }

    if content.bytes().all(|b| b.is_ascii_digit()) {
        let position: usize = content
            .parse()
            .map_err(|_| format!("position `{content}` is too large"))?;
        if position == 0 {
            return Err("positions start at 1".to_string());
        }
        return Ok(Predicate::Position(position));
    }

    if let Some(attribute) = content.strip_prefix('@') {
        return match attribute.split_once('=') {
            Some((name, value)) => Ok(Predicate::AttributeEquals {
                name: parse_name(name.trim())?,
                value: parse_quoted(value.trim())?,
            }),
            None => Ok(Predicate::HasAttribute(parse_name(attribute.trim())?)),
        };
    }

    if let Some(rest) = content.strip_prefix("text()") {
        let Some(value) = rest.trim_start().strip_prefix('=') else {
            return Err("expected `=` after `text()`".to_string());
        };
        return Ok(Predicate::TextEquals(parse_quoted(value.trim())?));
    }

    Err(format!("unsupported predicate `[{content}]`"))
}

fn parse_name(name: &str) -> Result<String, String> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    if valid {
        Ok(name.to_ascii_lowercase())
    } else {
        Err(format!("invalid name `{name}`"))
    }
}

fn parse_quoted(text: &str) -> Result<String, String> {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('\'' | '"')), Some(close)) if open == close && text.len() >= 2 => {
            Ok(text[1..text.len() - 1].to_string())
        }
        _ => Err(format!("expected a quoted string, found `{text}`")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(axis: Axis, name: &str, predicates: Vec<Predicate>) -> Step {
        Step {
            axis,
            test: NodeTest::Element(name.to_string()),
            predicates,
        }
    }

    #[test]
    fn test_absolute_child_path() {
        let query: PathQuery = "/html/head/title".parse().expect("should parse");
        assert!(query.is_absolute());
        assert_eq!(
            query.steps(),
            &[
                element(Axis::Child, "html", vec![]),
                element(Axis::Child, "head", vec![]),
                element(Axis::Child, "title", vec![]),
            ]
        );
        assert_eq!(query.to_string(), "/html/head/title");
    }

    #[test]
    fn test_descendant_path_with_predicates() {
        let query: PathQuery = r#"//ul[@id="nav"]//LI[2]/a[@href]"#.parse().expect("should parse");
        assert_eq!(
            query.steps(),
            &[
                element(
                    Axis::Descendant,
                    "ul",
                    vec![Predicate::AttributeEquals {
                        name: "id".to_string(),
                        value: "nav".to_string(),
                    }],
                ),
                element(Axis::Descendant, "li", vec![Predicate::Position(2)]),
                element(
                    Axis::Child,
                    "a",
                    vec![Predicate::HasAttribute("href".to_string())]
                ),
            ]
        );
    }

    #[test]
    fn test_relative_path_with_terminal_attribute() {
        let query: PathQuery = "head/link/@rel".parse().expect("should parse");
        assert!(!query.is_absolute());
        assert_eq!(
            query.steps().last().map(|s| &s.test),
            Some(&NodeTest::Attribute("rel".to_string()))
        );
    }

    #[test]
    fn test_slash_inside_quoted_predicate() {
        let query: PathQuery = "//a[@href='/about/team']".parse().expect("should parse");
        assert_eq!(query.steps().len(), 1);
        assert_eq!(
            query.steps()[0].predicates,
            vec![Predicate::AttributeEquals {
                name: "href".to_string(),
                value: "/about/team".to_string(),
            }]
        );
    }

    #[test]
    fn test_text_predicate_and_step() {
        let query: PathQuery = "//h1[text()='Welcome']/text()".parse().expect("should parse");
        assert_eq!(
            query.steps()[0].predicates,
            vec![Predicate::TextEquals("Welcome".to_string())]
        );
        assert_eq!(query.steps()[1].test, NodeTest::Text);
    }

    #[test]
    fn test_rejects_malformed_queries() {
        for bad in [
            "",
            "/",
            "//",
            "/html/",
            "/html//",
            "//div[",
            "//div]",
            "//div[0]",
            "//div[]",
            "//div[@id='x]",
            "//div[@id=x]",
            "//div[last()]",
            "//@href/a",
            "//text()/b",
            "//1div",
            "//div span",
            "//div[1]x",
        ] {
            let result = bad.parse::<PathQuery>();
            assert!(
                matches!(result, Err(DomainError::InvalidPathQuery { .. })),
                "expected `{bad}` to be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_error_names_query() {
        let err = "//div[".parse::<PathQuery>().unwrap_err();
        assert_eq!(err.to_string(), "invalid path query `//div[`: unclosed `[`");
    }
}
