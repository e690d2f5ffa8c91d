//! Path query evaluation over parsed HTML.

use std::collections::HashSet;

use hopcheck_domain::{Axis, NodeTest, PathQuery, Predicate, Step};
use scraper::{ElementRef, Html};
use thiserror::Error;

/// Why a body could not be turned into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Nothing to parse.
    #[error("response body is empty")]
    Empty,

    /// Path queries only run on text documents.
    #[error("response body is not valid UTF-8")]
    NotUtf8,
}

/// A response body parsed as an HTML document.
///
/// HTML parsing never fails on markup: like a browser, the parser repairs
/// whatever it is given. Only bodies that are not text at all are refused.
#[derive(Debug)]
pub struct HtmlDocument {
    html: Html,
}

#[derive(Clone, Copy)]
enum Context<'a> {
    Document,
    Element(ElementRef<'a>),
}

impl HtmlDocument {
    /// Parses a response body.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError` if the body is empty, blank or not UTF-8.
    pub fn parse(body: &[u8]) -> Result<Self, DocumentError> {
        let text = std::str::from_utf8(body).map_err(|_| DocumentError::NotUtf8)?;
        if text.trim().is_empty() {
            return Err(DocumentError::Empty);
        }
        Ok(Self {
            html: Html::parse_document(text),
        })
    }

    /// Returns true if the query selects at least one node.
    #[must_use]
    pub fn matches(&self, query: &PathQuery) -> bool {
        self.count(query) > 0
    }

    /// Number of distinct nodes the query selects.
    #[must_use]
    pub fn count(&self, query: &PathQuery) -> usize {
        let Some((last, init)) = query.steps().split_last() else {
            return 0;
        };

        let mut contexts = vec![if query.is_absolute() {
            Context::Document
        } else {
            Context::Element(self.html.root_element())
        }];

        for step in init {
            contexts = self.select_elements(&contexts, step);
            if contexts.is_empty() {
                return 0;
            }
        }

        match last.test {
            NodeTest::Attribute(_) | NodeTest::Text => self.count_leaves(&contexts, last),
            NodeTest::Element(_) | NodeTest::AnyElement => {
                self.select_elements(&contexts, last).len()
            }
        }
    }

    /// Applies an element step to every context node.
    fn select_elements<'a>(&'a self, contexts: &[Context<'a>], step: &Step) -> Vec<Context<'a>> {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();

        for &context in contexts {
            for parent in self.parents(context, step.axis) {
                let candidates: Vec<_> = self
                    .child_elements(parent)
                    .into_iter()
                    .filter(|el| test_matches(*el, &step.test))
                    .collect();
                // Predicates, positions included, are scoped to one parent.
                for el in apply_predicates(candidates, &step.predicates) {
                    if seen.insert(el.id()) {
                        selected.push(Context::Element(el));
                    }
                }
            }
        }

        selected
    }

    /// Counts the attributes or text nodes a final `@name` or `text()`
    /// step selects. Whitespace-only text nodes are not counted.
    fn count_leaves(&self, contexts: &[Context<'_>], step: &Step) -> usize {
        let mut owners = HashSet::new();
        let mut count = 0;

        for &context in contexts {
            for owner in self.parents(context, step.axis) {
                let Context::Element(el) = owner else {
                    continue;
                };
                if !owners.insert(el.id()) {
                    continue;
                }
                count += match &step.test {
                    NodeTest::Attribute(name) => usize::from(el.value().attr(name).is_some()),
                    NodeTest::Text => el
                        .children()
                        .filter_map(|node| node.value().as_text())
                        .filter(|text| !text.trim().is_empty())
                        .count(),
                    NodeTest::Element(_) | NodeTest::AnyElement => 0,
                };
            }
        }

        count
    }

    /// Nodes whose children a step looks at: the context itself for `/`,
    /// the context and all its descendant elements for `//`.
    fn parents<'a>(&'a self, context: Context<'a>, axis: Axis) -> Vec<Context<'a>> {
        match (axis, context) {
            (Axis::Child, _) => vec![context],
            (Axis::Descendant, Context::Document) => std::iter::once(Context::Document)
                .chain(
                    self.html
                        .tree
                        .root()
                        .descendants()
                        .filter_map(ElementRef::wrap)
                        .map(Context::Element),
                )
                .collect(),
            (Axis::Descendant, Context::Element(el)) => el
                .descendants()
                .filter_map(ElementRef::wrap)
                .map(Context::Element)
                .collect(),
        }
    }

    fn child_elements<'a>(&'a self, parent: Context<'a>) -> Vec<ElementRef<'a>> {
        match parent {
            Context::Document => self
                .html
                .tree
                .root()
                .children()
                .filter_map(ElementRef::wrap)
                .collect(),
            Context::Element(el) => el.children().filter_map(ElementRef::wrap).collect(),
        }
    }
}

fn test_matches(el: ElementRef<'_>, test: &NodeTest) -> bool {
    match test {
        NodeTest::Element(name) => el.value().name().eq_ignore_ascii_case(name),
        NodeTest::AnyElement => true,
        NodeTest::Attribute(_) | NodeTest::Text => false,
    }
}

fn apply_predicates<'a>(
    mut candidates: Vec<ElementRef<'a>>,
    predicates: &[Predicate],
) -> Vec<ElementRef<'a>> {
    for predicate in predicates {
        candidates = match predicate {
            Predicate::Position(position) => candidates
                .get(position - 1)
                .copied()
                .into_iter()
                .collect(),
            Predicate::HasAttribute(name) => candidates
                .into_iter()
                .filter(|el| el.value().attr(name).is_some())
                .collect(),
            Predicate::AttributeEquals { name, value } => candidates
                .into_iter()
                .filter(|el| el.value().attr(name) == Some(value.as_str()))
                .collect(),
            Predicate::TextEquals(value) => candidates
                .into_iter()
                .filter(|el| {
                    el.children()
                        .filter_map(|node| node.value().as_text())
                        .any(|text| text.trim() == value)
                })
                .collect(),
        };
    }
    candidates
}
