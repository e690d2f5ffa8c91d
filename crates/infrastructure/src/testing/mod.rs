//! Response testing infrastructure.
//!
//! This module provides the evaluator that matches actual responses
//! against expectation blocks, and the HTML document model path queries
//! run on.

mod document;
mod evaluator;

pub use document::{DocumentError, HtmlDocument};
pub use evaluator::ExpectationEvaluator;
