//! Hopcheck Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: an HTTP transport built on
//! reqwest that never follows redirects, and the evaluator matching
//! responses against expectation blocks.

pub mod adapters;
pub mod testing;

pub use adapters::ReqwestHttpClient;
pub use testing::{DocumentError, ExpectationEvaluator, HtmlDocument};
