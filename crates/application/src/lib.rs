//! Hopcheck Application - Use cases and ports
//!
//! This crate drives a parsed fixture against a server: it sends each
//! check's request, follows redirects exactly as far as the fixture
//! declares expectations, and stops the run at the first failure.
//! The HTTP transport and the assertion evaluator are reached through
//! the ports defined here and implemented in the infrastructure layer.

pub mod error;
pub mod ports;
pub mod use_cases;

pub use error::HopFailure;
pub use ports::{HttpClient, ResponseEvaluator, TransportError};
pub use use_cases::{CheckFailure, ExecuteCheck, ExecutionResult, RunFixture, RunOutcome, RunState};
