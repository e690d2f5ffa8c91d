//! Hopcheck Domain - Core types
//!
//! This crate defines the fixture model for hopcheck: the checks parsed
//! from a fixture file, the expectations attached to every hop of a
//! redirect chain and the assertions those expectations are made of.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod fixture;
pub mod path;
pub mod request;
pub mod response;
pub mod settings;
pub mod testing;

pub use error::{DomainError, DomainResult};
pub use fixture::{Check, FixtureSyntaxError, ResponseExpectation, parse_fixture};
pub use path::{Axis, NodeTest, PathQuery, Predicate, Step};
pub use request::{HopRequest, HttpMethod};
pub use response::HttpResponse;
pub use settings::ClientSettings;
pub use testing::{Assertion, AssertionEntry, AssertionMismatch, BodyPattern, MismatchSubject};
