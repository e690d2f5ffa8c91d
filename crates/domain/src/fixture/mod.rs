//! Fixture files.
//!
//! A fixture is a list of checks separated by blank lines. Each check
//! starts with a request line (`<`) followed by expectation lines (`>`):
//!
//! ```text
//! # comments start with '#'
//! < HEAD http://example.net
//!   > 301
//!   > Location: https://example.net/
//!   > 200
//!   > =<title>
//! ```

mod check;
mod parser;

pub use check::{Check, ResponseExpectation};
pub use parser::{FixtureSyntaxError, parse_fixture};
