//! HTTP request domain types

mod hop;
mod method;

pub use hop::HopRequest;
pub use method::HttpMethod;
