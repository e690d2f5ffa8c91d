//! HTTP Client port

use std::future::Future;

use hopcheck_domain::{HopRequest, HttpResponse};
use thiserror::Error;

/// Transport-level failures: the request produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The URI could not be used for a request.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// No response within the configured timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// The timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The host name could not be resolved.
    #[error("cannot resolve {host}: {message}")]
    DnsError {
        /// Target host.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// Any other connection-level failure (TLS, reset, ...).
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The response body could not be read.
    #[error("failed to read body: {0}")]
    Body(String),

    /// The client could not be built from the settings.
    #[error("invalid client configuration: {0}")]
    Configuration(String),

    /// Anything else, including malformed responses.
    #[error("{0}")]
    Other(String),
}

/// Port for sending one request.
///
/// Implementations must NOT follow redirects: a 3xx response is returned
/// as is, and the executor decides whether to continue.
pub trait HttpClient: Send + Sync {
    /// Sends the request and returns the complete response.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if no complete response was received.
    fn send(
        &self,
        request: &HopRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
