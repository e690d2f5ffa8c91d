//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! Redirects are never followed here: every 3xx comes back to the executor,
//! which decides from the fixture whether another hop is taken.

use std::error::Error as _;
use std::future::Future;
use std::time::{Duration, Instant};

use hopcheck_application::ports::{HttpClient, TransportError};
use hopcheck_domain::{ClientSettings, HopRequest, HttpMethod, HttpResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use tracing::trace;

/// HTTP client implementation using reqwest.
///
/// Built once per run from `ClientSettings`; the user agent, extra headers,
/// cookies and no-cache headers are attached to every request.
pub struct ReqwestHttpClient {
    client: Client,
    timeout_ms: u64,
}

impl ReqwestHttpClient {
    /// Creates a client from run settings.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Configuration` if a configured header is not
    /// a valid HTTP header or the client cannot be built.
    pub fn new(settings: &ClientSettings) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_millis(settings.timeout_ms))
            .default_headers(Self::default_headers(settings)?)
            .build()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            timeout_ms: settings.timeout_ms,
        })
    }

    fn default_headers(settings: &ClientSettings) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in settings.request_headers() {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::Configuration(format!("header name `{name}`: {e}"))
            })?;
            let header_value = HeaderValue::from_str(&value).map_err(|e| {
                TransportError::Configuration(format!("value of header `{name}`: {e}"))
            })?;
            trace!("sending {name}: {value} with every request");
            headers.append(header_name, header_value);
        }
        Ok(headers)
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Options => Method::OPTIONS,
            HttpMethod::Trace => Method::TRACE,
        }
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }

        let host = error
            .url()
            .and_then(Url::host_str)
            .unwrap_or("unknown")
            .to_string();

        if error.is_connect() {
            let message = Self::error_chain(error);
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return TransportError::DnsError { host, message };
            }
            if lower.contains("refused") {
                return TransportError::ConnectionRefused {
                    host,
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        if error.is_body() || error.is_decode() {
            return TransportError::Body(Self::error_chain(error));
        }

        TransportError::Other(Self::error_chain(error))
    }

    /// Joins an error with all of its sources.
    fn error_chain(error: &reqwest::Error) -> String {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

impl HttpClient for ReqwestHttpClient {
    fn send(
        &self,
        request: &HopRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let method = request.method;
        let uri = request.uri.clone();
        let timeout_ms = self.timeout_ms;

        async move {
            let url =
                Url::parse(&uri).map_err(|e| TransportError::InvalidUrl(format!("{e}: {uri}")))?;

            let start = Instant::now();
            let builder = self.client.request(Self::to_reqwest_method(method), url);
            trace!(%method, %uri, "request built");

            let response = builder
                .send()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?;

            let status = response.status().as_u16();

            // Duplicates are kept in arrival order; non-UTF-8 values are decoded lossily.
            let headers: Vec<(String, String)> = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            for (name, value) in &headers {
                trace!(%uri, "received {name}: {value}");
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?
                .to_vec();

            Ok(HttpResponse::new(status, headers, body).with_duration(start.elapsed()))
        }
    }
}
