//! Client settings
//!
//! Defines how every request of a run is decorated and bounded: user
//! agent, timeout, extra headers, cookies and cache suppression.

use crate::error::{DomainError, DomainResult};

/// Headers sent with every request when `no_cache` is on, so that
/// caches between the runner and the server answer nothing themselves.
pub const NO_CACHE_HEADERS: [(&str, &str); 2] = [
    ("Cache-Control", "no-cache, no-store"),
    ("Pragma", "no-cache"),
];

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Settings the HTTP transport is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// User-Agent header value.
    pub user_agent: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Extra request headers, in the order given.
    pub headers: Vec<(String, String)>,
    /// Cookies, sent together as one `Cookie` header.
    pub cookies: Vec<(String, String)>,
    /// Send cache-suppressing headers.
    pub no_cache: bool,
}

fn default_user_agent() -> String {
    format!("hopcheck/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            headers: Vec::new(),
            cookies: Vec::new(),
            no_cache: true,
        }
    }
}

impl ClientSettings {
    /// Parses a `Name: value` header setting and appends it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidHeader` if there is no colon or the
    /// name is empty.
    pub fn add_header(&mut self, raw: &str) -> DomainResult<()> {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| DomainError::InvalidHeader(format!("expected `Name: value`, got `{raw}`")))?;
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(DomainError::InvalidHeader(format!("bad header name in `{raw}`")));
        }
        self.headers.push((name.to_string(), value.trim().to_string()));
        Ok(())
    }

    /// Parses a `name=value` cookie setting and appends it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCookie` if there is no `=` or the
    /// name is empty.
    pub fn add_cookie(&mut self, raw: &str) -> DomainResult<()> {
        let (name, value) = raw
            .split_once('=')
            .ok_or_else(|| DomainError::InvalidCookie(format!("expected `name=value`, got `{raw}`")))?;
        let name = name.trim();
        if name.is_empty() || name.contains([';', ' ']) {
            return Err(DomainError::InvalidCookie(format!("bad cookie name in `{raw}`")));
        }
        self.cookies.push((name.to_string(), value.trim().to_string()));
        Ok(())
    }

    /// Builds the `Cookie` header value, if any cookie is configured.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<_> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }

    /// All headers to send with every request, user agent excluded.
    #[must_use]
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if self.no_cache {
            headers.extend(
                NO_CACHE_HEADERS
                    .iter()
                    .map(|(n, v)| ((*n).to_string(), (*v).to_string())),
            );
        }
        headers.extend(self.headers.iter().cloned());
        if let Some(cookie) = self.cookie_header() {
            headers.push(("Cookie".to_string(), cookie));
        }
        headers
    }
}
