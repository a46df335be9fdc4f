//! HTTP transport for the SelectPdf API.
//!
//! # Design
//! Requests and responses are plain data. Every POST the clients make goes
//! through the [`Transport`] trait, so the protocol logic above it stays
//! deterministic and tests can replace the network with canned responses.
//! [`UreqTransport`] is the real implementation: one blocking POST per call,
//! bounded by a global timeout, with non-2xx statuses returned as data so the
//! response interpreter decides what they mean.

use std::time::Duration;

use tracing::debug;

use crate::error::ApiError;

/// Request header identifying this client library and its version.
pub const CLIENT_HEADER: &str = "selectpdf-api-client";

/// Value sent in [`CLIENT_HEADER`].
pub const CLIENT_IDENTITY: &str = concat!("rust-", env!("CARGO_PKG_VERSION"));

/// Default timeout for a single request (10 minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// A POST request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Executes exactly one POST and returns whatever the server answered.
///
/// Implementations must return `Err(ApiError::Transport)` only when no HTTP
/// response was obtained at all; every status code, including 4xx/5xx, comes
/// back as an `HttpResponse`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!("POST {} ({} bytes)", request.url, request.body.len());

        let mut builder = self.agent.post(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .send(request.body.as_slice())
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        debug!("HTTP {} ({} bytes)", status, body.len());
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
