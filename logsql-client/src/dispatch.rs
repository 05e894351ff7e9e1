//! Query dispatch.
//!
//! The dispatcher is the single I/O seam of the client: it takes fully
//! rendered query text and returns the raw response body. Everything above
//! it (rendering) and below it (materialization) is synchronous and pure,
//! so tests swap in a scripted dispatcher and never touch the network.

use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;

/// Raw outcome of one dispatched query: HTTP status plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReply {
    pub status: u16,
    pub body: String,
}

/// Transport failures surfaced from the dispatcher. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Query execution failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Health check against {url} failed with status {status}")]
    HealthCheck { url: String, status: u16 },

    #[error("Invalid static header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Sends literal query text to the remote service.
///
/// Implementations own timeout and header policy; the caller supplies only
/// the rendered text. The one production implementation is
/// [`HttpDispatcher`]; tests use the mock from `logsql-test-utils`.
#[async_trait]
pub trait QueryDispatcher: Send + Sync {
    /// Execute one query, returning status and body for any HTTP outcome.
    /// `Err` is reserved for transport-level failures (connect, timeout).
    async fn dispatch(&self, query: &str) -> Result<DispatchReply, TransportError>;

    /// Probe service liveness. Defaults to a no-op for dispatchers without
    /// a health endpoint.
    async fn health_check(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

// ============================================================================
// HTTP DISPATCHER
// ============================================================================

/// Body of the translation request.
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    sql: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<&'a str>,
    #[serde(rename = "bearerToken", skip_serializing_if = "Option::is_none")]
    bearer_token: Option<&'a str>,
}

/// reqwest-backed dispatcher for the sql-to-logsql HTTP API.
pub struct HttpDispatcher {
    client: reqwest::Client,
    base_url: String,
    endpoint: Option<String>,
    bearer_token: Option<String>,
    headers: HeaderMap,
    timeout: Duration,
}

impl HttpDispatcher {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout());
        if config.scheme == "https" && !config.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let header_name =
                name.parse::<HeaderName>()
                    .map_err(|e| TransportError::InvalidHeader {
                        name: name.clone(),
                        reason: e.to_string(),
                    })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        Ok(Self {
            client,
            base_url: config.base_url(),
            endpoint: config.endpoint.clone(),
            bearer_token: config.bearer_token.clone(),
            headers,
            timeout: config.timeout(),
        })
    }
}

#[async_trait]
impl QueryDispatcher for HttpDispatcher {
    async fn dispatch(&self, query: &str) -> Result<DispatchReply, TransportError> {
        let url = format!("{}/api/v1/sql-to-logsql", self.base_url);
        let body = QueryRequest {
            sql: query,
            endpoint: self.endpoint.as_deref(),
            bearer_token: self.bearer_token.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(status, bytes = body.len(), "query dispatched");
        Ok(DispatchReply { status, body })
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        let url = format!("{}/healthz", self.base_url);
        // connect-time probe: never wait longer than 5s even with a larger
        // configured query timeout
        let timeout = self.timeout.min(Duration::from_secs(5));
        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status >= 400 {
            tracing::error!(url = %url, status, "health check failed");
            return Err(TransportError::HealthCheck { url, status });
        }
        tracing::info!(url = %url, "health check passed");
        Ok(())
    }
}

impl std::fmt::Debug for HttpDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDispatcher")
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
