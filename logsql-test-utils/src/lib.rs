//! Test utilities for the logsql workspace.
//!
//! `MockDispatcher` stands in for the HTTP transport: responses are scripted
//! per query text, every dispatched query is recorded, and health checks can
//! be made to fail. The fixture helpers build response envelopes and NDJSON
//! payloads without hand-writing JSON strings in tests.

use async_trait::async_trait;
use logsql_client::{DispatchReply, QueryDispatcher, TransportError};
use std::collections::HashMap;
use std::sync::Mutex;

// ============================================================================
// FIXTURES
// ============================================================================

/// A service response envelope with the given translated text and NDJSON
/// payload.
pub fn envelope(logsql: Option<&str>, data: &str) -> String {
    let mut body = serde_json::Map::new();
    if let Some(logsql) = logsql {
        body.insert("logsql".to_string(), serde_json::json!(logsql));
    }
    body.insert("data".to_string(), serde_json::json!(data));
    serde_json::Value::Object(body).to_string()
}

/// NDJSON payload from JSON row values, one line per row.
pub fn ndjson(rows: &[serde_json::Value]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&row.to_string());
        out.push('\n');
    }
    out
}

// ============================================================================
// MOCK DISPATCHER
// ============================================================================

/// Scripted dispatcher for tests.
///
/// Queries are matched by exact text; unmatched queries get the fallback
/// reply (an empty successful envelope unless overridden).
pub struct MockDispatcher {
    responses: Mutex<HashMap<String, DispatchReply>>,
    fallback: DispatchReply,
    dispatched: Mutex<Vec<String>>,
    healthy: bool,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            fallback: DispatchReply {
                status: 200,
                body: envelope(None, ""),
            },
            dispatched: Mutex::new(Vec::new()),
            healthy: true,
        }
    }

    /// Script a 200 reply with the given body for one exact query text.
    pub fn with_response(self, query: &str, body: impl Into<String>) -> Self {
        self.with_status(query, 200, body)
    }

    /// Script a reply with an explicit status for one exact query text.
    pub fn with_status(self, query: &str, status: u16, body: impl Into<String>) -> Self {
        self.responses.lock().expect("mock state poisoned").insert(
            query.to_string(),
            DispatchReply {
                status,
                body: body.into(),
            },
        );
        self
    }

    /// Replace the fallback reply used for unscripted queries.
    pub fn with_fallback(mut self, status: u16, body: impl Into<String>) -> Self {
        self.fallback = DispatchReply {
            status,
            body: body.into(),
        };
        self
    }

    /// Make `health_check` fail.
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Every query text dispatched so far, in order.
    pub fn dispatched(&self) -> Vec<String> {
        self.dispatched
            .lock()
            .expect("mock state poisoned")
            .clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatched.lock().expect("mock state poisoned").len()
    }
}

impl Default for MockDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryDispatcher for MockDispatcher {
    async fn dispatch(&self, query: &str) -> Result<DispatchReply, TransportError> {
        self.dispatched
            .lock()
            .expect("mock state poisoned")
            .push(query.to_string());
        let reply = self
            .responses
            .lock()
            .expect("mock state poisoned")
            .get(query)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());
        Ok(reply)
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        if self.healthy {
            Ok(())
        } else {
            Err(TransportError::HealthCheck {
                url: "mock://healthz".to_string(),
                status: 503,
            })
        }
    }
}

impl std::fmt::Debug for MockDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDispatcher")
            .field("healthy", &self.healthy)
            .field("dispatched", &self.dispatch_count())
            .finish()
    }
}
