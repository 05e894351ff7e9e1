//! Client facade: the configured entry point for queries.

use crate::catalog::Catalog;
use crate::config::ClientConfig;
use crate::dispatch::{HttpDispatcher, QueryDispatcher, TransportError};
use crate::error::{Error, Result};
use crate::statement::{PreparedStatement, Statement};
use logsql_core::{materialize, TableData};
use serde::Deserialize;
use std::sync::Arc;

/// Response envelope of the translation service: the translated LogsQL text
/// plus the NDJSON result payload.
#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    #[serde(default)]
    logsql: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

/// One executed query: the translated LogsQL text (when the service reports
/// it) and the materialized result.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub translated: Option<String>,
    pub table: TableData,
}

/// Handle to the remote service.
///
/// Built by the explicit [`Client::connect`] factory; there is no ambient
/// registry. Cloning is cheap; clones share the dispatcher.
#[derive(Clone)]
pub struct Client {
    dispatcher: Arc<dyn QueryDispatcher>,
}

impl Client {
    /// Connect to the service described by `config`.
    ///
    /// Builds the HTTP dispatcher and verifies liveness with one health
    /// check before returning.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.base_url();
        let dispatcher = HttpDispatcher::new(&config)?;
        dispatcher.health_check().await?;
        tracing::info!(base_url = %base_url, "connected to sql-to-logsql service");
        Ok(Self {
            dispatcher: Arc::new(dispatcher),
        })
    }

    /// Build a client over an arbitrary dispatcher. No health check is
    /// performed; this is the seam tests use to script responses.
    pub fn with_dispatcher(dispatcher: Arc<dyn QueryDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Execute literal query text through the full pipeline:
    /// dispatch, envelope decode, materialize.
    ///
    /// `row_cap` of 0 means unlimited.
    pub async fn run_query(&self, query: &str, row_cap: usize) -> Result<QueryOutcome> {
        let reply = self.dispatcher.dispatch(query).await?;
        if reply.status >= 400 {
            return Err(TransportError::Status {
                status: reply.status,
                message: extract_error_message(&reply.body, reply.status),
            }
            .into());
        }

        let envelope = decode_envelope(&reply.body)?;
        let data = envelope.data.unwrap_or_default();
        let table = materialize(&data, row_cap)?;
        tracing::debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            "query materialized"
        );
        Ok(QueryOutcome {
            translated: envelope.logsql,
            table,
        })
    }

    /// A new statement bound to this client.
    pub fn statement(&self) -> Statement {
        Statement::new(self.clone())
    }

    /// A prepared statement over a `?`-placeholder template.
    pub fn prepare(&self, sql: &str) -> PreparedStatement {
        PreparedStatement::new(self.clone(), sql)
    }

    /// Catalog introspection over this client.
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

fn decode_envelope(body: &str) -> Result<QueryEnvelope> {
    if body.trim().is_empty() {
        return Ok(QueryEnvelope {
            logsql: None,
            data: None,
        });
    }
    serde_json::from_str(body).map_err(|e| Error::InvalidResponse {
        reason: format!("malformed response envelope: {e}"),
    })
}

/// Best-effort error text: the `error` field of a JSON body, else the raw
/// body, else the bare status code.
fn extract_error_message(body: &str, status: u16) -> String {
    if body.trim().is_empty() {
        return format!("status={status}");
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("error") {
            Some(serde_json::Value::String(message)) => return message.clone(),
            Some(other) if !other.is_null() => return other.to_string(),
            _ => {}
        }
    }
    body.to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_prefers_error_field() {
        assert_eq!(
            extract_error_message("{\"error\":\"boom\"}", 500),
            "boom"
        );
        assert_eq!(extract_error_message("plain text", 500), "plain text");
        assert_eq!(extract_error_message("  ", 502), "status=502");
    }

    #[test]
    fn test_decode_envelope_blank_body() {
        let envelope = decode_envelope("").unwrap();
        assert!(envelope.logsql.is_none());
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_decode_envelope_rejects_malformed() {
        assert!(decode_envelope("{oops").is_err());
    }
}
