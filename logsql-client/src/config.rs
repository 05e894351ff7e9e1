//! Client configuration.
//!
//! A `ClientConfig` can be loaded from a TOML file, parsed from a DSN string
//! (`logsql://host[:port][/base-path][?key=value&...]`), or assembled in
//! code. It carries everything the transport needs: the service address, the
//! upstream endpoint identity, the bearer token, static headers, and the
//! request timeout.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// DSN prefix accepted by [`ClientConfig::from_dsn`].
pub const DSN_PREFIX: &str = "logsql://";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ClientConfig {
    /// Host of the sql-to-logsql translation service.
    pub host: String,
    pub port: u16,
    /// `http` or `https`.
    pub scheme: String,
    /// Path prefix the service is mounted under, if any.
    pub base_path: String,
    /// Upstream VictoriaLogs endpoint URL forwarded with every query.
    pub endpoint: Option<String>,
    /// Bearer token for the upstream endpoint, forwarded with every query.
    pub bearer_token: Option<String>,
    pub timeout_ms: u64,
    /// Verify TLS certificates when the scheme is `https`.
    pub verify_tls: bool,
    /// Static headers attached to every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            scheme: DEFAULT_SCHEME.to_string(),
            base_path: String::new(),
            endpoint: None,
            bearer_token: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            verify_tls: true,
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid DSN: {dsn} ({reason})")]
    InvalidDsn { dsn: String, reason: String },

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ClientConfig {
    /// Load and validate a TOML config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate TOML config text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a DSN of the form
    /// `logsql://host[:port][/base-path][?key=value&...]`.
    ///
    /// Recognized query keys: `host`, `port`, `scheme`, `endpoint`,
    /// `bearerToken`, `timeout` (milliseconds), `verify`, and
    /// `header.<name>` (or the legacy `headers.<name>`) for static headers.
    /// Values are URL-decoded. Authority host/port win over query keys.
    pub fn from_dsn(dsn: &str) -> Result<Self, ConfigError> {
        let tail = dsn
            .strip_prefix(DSN_PREFIX)
            .ok_or_else(|| ConfigError::InvalidDsn {
                dsn: dsn.to_string(),
                reason: format!("must start with {DSN_PREFIX}"),
            })?;

        let (address, query) = match tail.split_once('?') {
            Some((address, query)) => (address, Some(query)),
            None => (tail, None),
        };
        let (authority, path) = match address.find('/') {
            Some(at) => (&address[..at], &address[at..]),
            None => (address, ""),
        };

        let mut params: BTreeMap<String, String> = BTreeMap::new();
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = match pair.split_once('=') {
                    Some((key, value)) => (key, value),
                    None => (pair, ""),
                };
                params.insert(decode(dsn, key)?, decode(dsn, value)?);
            }
        }

        let mut config = ClientConfig::default();

        if let Some(host) = params.get("host").filter(|h| !h.is_empty()) {
            config.host = host.clone();
        }
        if let Some(port) = params.get("port") {
            config.port = parse_port(port)?;
        }
        match authority.rsplit_once(':') {
            Some((host, port)) => {
                if !host.is_empty() {
                    config.host = host.to_string();
                }
                config.port = parse_port(port)?;
            }
            None => {
                if !authority.is_empty() {
                    config.host = authority.to_string();
                }
            }
        }

        config.base_path = match path {
            "" | "/" => String::new(),
            path => path.trim_end_matches('/').to_string(),
        };

        if let Some(scheme) = params.get("scheme").filter(|s| !s.is_empty()) {
            config.scheme = scheme.to_lowercase();
        }
        config.endpoint = params.get("endpoint").and_then(trim_to_none);
        config.bearer_token = params.get("bearerToken").and_then(trim_to_none);
        if let Some(timeout) = params.get("timeout") {
            let millis = timeout
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "timeout",
                    reason: format!("not a millisecond count: {timeout}"),
                })?;
            if millis > 0 {
                config.timeout_ms = millis;
            }
        }
        if let Some(verify) = params.get("verify") {
            config.verify_tls = parse_bool(verify, true);
        }

        for (key, value) in &params {
            if let Some(name) = strip_header_prefix(key) {
                if !name.is_empty() {
                    config.headers.insert(name.to_string(), value.clone());
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "host",
                reason: "must not be empty".to_string(),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port",
                reason: "must be positive".to_string(),
            });
        }
        if self.scheme != "http" && self.scheme != "https" {
            return Err(ConfigError::InvalidValue {
                field: "scheme",
                reason: format!("must be http or https, got {}", self.scheme),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Service base URL: `scheme://host:port[/base-path]`.
    pub fn base_url(&self) -> String {
        let mut url = format!("{}://{}:{}", self.scheme, self.host, self.port);
        let path = self.base_path.trim_end_matches('/');
        if !path.is_empty() {
            if !path.starts_with('/') {
                url.push('/');
            }
            url.push_str(path);
        }
        url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn decode(dsn: &str, value: &str) -> Result<String, ConfigError> {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .map_err(|e| ConfigError::InvalidDsn {
            dsn: dsn.to_string(),
            reason: format!("bad percent-encoding in {value:?}: {e}"),
        })
}

fn parse_port(port: &str) -> Result<u16, ConfigError> {
    match port.parse::<u16>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue {
            field: "port",
            reason: format!("not a valid port: {port}"),
        }),
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

/// Strip a case-insensitive `header.` (or legacy `headers.`) prefix,
/// keeping the header name in its original case.
fn strip_header_prefix(key: &str) -> Option<&str> {
    for prefix in ["header.", "headers."] {
        if let Some(head) = key.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return Some(&key[prefix.len()..]);
            }
        }
    }
    None
}

fn trim_to_none(value: &String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert_eq!(config.scheme, "http");
        assert!(config.verify_tls);
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_dsn_full_form() {
        let config = ClientConfig::from_dsn(
            "logsql://example.com:9428/sql?bearerToken=t0ken&endpoint=https%3A%2F%2Flogs%2Finternal&header.X-Scope=abc&timeout=1500",
        )
        .unwrap();
        assert_eq!(config.host, "example.com");
        assert_eq!(config.port, 9428);
        assert_eq!(config.base_path, "/sql");
        assert_eq!(config.bearer_token.as_deref(), Some("t0ken"));
        assert_eq!(config.endpoint.as_deref(), Some("https://logs/internal"));
        assert_eq!(config.headers.get("X-Scope").map(String::as_str), Some("abc"));
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.base_url(), "http://example.com:9428/sql");
    }

    #[test]
    fn test_dsn_minimal_uses_defaults() {
        let config = ClientConfig::from_dsn("logsql://").unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert_eq!(config.base_path, "");
    }

    #[test]
    fn test_dsn_query_host_port_yield_to_authority() {
        let config =
            ClientConfig::from_dsn("logsql://real:9000?host=ignored&port=1111").unwrap();
        assert_eq!(config.host, "real");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_dsn_rejects_wrong_prefix() {
        let err = ClientConfig::from_dsn("postgres://x").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDsn { .. }));
    }

    #[test]
    fn test_dsn_rejects_bad_port() {
        let err = ClientConfig::from_dsn("logsql://host:notaport").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "port", .. }
        ));
    }

    #[test]
    fn test_dsn_legacy_headers_prefix() {
        let config = ClientConfig::from_dsn("logsql://h?headers.X-Trace=1").unwrap();
        assert_eq!(config.headers.get("X-Trace").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_dsn_verify_flag() {
        let config = ClientConfig::from_dsn("logsql://h?scheme=https&verify=off").unwrap();
        assert_eq!(config.scheme, "https");
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ClientConfig::from_toml_str(
            r#"
            host = "logs.internal"
            port = 9428
            scheme = "https"
            bearer_token = "secret"

            [headers]
            "X-Scope-OrgID" = "tenant-1"
            "#,
        )
        .unwrap();
        assert_eq!(config.host, "logs.internal");
        assert_eq!(config.scheme, "https");
        assert_eq!(
            config.headers.get("X-Scope-OrgID").map(String::as_str),
            Some("tenant-1")
        );
    }

    #[test]
    fn test_validation_rejects_bad_scheme() {
        let err = ClientConfig::from_toml_str("scheme = \"ftp\"").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "scheme", .. }
        ));
    }

    #[test]
    fn test_base_url_normalizes_path() {
        let mut config = ClientConfig::default();
        config.base_path = "sql/".to_string();
        assert_eq!(config.base_url(), "http://localhost:8080/sql");
    }
}
