//! Error types for the client layer.

use crate::config::ConfigError;
use crate::dispatch::TransportError;
use logsql_core::{CursorError, ParseError, PatternError, TemplateError};

/// Master error type for every client operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Cursor error: {0}")]
    Cursor(#[from] CursorError),

    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unexpected response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Statement is closed")]
    StatementClosed,

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: &'static str },
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
