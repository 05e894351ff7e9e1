//! Error types for the result-handling core.
//!
//! Every variant carries the offending value, index, or pattern so a failure
//! can be diagnosed without re-running the query. All errors are terminal for
//! the operation that raised them; nothing in this crate retries.

use thiserror::Error;

/// Statement template and parameter binding errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template declares {expected} placeholder(s) but {supplied} value(s) were bound")]
    PlaceholderCountMismatch { expected: usize, supplied: usize },

    #[error("Parameter {index} is not set")]
    SlotUnset { index: usize },

    #[error("Parameter index out of range: {index} (placeholder count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Floating point value cannot be represented in query text: {value}")]
    UnrepresentableFloat { value: String },
}

/// Response body materialization errors.
///
/// A bad line aborts the whole materialization; no partial row set is ever
/// produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Failed to parse response row {line_number}: {snippet} ({reason})")]
    BadLine {
        line_number: usize,
        snippet: String,
        reason: String,
    },
}

/// Cursor navigation and cell access errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("Cursor is closed")]
    Closed,

    #[error("Cursor is not positioned on a row")]
    NotOnRow,

    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    #[error("Column index out of range: {index} (column count {count})")]
    ColumnIndexOutOfRange { index: usize, count: usize },

    #[error("Cannot convert value to {target}: {value}")]
    TypeCoercion { target: &'static str, value: String },
}

/// Raised when a catalog name pattern cannot be compiled.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid name pattern {pattern:?}: {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: String,
}
