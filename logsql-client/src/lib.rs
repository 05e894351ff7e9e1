//! LogSQL client - SQL-over-HTTP access to a schema-less log-search service
//!
//! Connects to a sql-to-logsql translation service, executes plain and
//! parameterized statements, and exposes buffered results through the
//! scrollable cursors of `logsql-core`. Also emulates a relational catalog
//! (tables, views, columns) on top of the service's introspection
//! statements.
//!
//! The pipeline per logical query is strictly sequential:
//! render → dispatch → materialize → infer. The dispatch is the only
//! suspension point; there are no internal retries and no cancellation.

pub mod catalog;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod statement;

pub use catalog::{Catalog, CatalogEntry, ColumnDescriptor, EntityKind};
pub use client::{Client, QueryOutcome};
pub use config::{ClientConfig, ConfigError};
pub use dispatch::{DispatchReply, HttpDispatcher, QueryDispatcher, TransportError};
pub use error::{Error, Result};
pub use statement::{PreparedStatement, Statement};

// Re-export the core surface so callers depend on one crate.
pub use logsql_core::{
    Cell, ColumnType, Cursor, CursorError, ParamSlot, ParamValue, ParseError, StatementTemplate,
    TableData, TemplateError,
};
