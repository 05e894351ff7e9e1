//! LogSQL core - result handling for a schema-less log-search service
//!
//! This crate is the pure, I/O-free half of the client: it renders
//! parameterized statement templates into literal query text, materializes
//! NDJSON response bodies into ordered columns and rows, infers a semantic
//! type per column, and exposes the buffered result through a scrollable,
//! read-only cursor. Transport and configuration live in `logsql-client`.

pub mod cursor;
pub mod error;
pub mod glob;
pub mod infer;
pub mod materialize;
pub mod render;
pub mod value;

pub use cursor::{ColumnIndex, Cursor};
pub use error::{CursorError, ParseError, PatternError, TemplateError};
pub use glob::GlobPattern;
pub use infer::infer_column_types;
pub use materialize::materialize;
pub use render::{count_placeholders, ParamSlot, ParamValue, StatementTemplate};
pub use value::{Cell, ColumnType, TableData};
