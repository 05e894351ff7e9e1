//! Cell values and inferred column types.
//!
//! The remote service is schema-less: every result arrives as JSON scalars.
//! `Cell` is the unified in-memory shape for one value, `ColumnType` the
//! semantic tag assigned per column after sampling.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;

// ============================================================================
// CELL
// ============================================================================

/// One materialized value in a result row.
///
/// JSON scalars map directly; JSON arrays and objects are kept as their
/// serialized text since the row transport is flat. `Float`, `Decimal`,
/// `Timestamp`, and `Bytes` never come out of the wire decoder; they exist
/// for synthesized rows (catalog metadata) and typed test fixtures.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
    Text(String),
}

impl Cell {
    /// Decode one JSON value into a cell.
    ///
    /// Integers that fit in 32 bits become `Int`, the rest of the i64 range
    /// becomes `Long`, and unsigned values beyond i64 become `Decimal` so no
    /// precision is lost. Non-scalar values are re-serialized to JSON text.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Cell::Null,
            serde_json::Value::Bool(b) => Cell::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i64::from(i32::MIN) && i <= i64::from(i32::MAX) {
                        Cell::Int(i as i32)
                    } else {
                        Cell::Long(i)
                    }
                } else if let Some(u) = n.as_u64() {
                    Cell::Decimal(Decimal::from(u))
                } else {
                    Cell::Double(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Cell::Text(s),
            other => Cell::Text(other.to_string()),
        }
    }

    /// Whether this cell is the SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Lossless display text for any non-null cell.
    ///
    /// Returns `None` for `Null`. Bytes render as upper-case hex, timestamps
    /// as ISO-8601 instants.
    pub fn display(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Long(l) => Some(l.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Double(d) => Some(d.to_string()),
            Cell::Decimal(d) => Some(d.to_string()),
            Cell::Timestamp(ts) => Some(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Cell::Bytes(b) => Some(hex::encode_upper(b)),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

// ============================================================================
// COLUMN TYPE
// ============================================================================

/// Semantic type tag inferred for one result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    Decimal,
    Timestamp,
    Binary,
    Text,
}

impl ColumnType {
    /// Upper-case SQL-ish name of the type, for diagnostics and metadata.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "INTEGER",
            ColumnType::Long => "BIGINT",
            ColumnType::Float => "REAL",
            ColumnType::Double => "DOUBLE",
            ColumnType::Decimal => "NUMERIC",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Binary => "VARBINARY",
            ColumnType::Text => "VARCHAR",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TABLE DATA
// ============================================================================

/// An immutable, fully buffered result: ordered column names plus rows
/// aligned positionally to them.
///
/// Invariants (upheld by the materializer and the catalog emulator, the two
/// producers): column names are unique, and every row has exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl TableData {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    /// An empty result with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// 0-based position of a column by exact, case-sensitive name.
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (0-based row, 0-based column), if both are in range.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Cell::from_json(serde_json::json!(null)), Cell::Null);
        assert_eq!(Cell::from_json(serde_json::json!(true)), Cell::Bool(true));
        assert_eq!(Cell::from_json(serde_json::json!(7)), Cell::Int(7));
        assert_eq!(
            Cell::from_json(serde_json::json!(4_000_000_000i64)),
            Cell::Long(4_000_000_000)
        );
        assert_eq!(Cell::from_json(serde_json::json!(1.5)), Cell::Double(1.5));
        assert_eq!(
            Cell::from_json(serde_json::json!("hi")),
            Cell::Text("hi".to_string())
        );
    }

    #[test]
    fn test_from_json_u64_beyond_i64_is_decimal() {
        let cell = Cell::from_json(serde_json::json!(u64::MAX));
        assert_eq!(cell, Cell::Decimal(Decimal::from(u64::MAX)));
    }

    #[test]
    fn test_from_json_nested_kept_as_text() {
        let cell = Cell::from_json(serde_json::json!({"a": [1, 2]}));
        assert_eq!(cell, Cell::Text("{\"a\":[1,2]}".to_string()));
    }

    #[test]
    fn test_display_bytes_upper_hex() {
        let cell = Cell::Bytes(vec![0xAB, 0x01]);
        assert_eq!(cell.display(), Some("AB01".to_string()));
    }

    #[test]
    fn test_column_position_is_case_sensitive() {
        let table = TableData::new(vec!["Level".to_string()], vec![]);
        assert_eq!(table.column_position("Level"), Some(0));
        assert_eq!(table.column_position("level"), None);
    }

    #[test]
    fn test_column_type_names() {
        assert_eq!(ColumnType::Long.name(), "BIGINT");
        assert_eq!(ColumnType::Text.to_string(), "VARCHAR");
    }
}
