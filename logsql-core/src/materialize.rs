//! NDJSON response materialization.
//!
//! The remote service answers one complete result per query as
//! newline-delimited JSON objects. Materialization unifies those lines into
//! an ordered column schema and positionally aligned rows.

use crate::error::ParseError;
use crate::value::{Cell, TableData};

/// Parse an NDJSON body into a `TableData`.
///
/// Lines are split on `\n` (a trailing `\r` is tolerated) and blank or
/// whitespace-only lines are skipped. Each remaining line must be a flat
/// JSON object; the first malformed line aborts the whole call and no
/// partial result is returned.
///
/// Column order is the order of first appearance of each key across all
/// parsed lines. Every row is padded with `Cell::Null` for keys it does not
/// carry. When `row_cap > 0` the row set is truncated to the first
/// `row_cap` rows in original order; the schema still reflects every parsed
/// line.
pub fn materialize(raw: &str, row_cap: usize) -> Result<TableData, ParseError> {
    let mut columns: Vec<String> = Vec::new();
    let mut parsed: Vec<serde_json::Map<String, serde_json::Value>> = Vec::new();

    for (line_number, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(trimmed)
            .map_err(|e| ParseError::BadLine {
                line_number: line_number + 1,
                snippet: snippet(trimmed),
                reason: e.to_string(),
            })?;
        for key in object.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        parsed.push(object);
    }

    if row_cap > 0 && parsed.len() > row_cap {
        parsed.truncate(row_cap);
    }

    let rows = parsed
        .into_iter()
        .map(|mut object| {
            columns
                .iter()
                .map(|column| match object.remove(column) {
                    Some(value) => Cell::from_json(value),
                    None => Cell::Null,
                })
                .collect()
        })
        .collect();

    Ok(TableData::new(columns, rows))
}

fn snippet(line: &str) -> String {
    const MAX: usize = 120;
    if line.len() <= MAX {
        line.to_string()
    } else {
        let mut end = MAX;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &line[..end])
    }
}

// ============================================================================
// TESTS
// ============================================================================
