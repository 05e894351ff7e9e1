//! Column type inference.

use crate::value::{Cell, ColumnType, TableData};

/// Assign a semantic type to every column of a materialized result.
///
/// The first non-null cell found scanning rows in order decides the column
/// type; later cells are never consulted, even when they hold a different
/// shape of value (heterogeneity is handled per cell by cursor accessors).
/// A column with no non-null cell defaults to `Text`.
pub fn infer_column_types(table: &TableData) -> Vec<ColumnType> {
    (0..table.column_count())
        .map(|column| infer_column(table, column))
        .collect()
}

fn infer_column(table: &TableData, column: usize) -> ColumnType {
    for row in table.rows() {
        match &row[column] {
            Cell::Null => continue,
            Cell::Bool(_) => return ColumnType::Boolean,
            Cell::Int(_) => return ColumnType::Integer,
            Cell::Long(_) => return ColumnType::Long,
            Cell::Float(_) => return ColumnType::Float,
            Cell::Double(_) => return ColumnType::Double,
            Cell::Decimal(_) => return ColumnType::Decimal,
            Cell::Timestamp(_) => return ColumnType::Timestamp,
            Cell::Bytes(_) => return ColumnType::Binary,
            Cell::Text(_) => return ColumnType::Text,
        }
    }
    ColumnType::Text
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::materialize;

    #[test]
    fn test_first_non_null_decides() {
        let table = materialize(
            "{\"a\":null,\"b\":true}\n{\"a\":7,\"b\":false}",
            0,
        )
        .unwrap();
        assert_eq!(
            infer_column_types(&table),
            vec![ColumnType::Integer, ColumnType::Boolean]
        );
    }

    #[test]
    fn test_first_sample_wins_over_later_shapes() {
        // Integer first, decimal-shaped text later: the integer decision
        // stands and later cells are a coercion concern.
        let table = materialize("{\"v\":3}\n{\"v\":\"3.25\"}", 0).unwrap();
        assert_eq!(infer_column_types(&table), vec![ColumnType::Integer]);
    }

    #[test]
    fn test_all_null_defaults_to_text() {
        let table = materialize("{\"v\":null}\n{\"v\":null}", 0).unwrap();
        assert_eq!(infer_column_types(&table), vec![ColumnType::Text]);
    }

    #[test]
    fn test_numeric_width_split() {
        let table = materialize("{\"i\":12,\"l\":4000000000,\"d\":0.5}", 0).unwrap();
        assert_eq!(
            infer_column_types(&table),
            vec![ColumnType::Integer, ColumnType::Long, ColumnType::Double]
        );
    }

    #[test]
    fn test_empty_table_has_no_types() {
        let table = materialize("", 0).unwrap();
        assert!(infer_column_types(&table).is_empty());
    }
}
