//! Catalog emulation.
//!
//! The remote service has no information-schema endpoint; table, view, and
//! column metadata are derived by running a small set of fixed introspection
//! statements through the ordinary query pipeline and reshaping the rows.

use crate::client::Client;
use crate::error::Result;
use logsql_core::{Cell, Cursor, GlobPattern, TableData};

const LIST_TABLES: &str = "SHOW TABLES";
const LIST_VIEWS: &str = "SHOW VIEWS";

/// Kind of a catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Table,
    View,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Table => "TABLE",
            EntityKind::View => "VIEW",
        }
    }
}

/// One table or view known to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub kind: EntityKind,
    /// Free-text description; for this service, the saved query text.
    pub remarks: Option<String>,
}

/// One column of a catalog entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub table_name: String,
    pub column_name: String,
    /// 1-based position within its entity, in describe-response order.
    pub ordinal: u32,
    /// Free-text description; for this service, the hit count.
    pub remarks: Option<String>,
}

/// Catalog introspection bound to one client.
#[derive(Debug)]
pub struct Catalog<'a> {
    client: &'a Client,
}

impl<'a> Catalog<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// List tables and views.
    ///
    /// An empty `kinds` slice means every kind. `name_pattern` is a
    /// `%`/`_` glob (case-insensitive, anchored); absent or empty matches
    /// everything. The result is sorted case-insensitively by name.
    pub async fn list_entities(
        &self,
        kinds: &[EntityKind],
        name_pattern: Option<&str>,
    ) -> Result<Vec<CatalogEntry>> {
        let pattern = GlobPattern::compile(name_pattern)?;
        let mut entries = Vec::new();
        if kinds.is_empty() || kinds.contains(&EntityKind::Table) {
            self.collect_entities(LIST_TABLES, "table_name", EntityKind::Table, &pattern, &mut entries)
                .await?;
        }
        if kinds.is_empty() || kinds.contains(&EntityKind::View) {
            self.collect_entities(LIST_VIEWS, "view_name", EntityKind::View, &pattern, &mut entries)
                .await?;
        }
        entries.sort_by_key(|entry| entry.name.to_uppercase());
        Ok(entries)
    }

    /// Describe the columns of every entity matching `table_pattern`,
    /// keeping only columns matching `column_pattern`.
    ///
    /// Ordinals start at 1 per entity and follow describe-response order of
    /// the kept columns. The combined result is sorted case-insensitively
    /// by (entity name, column name).
    pub async fn describe_columns(
        &self,
        table_pattern: Option<&str>,
        column_pattern: Option<&str>,
    ) -> Result<Vec<ColumnDescriptor>> {
        let pattern = GlobPattern::compile(column_pattern)?;
        let entities = self.list_entities(&[], table_pattern).await?;

        let mut descriptors = Vec::new();
        for entity in entities {
            let query = match entity.kind {
                EntityKind::Table => format!("DESCRIBE TABLE {}", entity.name),
                EntityKind::View => format!("DESCRIBE VIEW {}", entity.name),
            };
            let table = self.client.run_query(&query, 0).await?.table;

            let mut ordinal = 1u32;
            for row in 0..table.row_count() {
                let column_name = match text_field(&table, row, "field_name") {
                    Some(name) => name,
                    None => continue,
                };
                if !pattern.matches(&column_name) {
                    continue;
                }
                descriptors.push(ColumnDescriptor {
                    table_name: entity.name.clone(),
                    column_name,
                    ordinal,
                    remarks: text_field(&table, row, "hits"),
                });
                ordinal += 1;
            }
        }

        descriptors.sort_by_key(|d| (d.table_name.to_uppercase(), d.column_name.to_uppercase()));
        Ok(descriptors)
    }

    /// `list_entities` exposed as a cursor with columns
    /// `table_name, table_type, remarks`.
    pub async fn entity_cursor(
        &self,
        kinds: &[EntityKind],
        name_pattern: Option<&str>,
    ) -> Result<Cursor> {
        let entries = self.list_entities(kinds, name_pattern).await?;
        let columns = vec![
            "table_name".to_string(),
            "table_type".to_string(),
            "remarks".to_string(),
        ];
        let rows = entries
            .into_iter()
            .map(|entry| {
                vec![
                    Cell::Text(entry.name),
                    Cell::Text(entry.kind.as_str().to_string()),
                    entry.remarks.map(Cell::Text).unwrap_or(Cell::Null),
                ]
            })
            .collect();
        Ok(Cursor::new(TableData::new(columns, rows)))
    }

    /// `describe_columns` exposed as a cursor with columns
    /// `table_name, column_name, ordinal, remarks`.
    pub async fn column_cursor(
        &self,
        table_pattern: Option<&str>,
        column_pattern: Option<&str>,
    ) -> Result<Cursor> {
        let descriptors = self.describe_columns(table_pattern, column_pattern).await?;
        let columns = vec![
            "table_name".to_string(),
            "column_name".to_string(),
            "ordinal".to_string(),
            "remarks".to_string(),
        ];
        let rows = descriptors
            .into_iter()
            .map(|d| {
                vec![
                    Cell::Text(d.table_name),
                    Cell::Text(d.column_name),
                    Cell::Int(d.ordinal as i32),
                    d.remarks.map(Cell::Text).unwrap_or(Cell::Null),
                ]
            })
            .collect();
        Ok(Cursor::new(TableData::new(columns, rows)))
    }

    async fn collect_entities(
        &self,
        query: &str,
        name_column: &str,
        kind: EntityKind,
        pattern: &GlobPattern,
        out: &mut Vec<CatalogEntry>,
    ) -> Result<()> {
        let table = self.client.run_query(query, 0).await?.table;
        for row in 0..table.row_count() {
            let name = match text_field(&table, row, name_column) {
                Some(name) => name,
                None => continue,
            };
            if !pattern.matches(&name) {
                continue;
            }
            out.push(CatalogEntry {
                name,
                kind,
                remarks: text_field(&table, row, "query"),
            });
        }
        Ok(())
    }
}

/// Display text of the named field in one row; `None` for absent columns
/// and null cells.
fn text_field(table: &TableData, row: usize, column: &str) -> Option<String> {
    let position = table.column_position(column)?;
    table.cell(row, position).and_then(Cell::display)
}
