//! Catalog emulation tests against scripted introspection responses.

use logsql_client::{Client, EntityKind, QueryDispatcher};
use logsql_test_utils::{envelope, ndjson, MockDispatcher};
use std::sync::Arc;

fn catalog_client() -> (Client, Arc<MockDispatcher>) {
    let tables = ndjson(&[
        serde_json::json!({"table_name": "web_errors", "query": "_time:1h app:web error"}),
        serde_json::json!({"table_name": "audit", "query": null}),
    ]);
    let views = ndjson(&[
        serde_json::json!({"view_name": "Errors_View", "query": "_time:1d error"}),
    ]);
    let web_errors_columns = ndjson(&[
        serde_json::json!({"field_name": "_time", "hits": "120"}),
        serde_json::json!({"field_name": "_msg", "hits": "95"}),
        serde_json::json!({"field_name": "app", "hits": "80"}),
    ]);
    let audit_columns = ndjson(&[
        serde_json::json!({"field_name": "actor", "hits": "12"}),
    ]);
    let view_columns = ndjson(&[
        serde_json::json!({"field_name": "_msg", "hits": "95"}),
        serde_json::json!({"hits": "ignored, no field name"}),
        serde_json::json!({"field_name": "level", "hits": "90"}),
    ]);

    let mock = MockDispatcher::new()
        .with_response("SHOW TABLES", envelope(None, &tables))
        .with_response("SHOW VIEWS", envelope(None, &views))
        .with_response(
            "DESCRIBE TABLE web_errors",
            envelope(None, &web_errors_columns),
        )
        .with_response("DESCRIBE TABLE audit", envelope(None, &audit_columns))
        .with_response(
            "DESCRIBE VIEW Errors_View",
            envelope(None, &view_columns),
        );
    let mock = Arc::new(mock);
    let dispatcher: Arc<dyn QueryDispatcher> = Arc::clone(&mock) as Arc<dyn QueryDispatcher>;
    (Client::with_dispatcher(dispatcher), mock)
}

#[tokio::test]
async fn test_list_entities_merges_and_sorts_case_insensitively() {
    let (client, _mock) = catalog_client();

    let entries = client.catalog().list_entities(&[], None).await.unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["audit", "Errors_View", "web_errors"]);
    assert_eq!(entries[0].kind, EntityKind::Table);
    assert_eq!(entries[1].kind, EntityKind::View);
    assert_eq!(
        entries[2].remarks.as_deref(),
        Some("_time:1h app:web error")
    );
    assert_eq!(entries[0].remarks, None);
}

#[tokio::test]
async fn test_list_entities_kind_filter() {
    let (client, mock) = catalog_client();

    let tables = client
        .catalog()
        .list_entities(&[EntityKind::Table], None)
        .await
        .unwrap();
    assert!(tables.iter().all(|e| e.kind == EntityKind::Table));
    assert_eq!(tables.len(), 2);
    // only the table statement ran
    assert_eq!(mock.dispatched(), vec!["SHOW TABLES".to_string()]);

    let views = client
        .catalog()
        .list_entities(&[EntityKind::View], None)
        .await
        .unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].name, "Errors_View");
}

#[tokio::test]
async fn test_list_entities_glob_filter() {
    let (client, _mock) = catalog_client();

    let entries = client
        .catalog()
        .list_entities(&[], Some("%ERRORS%"))
        .await
        .unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Errors_View", "web_errors"]);

    let one = client
        .catalog()
        .list_entities(&[], Some("a_dit"))
        .await
        .unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].name, "audit");
}

#[tokio::test]
async fn test_describe_columns_orders_and_numbers() {
    let (client, _mock) = catalog_client();

    let columns = client.catalog().describe_columns(None, None).await.unwrap();
    let flat: Vec<(&str, &str, u32)> = columns
        .iter()
        .map(|c| (c.table_name.as_str(), c.column_name.as_str(), c.ordinal))
        .collect();
    // uppercase byte order puts '_'-prefixed names after plain letters
    assert_eq!(
        flat,
        [
            ("audit", "actor", 1),
            ("Errors_View", "level", 2),
            ("Errors_View", "_msg", 1),
            ("web_errors", "app", 3),
            ("web_errors", "_msg", 2),
            ("web_errors", "_time", 1),
        ]
    );
    assert_eq!(columns[0].remarks.as_deref(), Some("12"));
}

#[tokio::test]
async fn test_describe_columns_pattern_renumbers_kept_columns() {
    let (client, _mock) = catalog_client();

    let columns = client
        .catalog()
        .describe_columns(Some("web%"), Some("a%"))
        .await
        .unwrap();
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].table_name, "web_errors");
    assert_eq!(columns[0].column_name, "app");
    // "app" is the only kept column, so it takes ordinal 1
    assert_eq!(columns[0].ordinal, 1);
}

#[tokio::test]
async fn test_describe_uses_view_statement_for_views() {
    let (client, mock) = catalog_client();

    client
        .catalog()
        .describe_columns(Some("errors_view"), None)
        .await
        .unwrap();
    let dispatched = mock.dispatched();
    assert!(dispatched.contains(&"DESCRIBE VIEW Errors_View".to_string()));
    assert!(!dispatched.iter().any(|q| q.starts_with("DESCRIBE TABLE")));
}

#[tokio::test]
async fn test_entity_cursor_shape() {
    let (client, _mock) = catalog_client();

    let mut cursor = client.catalog().entity_cursor(&[], None).await.unwrap();
    assert_eq!(cursor.columns(), ["table_name", "table_type", "remarks"]);
    assert_eq!(cursor.row_count(), 3);

    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_string("table_name").unwrap(), Some("audit".to_string()));
    assert_eq!(cursor.get_string("table_type").unwrap(), Some("TABLE".to_string()));
    assert_eq!(cursor.get_string("remarks").unwrap(), None);

    assert!(cursor.next().unwrap());
    assert_eq!(
        cursor.get_string("table_type").unwrap(),
        Some("VIEW".to_string())
    );
}

#[tokio::test]
async fn test_column_cursor_shape() {
    let (client, _mock) = catalog_client();

    let mut cursor = client
        .catalog()
        .column_cursor(Some("audit"), None)
        .await
        .unwrap();
    assert_eq!(
        cursor.columns(),
        ["table_name", "column_name", "ordinal", "remarks"]
    );
    assert!(cursor.next().unwrap());
    assert_eq!(cursor.get_string("column_name").unwrap(), Some("actor".to_string()));
    assert_eq!(cursor.get_i32("ordinal").unwrap(), Some(1));
}

#[tokio::test]
async fn test_rows_without_name_field_are_skipped() {
    let (client, _mock) = catalog_client();

    // the Errors_View describe payload has one row with no field_name
    let columns = client
        .catalog()
        .describe_columns(Some("errors_view"), None)
        .await
        .unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.column_name.as_str()).collect();
    assert_eq!(names, ["_msg", "level"]);
    assert_eq!(columns[1].ordinal, 2);
}

#[tokio::test]
async fn test_catalog_rows_materialize_as_text_cells() {
    let (client, _mock) = catalog_client();

    let cursor = client.catalog().entity_cursor(&[], None).await.unwrap();
    // synthesized metadata rows are plain text cells
    let types: Vec<String> = cursor.column_types().iter().map(|t| t.to_string()).collect();
    assert_eq!(types, ["VARCHAR", "VARCHAR", "VARCHAR"]);
    drop(cursor);

    let cursor = client.catalog().column_cursor(None, None).await.unwrap();
    assert_eq!(cursor.column_types()[2], logsql_client::ColumnType::Integer);
}
