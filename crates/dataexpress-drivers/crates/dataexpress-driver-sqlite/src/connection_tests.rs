//! Tests for the SQLite connection and adapter

use crate::connection::{bind_to_rusqlite, parse_timestamp};
use crate::{SqliteAdapter, SqliteConnection};
use chrono::NaiveDate;
use dataexpress_core::{
    BindValue, Connection, Cursor, Inputs, OutputFilter, SqlType, Value, ValueSource,
    VendorAdapter, inputs,
};
use pretty_assertions::assert_eq;

fn posts_db() -> SqliteConnection {
    let conn = SqliteConnection::open(":memory:").expect("Failed to open in-memory db");
    conn.execute_batch(
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, title VARCHAR(100) NOT NULL, score REAL, created_at TIMESTAMP);
         INSERT INTO posts (title, score, created_at) VALUES ('Hello', 1.5, '2024-03-15 10:30:00');
         INSERT INTO posts (title, score, created_at) VALUES ('World', 2.0, '2024-03-16');",
    )
    .expect("Failed to create posts");
    conn
}

#[test]
fn test_table_columns_map_declared_types() {
    let conn = posts_db();
    let columns = conn.table_columns("posts").unwrap();

    let summary: Vec<(String, SqlType)> = columns.iter().map(|c| (c.name.clone(), c.sql_type)).collect();
    assert_eq!(
        summary,
        vec![
            ("id".to_string(), SqlType::Integer),
            ("title".to_string(), SqlType::Varchar),
            ("score".to_string(), SqlType::Double),
            ("created_at".to_string(), SqlType::Timestamp),
        ]
    );
    assert_eq!(columns[1].type_name.as_deref(), Some("VARCHAR(100)"));
    assert!(conn.table_columns("missing").unwrap().is_empty());
}

#[test]
fn test_query_with_bound_parameter() {
    let conn = posts_db();
    let mut stmt = conn.prepare("SELECT id, title FROM posts WHERE id = ?", false).unwrap();
    stmt.bind(
        1,
        BindValue::Typed {
            value: Value::Int32(2),
            sql_type: SqlType::Integer,
        },
    )
    .unwrap();

    let mut cursor = stmt.execute_query().unwrap();
    assert_eq!(cursor.columns()[1].sql_type, SqlType::Varchar);
    assert!(cursor.advance().unwrap());
    assert_eq!(cursor.get_value(2).unwrap(), Value::from("World"));
    assert!(!cursor.advance().unwrap());
}

#[test]
fn test_repeated_statement_rebinds_cleanly() {
    let conn = posts_db();
    for (id, title) in [(1, "Hello"), (2, "World"), (3, "")] {
        let mut stmt = conn.prepare("SELECT title FROM posts WHERE id = ?", false).unwrap();
        stmt.bind(1, BindValue::Untyped(Value::Int32(id))).unwrap();
        let mut cursor = stmt.execute_query().unwrap();
        let found = if cursor.advance().unwrap() { cursor.get_value(1).unwrap() } else { Value::from("") };
        assert_eq!(found, Value::from(title));
    }
}

#[test]
fn test_insert_reports_generated_key() {
    let conn = posts_db();
    let mut stmt = conn
        .prepare("INSERT INTO posts (title) VALUES (?)", true)
        .unwrap();
    stmt.bind(1, BindValue::Untyped(Value::from("Third"))).unwrap();

    assert_eq!(stmt.execute_update().unwrap(), 1);
    assert_eq!(stmt.generated_key().unwrap(), Some(3));
}

#[test]
fn test_update_does_not_report_generated_key() {
    let conn = posts_db();
    let mut stmt = conn
        .prepare("UPDATE posts SET title = 'x' WHERE id > ?", true)
        .unwrap();
    stmt.bind(1, BindValue::Untyped(Value::Int64(0))).unwrap();

    assert_eq!(stmt.execute_update().unwrap(), 2);
    assert_eq!(stmt.generated_key().unwrap(), None);
}

#[test]
fn test_prepare_rejects_invalid_sql() {
    let conn = posts_db();
    assert!(conn.prepare("SELEC nothing", false).is_err());
}

#[test]
fn test_timestamp_reads_parse_text() {
    let conn = posts_db();
    let mut stmt = conn
        .prepare("SELECT created_at FROM posts ORDER BY id", false)
        .unwrap();
    let mut cursor = stmt.execute_query().unwrap();

    cursor.advance().unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();
    assert_eq!(cursor.get_timestamp(1).unwrap(), Value::DateTime(expected));

    cursor.advance().unwrap();
    assert_eq!(
        cursor.get_timestamp(1).unwrap(),
        Value::Date(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap())
    );
}

#[test]
fn test_parse_timestamp_leaves_other_text() {
    assert_eq!(parse_timestamp("not a date"), None);
}

#[test]
fn test_null_binding_ignores_declared_type() {
    assert_eq!(
        bind_to_rusqlite(BindValue::Null(SqlType::Integer)).unwrap(),
        rusqlite::types::Value::Null
    );
    assert!(bind_to_rusqlite(BindValue::Untyped(Value::Array(vec![]))).is_err());
}

#[test]
fn test_file_database_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{}.db", uuid::Uuid::new_v4()));
    let path = path.to_string_lossy().to_string();

    {
        let conn = SqliteConnection::open_named("blog", &path).unwrap();
        assert_eq!(conn.identity(), "sqlite:blog");
        conn.execute_batch("CREATE TABLE t (v TEXT); INSERT INTO t VALUES ('kept');")
            .unwrap();
    }

    let conn = SqliteConnection::open(&path).unwrap();
    let mut stmt = conn.prepare("SELECT v FROM t", false).unwrap();
    let mut cursor = stmt.execute_query().unwrap();
    assert!(cursor.advance().unwrap());
    assert_eq!(cursor.get_value(1).unwrap(), Value::from("kept"));
}

#[test]
fn test_adapter_appends_limit_and_offset() {
    let adapter = SqliteAdapter::new();
    let mut inputs = Inputs::new();
    inputs.insert(inputs::RECORDS_OFFSET.into(), Value::Int32(10));
    let mut filter = OutputFilter::new();

    let sql = adapter
        .build_paginated_sql("SELECT * FROM posts", &mut inputs, &mut filter)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM posts LIMIT ?SCOOTER.RECORDS_LIMIT:INTEGER OFFSET ?SCOOTER.RECORDS_OFFSET:INTEGER"
    );
    assert_eq!(inputs.get(inputs::RECORDS_LIMIT), Some(&Value::Int64(10)));

    assert!(adapter
        .build_paginated_sql("DELETE FROM posts", &mut inputs, &mut filter)
        .is_err());
}
