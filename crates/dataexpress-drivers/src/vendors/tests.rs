//! Tests for the built-in vendor adapters

use super::*;
use dataexpress_core::{
    BindValue, BufferedCursor, ColumnInfo, Cursor, OutputFilter, Parameter, SqlType, Value,
    VendorAdapter,
};
use pretty_assertions::assert_eq;

fn window(limit: i64, offset: i64) -> Inputs {
    let mut inputs = Inputs::new();
    inputs.insert(inputs::RECORDS_LIMIT.into(), Value::Int64(limit));
    inputs.insert(inputs::RECORDS_OFFSET.into(), Value::Int64(offset));
    inputs
}

// ============ Order-by helpers ============

#[test]
fn test_order_by_prefers_input() {
    let mut inputs = Inputs::new();
    inputs.insert(inputs::ORDER_BY.into(), Value::from("ORDER BY created_at DESC"));
    assert_eq!(
        order_by_clause("SELECT id FROM posts ORDER BY id", &inputs).unwrap(),
        "created_at DESC"
    );
}

#[test]
fn test_order_by_from_statement() {
    let inputs = Inputs::new();
    assert_eq!(
        order_by_clause("SELECT id, title FROM posts ORDER BY title, id;", &inputs).unwrap(),
        "title, id"
    );
    assert_eq!(
        order_by_clause("SELECT id FROM posts order by id FOR UPDATE", &inputs).unwrap(),
        "id"
    );
}

#[test]
fn test_order_by_from_select_list() {
    let inputs = Inputs::new();
    assert_eq!(
        order_by_clause("SELECT DISTINCT id, title FROM posts", &inputs).unwrap(),
        "id, title"
    );
    assert_eq!(
        order_by_clause("SELECT TOP 5 id FROM posts", &inputs).unwrap(),
        "id"
    );

    let err = order_by_clause("SELECT * FROM posts", &inputs).unwrap_err();
    assert!(err.to_string().contains("Failed to obtain order-by clause"));
}

#[test]
fn test_remain_sql_drops_select_and_order_by() {
    assert_eq!(
        remain_sql("SELECT id, title FROM posts WHERE id > 3 ORDER BY id").unwrap(),
        "id, title FROM posts WHERE id > 3"
    );
    assert!(remain_sql("UPDATE posts SET id = 1").is_err());
}

// ============ Pagination ============

#[test]
fn test_limit_offset_vendors() {
    let adapters: Vec<Box<dyn VendorAdapter>> = vec![
        Box::new(MySqlAdapter),
        Box::new(PostgresAdapter),
        Box::new(H2Adapter),
        Box::new(GenericAdapter),
    ];
    for adapter in adapters {
        let mut inputs = window(20, 40);
        let mut filter = OutputFilter::new();
        let sql = adapter
            .build_paginated_sql("SELECT * FROM posts", &mut inputs, &mut filter)
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM posts LIMIT ?SCOOTER.RECORDS_LIMIT:INTEGER OFFSET ?SCOOTER.RECORDS_OFFSET:INTEGER",
            "{}",
            adapter.name()
        );
        assert!(filter.is_empty());
    }
}

#[test]
fn test_select_only_vendors_reject_updates() {
    let mut inputs = window(10, 0);
    let mut filter = OutputFilter::new();
    for adapter in [
        &PostgresAdapter as &dyn VendorAdapter,
        &H2Adapter,
        &HsqldbAdapter,
    ] {
        assert!(adapter
            .build_paginated_sql("DELETE FROM posts", &mut inputs, &mut filter)
            .is_err());
    }
}

#[test]
fn test_hsqldb_window_follows_select() {
    let mut inputs = window(-1, 0);
    let mut filter = OutputFilter::new();
    let sql = HsqldbAdapter
        .build_paginated_sql("SELECT id FROM posts", &mut inputs, &mut filter)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT LIMIT ?SCOOTER.RECORDS_OFFSET:INTEGER ?SCOOTER.RECORDS_LIMIT:INTEGER id FROM posts"
    );
    assert_eq!(inputs.get(inputs::RECORDS_LIMIT), Some(&Value::Int64(10)));
}

#[test]
fn test_oracle_rownum_wrappers() {
    let mut inputs = window(10, 0);
    let mut filter = OutputFilter::new();
    let sql = OracleAdapter
        .build_paginated_sql("SELECT id FROM posts", &mut inputs, &mut filter)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM ( SELECT id FROM posts ) WHERE rownum <= ?SCOOTER.MAX_ROW_INDEX:INTEGER"
    );
    assert_eq!(filter.except_columns(), &["RNUM".to_string()]);

    let mut inputs = window(10, 30);
    let sql = OracleAdapter
        .build_paginated_sql("SELECT id FROM posts", &mut inputs, &mut filter)
        .unwrap();
    assert!(sql.contains("FIRST_ROWS(10)"));
    assert!(sql.ends_with("WHERE rnum > ?SCOOTER.RECORDS_OFFSET:INTEGER"));
    assert_eq!(inputs.get(inputs::MAX_ROW_INDEX), Some(&Value::Int64(40)));
    assert_eq!(filter.except_columns().len(), 1);
}

#[test]
fn test_sqlserver_row_number_wrapper() {
    let mut inputs = window(5, 10);
    let mut filter = OutputFilter::new();
    let sql = SqlServerAdapter
        .build_paginated_sql("SELECT id, title FROM posts ORDER BY title", &mut inputs, &mut filter)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT TOP 5 * FROM (SELECT ROW_NUMBER() OVER (ORDER BY title) AS rownumber, id, title FROM posts) AS result WHERE rownumber > 10"
    );
    assert!(!filter.allows("ROWNUMBER"));
}

// ============ Binding and extraction ============

#[test]
fn test_mysql_zero_dates_bind_as_text() {
    let parameter = Parameter::new("created", 1).with_sql_type(SqlType::Timestamp);
    let bound = MySqlAdapter.try_bind_vendor_specific(&parameter, &Value::from("0000-00-00 00:00:00"));
    assert_eq!(
        bound,
        Some(BindValue::Typed {
            value: Value::from("0000-00-00 00:00:00"),
            sql_type: SqlType::Varchar
        })
    );

    assert!(MySqlAdapter
        .try_bind_vendor_specific(&parameter, &Value::from("2024-01-01"))
        .is_none());
    let text = Parameter::new("name", 2).with_sql_type(SqlType::Varchar);
    assert!(MySqlAdapter
        .try_bind_vendor_specific(&text, &Value::from("0000-00-00"))
        .is_none());
}

#[test]
fn test_oracle_lob_classes_extracted() {
    let blob = ColumnInfo::new("DATA", SqlType::Other).with_native_class("oracle.sql.BLOB");
    let clob = ColumnInfo::new("NOTE", SqlType::Other).with_native_class("oracle.sql.CLOB");
    let mut cursor = BufferedCursor::new(
        vec![blob.clone(), clob.clone()],
        vec![vec![Value::from("raw"), Value::Bytes(b"text".to_vec())]],
    );
    cursor.advance().unwrap();

    assert_eq!(
        OracleAdapter.extract_by_native_type(&mut cursor, 1, &blob).unwrap(),
        Some(Value::Bytes(b"raw".to_vec()))
    );
    assert_eq!(
        OracleAdapter.extract_by_native_type(&mut cursor, 2, &clob).unwrap(),
        Some(Value::from("text"))
    );
    let plain = ColumnInfo::new("ID", SqlType::Integer);
    assert_eq!(OracleAdapter.extract_by_native_type(&mut cursor, 1, &plain).unwrap(), None);
}

#[test]
fn test_mysql_unreadable_timestamp_is_null() {
    let column = ColumnInfo::new("CREATED", SqlType::Timestamp);
    let mut cursor = BufferedCursor::new(vec![column.clone()], vec![vec![Value::from("x")]]);
    // Not positioned on a row, so the read fails.
    assert_eq!(
        MySqlAdapter.extract_by_native_type(&mut cursor, 1, &column).unwrap(),
        Some(Value::Null)
    );
}
