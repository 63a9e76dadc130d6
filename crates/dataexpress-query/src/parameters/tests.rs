//! Tests for placeholder handling, parameter inference and type binding

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use dataexpress_core::{
    BindValue, ColumnInfo, DataExpressError, Inputs, OutputFilter, Parameter, Result, SqlType,
    Value, VendorAdapter,
};
use pretty_assertions::assert_eq;

use super::{StatementParser, TableCatalog, bind_value, parse_date_time, to_executable};

struct MapCatalog {
    tables: HashMap<String, Vec<ColumnInfo>>,
}

impl MapCatalog {
    fn blog() -> Self {
        let mut tables = HashMap::new();
        tables.insert(
            "POSTS".to_string(),
            vec![
                ColumnInfo::new("ID", SqlType::Integer),
                ColumnInfo::new("TITLE", SqlType::Varchar),
                ColumnInfo::new("AUTHOR", SqlType::Varchar),
                ColumnInfo::new("CREATED_AT", SqlType::Timestamp),
            ],
        );
        tables.insert(
            "COMMENTS".to_string(),
            vec![
                ColumnInfo::new("ID", SqlType::Integer),
                ColumnInfo::new("POST_ID", SqlType::BigInt),
                ColumnInfo::new("BODY", SqlType::Clob),
            ],
        );
        Self { tables }
    }
}

impl TableCatalog for MapCatalog {
    fn columns_of(&self, table: &str) -> Result<Arc<[ColumnInfo]>> {
        Ok(self
            .tables
            .get(&table.to_ascii_uppercase())
            .cloned()
            .unwrap_or_default()
            .into())
    }
}

struct BrokenCatalog;

impl TableCatalog for BrokenCatalog {
    fn columns_of(&self, table: &str) -> Result<Arc<[ColumnInfo]>> {
        Err(DataExpressError::Driver(format!("no metadata for {}", table)))
    }
}

fn parse(sql: &str) -> Vec<Parameter> {
    let catalog = MapCatalog::blog();
    StatementParser::new(&catalog).parse(sql).unwrap()
}

fn names_and_types(parameters: &[Parameter]) -> Vec<(String, SqlType)> {
    parameters
        .iter()
        .map(|p| (p.name.clone(), p.sql_type))
        .collect()
}

// ============ Placeholders ============

#[test]
fn test_executable_text_strips_names_and_types() {
    assert_eq!(
        to_executable("UPDATE posts SET title=?title:VARCHAR WHERE id=?posts.id"),
        "UPDATE posts SET title=? WHERE id=?"
    );
    assert_eq!(to_executable("SELECT 1"), "SELECT 1");
}

#[test]
fn test_executable_text_leaves_literals_alone() {
    let sql = "SELECT * FROM posts WHERE title = 'who?what' AND id = ?id";
    assert_eq!(
        to_executable(sql),
        "SELECT * FROM posts WHERE title = 'who?what' AND id = ?"
    );
}

// ============ Parser ============

#[test]
fn test_select_parameters_typed_from_catalog() {
    let params = parse("SELECT * FROM posts WHERE id = ?id AND title = ?title");

    assert_eq!(
        names_and_types(&params),
        vec![
            ("id".to_string(), SqlType::Integer),
            ("title".to_string(), SqlType::Varchar),
        ]
    );
    assert_eq!(params[0].index, 1);
    assert_eq!(params[1].index, 2);
    assert_eq!(params[0].table.as_deref(), Some("posts"));
}

#[test]
fn test_positional_placeholders_named_by_index() {
    let params = parse("SELECT * FROM posts WHERE id = ? AND title = ?");
    let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["1", "2"]);
    assert_eq!(params[0].sql_type, SqlType::Integer);
}

#[test]
fn test_no_placeholders_yields_no_parameters() {
    assert!(parse("SELECT * FROM posts").is_empty());
    assert!(parse("SELECT * FROM posts WHERE title = 'why?'").is_empty());
}

#[test]
fn test_update_and_delete_resolve_their_table() {
    let params = parse("UPDATE posts SET title = ?title WHERE id = ?id");
    assert_eq!(
        names_and_types(&params),
        vec![
            ("title".to_string(), SqlType::Varchar),
            ("id".to_string(), SqlType::Integer),
        ]
    );

    let params = parse("DELETE FROM comments WHERE post_id = ?post_id");
    assert_eq!(params[0].sql_type, SqlType::BigInt);
}

#[test]
fn test_insert_pairs_columns_with_values() {
    let params = parse("INSERT INTO posts (id, title, author) VALUES (?id, 'fixed', ?author)");

    assert_eq!(
        names_and_types(&params),
        vec![
            ("id".to_string(), SqlType::Integer),
            ("author".to_string(), SqlType::Varchar),
        ]
    );
    assert_eq!(params[1].index, 2);
    assert_eq!(params[1].column.as_deref(), Some("author"));
}

#[test]
fn test_insert_column_value_mismatch_is_error() {
    let catalog = MapCatalog::blog();
    let err = StatementParser::new(&catalog)
        .parse("INSERT INTO posts (id, title) VALUES (?id)")
        .unwrap_err();
    assert!(matches!(err, DataExpressError::Parse(ref m) if m.contains("does not match")));
}

#[test]
fn test_insert_too_short_is_error() {
    let catalog = MapCatalog::blog();
    let err = StatementParser::new(&catalog)
        .parse("INSERT INTO ?x")
        .unwrap_err();
    assert!(matches!(err, DataExpressError::Parse(ref m) if m.starts_with("Cannot parse sql statement")));
}

#[test]
fn test_insert_without_column_list_binds_positionally() {
    let params = parse("INSERT INTO posts VALUES (?, ?title:VARCHAR)");
    assert_eq!(
        names_and_types(&params),
        vec![
            ("1".to_string(), SqlType::Unknown),
            ("title".to_string(), SqlType::Varchar),
        ]
    );
}

#[test]
fn test_inline_type_wins_over_catalog() {
    let params = parse("SELECT * FROM posts WHERE id = ?id:VARCHAR");
    assert_eq!(params[0].sql_type, SqlType::Varchar);
    assert_eq!(params[0].name, "id");
}

#[test]
fn test_between_uses_column_for_both_bounds() {
    let params = parse("SELECT * FROM posts WHERE created_at BETWEEN ?from AND ?to");
    assert_eq!(
        names_and_types(&params),
        vec![
            ("from".to_string(), SqlType::Timestamp),
            ("to".to_string(), SqlType::Timestamp),
        ]
    );
}

#[test]
fn test_in_and_like_look_past_keyword() {
    let params = parse("SELECT * FROM posts WHERE author LIKE ?pattern");
    assert_eq!(params[0].sql_type, SqlType::Varchar);

    let params = parse("SELECT * FROM posts WHERE id NOT IN (?excluded)");
    assert_eq!(params[0].column.as_deref(), Some("id"));
    assert_eq!(params[0].sql_type, SqlType::Integer);
}

#[test]
fn test_count_comparison_is_not_typed() {
    let params = parse("SELECT author FROM posts GROUP BY author HAVING COUNT(*) > ?");
    assert_eq!(params.len(), 1);
    assert!(params[0].used_by_count);
    assert_eq!(params[0].sql_type, SqlType::Unknown);
}

#[test]
fn test_table_alias_is_resolved() {
    let params = parse("SELECT p.title FROM posts p WHERE p.id = ?id");
    assert_eq!(params[0].table.as_deref(), Some("posts"));
    assert_eq!(params[0].sql_type, SqlType::Integer);

    let params = parse("SELECT c.body FROM comments AS c WHERE c.post_id = ?post_id");
    assert_eq!(params[0].table.as_deref(), Some("comments"));
    assert_eq!(params[0].sql_type, SqlType::BigInt);
}

#[test]
fn test_dotted_placeholder_names_its_column() {
    let params = parse("DELETE FROM comments WHERE id = ?posts.id");
    assert_eq!(params[0].name, "posts.id");
    assert_eq!(params[0].table.as_deref(), Some("posts"));
    assert_eq!(params[0].sql_type, SqlType::Integer);
}

#[test]
fn test_unknown_table_leaves_type_unresolved() {
    let params = parse("SELECT * FROM drafts WHERE slug = ?slug");
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].sql_type, SqlType::Unknown);
}

#[test]
fn test_catalog_failures_are_not_fatal() {
    let params = StatementParser::new(&BrokenCatalog)
        .parse("SELECT * FROM posts WHERE id = ?id")
        .unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].sql_type, SqlType::Unknown);
}

// ============ Binder ============

fn param(sql_type: SqlType) -> Parameter {
    Parameter::new("p", 1).with_sql_type(sql_type)
}

#[test]
fn test_null_and_blank_bind_as_typed_null() {
    assert_eq!(
        bind_value(&param(SqlType::Integer), &Value::Null, None).unwrap(),
        BindValue::Null(SqlType::Integer)
    );
    assert_eq!(
        bind_value(&param(SqlType::Integer), &Value::from("  "), None).unwrap(),
        BindValue::Null(SqlType::Integer)
    );
    assert_eq!(
        bind_value(&param(SqlType::Unknown), &Value::Null, None).unwrap(),
        BindValue::Null(SqlType::Other)
    );
}

#[test]
fn test_blank_kept_for_character_types() {
    let bound = bind_value(&param(SqlType::Varchar), &Value::from(" "), None).unwrap();
    assert_eq!(
        bound,
        BindValue::Typed {
            value: Value::from(" "),
            sql_type: SqlType::Varchar
        }
    );
}

#[test]
fn test_unknown_type_binds_untyped() {
    let bound = bind_value(&param(SqlType::Unknown), &Value::from("abc"), None).unwrap();
    assert_eq!(bound, BindValue::Untyped(Value::from("abc")));
}

#[test]
fn test_numeric_strings_are_coerced() {
    let bound = bind_value(&param(SqlType::Integer), &Value::from("42"), None).unwrap();
    assert_eq!(bound.value(), &Value::Int32(42));

    let bound = bind_value(&param(SqlType::BigInt), &Value::from("9000000000"), None).unwrap();
    assert_eq!(bound.value(), &Value::Int64(9_000_000_000));

    let bound = bind_value(&param(SqlType::Double), &Value::from("2.5"), None).unwrap();
    assert_eq!(bound.value(), &Value::Float64(2.5));

    let bound = bind_value(&param(SqlType::Decimal), &Value::from("12.50"), None).unwrap();
    assert_eq!(bound.value(), &Value::Decimal("12.50".to_string()));

    let bound = bind_value(&param(SqlType::Bit), &Value::from(" 1 "), None).unwrap();
    assert_eq!(bound.value(), &Value::Int32(1));
    assert!(matches!(
        bind_value(&param(SqlType::Bit), &Value::from("abc"), None),
        Err(DataExpressError::Conversion { target: "Integer", .. })
    ));
}

#[test]
fn test_numeric_conversion_failure_names_target_and_parameter() {
    let err = bind_value(&param(SqlType::Integer), &Value::from("abc"), None).unwrap_err();
    match err {
        DataExpressError::Conversion {
            value,
            target,
            parameter,
        } => {
            assert_eq!(value, "abc");
            assert_eq!(target, "Integer");
            assert_eq!(parameter, "p");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = bind_value(&param(SqlType::Decimal), &Value::from("1,2"), None).unwrap_err();
    assert!(matches!(err, DataExpressError::Conversion { target: "BigDecimal", .. }));
}

#[test]
fn test_boolean_rules() {
    let flag = |v: Value| {
        bind_value(&param(SqlType::Boolean), &v, None)
            .unwrap()
            .value()
            .clone()
    };
    assert_eq!(flag(Value::from("0")), Value::Bool(false));
    assert_eq!(flag(Value::from("no")), Value::Bool(true));
    assert_eq!(flag(Value::Int32(0)), Value::Bool(false));
    assert_eq!(flag(Value::Int64(3)), Value::Bool(true));

    let err = bind_value(&param(SqlType::Boolean), &Value::Bytes(vec![1]), None).unwrap_err();
    assert!(matches!(err, DataExpressError::Binding { index: 1, .. }));
}

#[test]
fn test_temporal_strings_are_parsed() {
    let bound = bind_value(&param(SqlType::Date), &Value::from("2024-03-15"), None).unwrap();
    assert_eq!(
        bound.value(),
        &Value::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    );

    let bound = bind_value(&param(SqlType::Timestamp), &Value::from("03/15/2024 10:30"), None)
        .unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();
    assert_eq!(bound.value(), &Value::DateTime(expected));

    let bound = bind_value(&param(SqlType::Time), &Value::from("10:30:15"), None).unwrap();
    assert_eq!(
        bound.value(),
        &Value::Time(NaiveTime::from_hms_opt(10, 30, 15).unwrap())
    );

    let err = bind_value(&param(SqlType::Date), &Value::from("someday"), None).unwrap_err();
    assert!(matches!(err, DataExpressError::Binding { .. }));
}

#[test]
fn test_parse_date_time_formats() {
    let dt = parse_date_time("2024-03-15 10:30:15.250").unwrap();
    assert_eq!(dt.to_string(), "2024-03-15 10:30:15.250");

    let dt = parse_date_time("12/31/2023").unwrap();
    assert_eq!(dt.to_string(), "2023-12-31 00:00:00");

    let dt = parse_date_time("08:15").unwrap();
    assert_eq!(dt.to_string(), "1970-01-01 08:15:00");

    assert!(parse_date_time("").is_none());
    assert!(parse_date_time("tomorrow").is_none());
}

#[test]
fn test_binary_and_clob_coercion() {
    let bound = bind_value(&param(SqlType::Blob), &Value::from("raw"), None).unwrap();
    assert_eq!(bound.value(), &Value::Bytes(b"raw".to_vec()));

    let bound = bind_value(&param(SqlType::Clob), &Value::Bytes(b"text".to_vec()), None).unwrap();
    assert_eq!(bound.value(), &Value::from("text"));
}

#[test]
fn test_binary_from_file_reads_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("payload.bin");
    std::fs::write(&path, [0u8, 1, 2]).unwrap();

    let bound = bind_value(&param(SqlType::Varbinary), &Value::File(path), None).unwrap();
    assert_eq!(bound.value(), &Value::Bytes(vec![0, 1, 2]));
}

struct ZeroDateVendor;

impl VendorAdapter for ZeroDateVendor {
    fn name(&self) -> &str {
        "zero-date"
    }

    fn try_bind_vendor_specific(&self, parameter: &Parameter, value: &Value) -> Option<BindValue> {
        (parameter.sql_type.is_temporal() && value.as_str() == Some("0000-00-00"))
            .then(|| BindValue::Untyped(value.clone()))
    }

    fn build_paginated_sql(
        &self,
        sql: &str,
        _inputs: &mut Inputs,
        _filter: &mut OutputFilter,
    ) -> Result<String> {
        Ok(sql.to_string())
    }
}

#[test]
fn test_vendor_gets_first_refusal() {
    let vendor: &dyn VendorAdapter = &ZeroDateVendor;
    let bound = bind_value(&param(SqlType::Date), &Value::from("0000-00-00"), Some(vendor)).unwrap();
    assert_eq!(bound, BindValue::Untyped(Value::from("0000-00-00")));

    let bound = bind_value(&param(SqlType::Date), &Value::from("2024-01-02"), Some(vendor)).unwrap();
    assert!(matches!(bound, BindValue::Typed { sql_type: SqlType::Date, .. }));
}
