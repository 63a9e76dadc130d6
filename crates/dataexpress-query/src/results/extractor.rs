//! Column value extraction
//!
//! Picks the cursor accessor for a column from its SQL type, after giving the
//! vendor adapter a chance to handle native types it knows about.

use std::collections::HashMap;
use std::sync::LazyLock;

use dataexpress_core::{ColumnInfo, Result, SqlType, Value, ValueSource, VendorAdapter};

type ExtractFn = fn(&mut dyn ValueSource, usize) -> Result<Value>;

static EXTRACTORS: LazyLock<HashMap<SqlType, ExtractFn>> = LazyLock::new(|| {
    let mut table: HashMap<SqlType, ExtractFn> = HashMap::new();
    table.insert(SqlType::Timestamp, timestamp);
    table.insert(SqlType::Date, timestamp);
    table.insert(SqlType::Time, time);
    table.insert(SqlType::Boolean, boolean);
    table.insert(SqlType::Bit, boolean);
    table.insert(SqlType::Blob, bytes);
    table.insert(SqlType::Clob, text);
    table.insert(SqlType::NClob, text);
    table
});

/// Native class names read through the timestamp accessor whatever their
/// reported SQL type
const TEMPORAL_CLASSES: &[&str] = &["java.sql.Timestamp", "java.sql.Date"];

fn timestamp(source: &mut dyn ValueSource, index: usize) -> Result<Value> {
    source.get_timestamp(index)
}

fn time(source: &mut dyn ValueSource, index: usize) -> Result<Value> {
    source.get_time(index)
}

fn boolean(source: &mut dyn ValueSource, index: usize) -> Result<Value> {
    source.get_bool(index)
}

fn bytes(source: &mut dyn ValueSource, index: usize) -> Result<Value> {
    source.get_bytes(index)
}

fn text(source: &mut dyn ValueSource, index: usize) -> Result<Value> {
    source.get_text(index)
}

/// Read the value at the 1-based `index` described by `column`.
pub fn extract_value(
    source: &mut dyn ValueSource,
    index: usize,
    column: &ColumnInfo,
    vendor: Option<&dyn VendorAdapter>,
) -> Result<Value> {
    if let Some(vendor) = vendor {
        if let Some(value) = vendor.extract_by_native_type(source, index, column)? {
            return Ok(value);
        }
    }

    let temporal_class = column
        .native_class
        .as_deref()
        .is_some_and(|class| TEMPORAL_CLASSES.contains(&class));
    if temporal_class {
        return source.get_timestamp(index);
    }

    match EXTRACTORS.get(&column.sql_type) {
        Some(extract) => extract(source, index),
        None => source.get_value(index),
    }
}
