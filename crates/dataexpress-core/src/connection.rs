//! Connection, statement and cursor traits
//!
//! The engine is synchronous: each call blocks its thread through binding,
//! the database round trip and materialization. Drivers release statement and
//! cursor handles when the boxed trait objects are dropped, so every exit path
//! frees them.

use crate::{ColumnInfo, DataExpressError, Result, SqlType, Value};
use chrono::{NaiveDateTime, NaiveTime};
use std::collections::VecDeque;

/// A value ready to be bound to one placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    /// SQL NULL with the slot's declared type (`Other` when unknown)
    Null(SqlType),
    /// A value already coerced for the given target type
    Typed { value: Value, sql_type: SqlType },
    /// A value passed to the driver's generic binder
    Untyped(Value),
}

static NULL: Value = Value::Null;

impl BindValue {
    pub fn value(&self) -> &Value {
        match self {
            BindValue::Null(_) => &NULL,
            BindValue::Typed { value, .. } | BindValue::Untyped(value) => value,
        }
    }
}

/// Positional value access, 1-based like driver column indexes
pub trait ValueSource {
    /// Read a value with the driver's default mapping
    fn get_value(&mut self, index: usize) -> Result<Value>;

    /// Read a date/time value
    fn get_timestamp(&mut self, index: usize) -> Result<Value> {
        self.get_value(index)
    }

    /// Read a binary large object fully into memory
    fn get_bytes(&mut self, index: usize) -> Result<Value> {
        match self.get_value(index)? {
            Value::String(s) => Ok(Value::Bytes(s.into_bytes())),
            other => Ok(other),
        }
    }

    /// Read a character large object fully into memory
    fn get_text(&mut self, index: usize) -> Result<Value> {
        match self.get_value(index)? {
            Value::Bytes(b) => Ok(Value::String(String::from_utf8_lossy(&b).into_owned())),
            other => Ok(other),
        }
    }

    /// Read a flag stored as a native boolean, a number or text
    fn get_bool(&mut self, index: usize) -> Result<Value> {
        Ok(match self.get_value(index)? {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "t" | "y" | "yes" => Value::Bool(true),
                "0" | "false" | "f" | "n" | "no" => Value::Bool(false),
                _ => Value::String(s),
            },
            v if v.is_numeric() => Value::Bool(v.as_f64().is_some_and(|n| n != 0.0)),
            other => other,
        })
    }

    /// Read a time of day. Text in `HH:mm[:ss[.SSS]]` or a full date-time
    /// layout is parsed; unparseable text comes back unchanged.
    fn get_time(&mut self, index: usize) -> Result<Value> {
        Ok(match self.get_value(index)? {
            Value::DateTime(dt) => Value::Time(dt.time()),
            Value::DateTimeUtc(dt) => Value::Time(dt.naive_utc().time()),
            Value::String(s) => parse_time(&s).map(Value::Time).unwrap_or(Value::String(s)),
            other => other,
        })
    }
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];
    const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    let text = text.trim();
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(text, f).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
                .map(|dt| dt.time())
        })
}

/// A forward-only result set
pub trait Cursor: ValueSource + Send {
    /// Full column metadata of the result set
    fn columns(&self) -> &[ColumnInfo];

    /// Move to the next row. Returns false once the rows are exhausted.
    fn advance(&mut self) -> Result<bool>;
}

/// A statement prepared from executable text
pub trait PreparedStatement: Send {
    fn bind(&mut self, index: usize, value: BindValue) -> Result<()>;

    fn execute_query(&mut self) -> Result<Box<dyn Cursor + '_>>;

    /// Execute a non-query statement, returning the affected row count
    fn execute_update(&mut self) -> Result<u64>;

    /// First key generated by the last `execute_update`, if any
    fn generated_key(&mut self) -> Result<Option<i64>> {
        Ok(None)
    }
}

/// A prepared procedure or function call
pub trait CallableStatement: ValueSource + Send {
    /// Declare an output slot before execution
    fn register_out(&mut self, index: usize, sql_type: SqlType) -> Result<()>;

    fn bind(&mut self, index: usize, value: BindValue) -> Result<()>;

    fn execute(&mut self) -> Result<()>;

    /// Take the cursor returned in an output slot
    fn take_cursor(&mut self, index: usize) -> Result<Box<dyn Cursor + '_>>;
}

/// One row of procedure column metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureColumn {
    /// Position in the catalog listing; 0 is a function's return value
    pub sequence: i32,
    pub name: String,
    /// Mode code: 1 IN, 2 INOUT, 4 OUT, 5 RETURN
    pub mode: i32,
    pub data_type: i32,
    pub type_name: String,
}

/// An open database connection
pub trait Connection: Send + Sync {
    /// Vendor name (e.g., "sqlite", "mysql", "oracle")
    fn vendor(&self) -> &str;

    /// Name the connection was opened under
    fn connection_name(&self) -> &str;

    /// Identity used to key per-connection caches
    fn identity(&self) -> String {
        format!("{}:{}", self.vendor(), self.connection_name())
    }

    fn prepare(&self, sql: &str, want_generated_keys: bool) -> Result<Box<dyn PreparedStatement + '_>>;

    fn prepare_call(&self, call_text: &str) -> Result<Box<dyn CallableStatement + '_>> {
        Err(DataExpressError::NotSupported(format!(
            "{} does not support callable statements: {}",
            self.vendor(),
            call_text
        )))
    }

    /// Whether the driver can report generated keys
    fn supports_generated_keys(&self) -> Result<bool> {
        Ok(false)
    }

    /// Column metadata of a table, empty when the table is unknown
    fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Parameter metadata of a procedure or function, in catalog order
    fn procedure_columns(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        api: &str,
    ) -> Result<Vec<ProcedureColumn>> {
        let _ = (catalog, schema);
        Err(DataExpressError::NotSupported(format!(
            "{} does not expose procedure metadata for {}",
            self.vendor(),
            api
        )))
    }
}

/// A cursor over rows already fetched into memory
#[derive(Debug, Clone, Default)]
pub struct BufferedCursor {
    columns: Vec<ColumnInfo>,
    rows: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
}

impl BufferedCursor {
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
            current: None,
        }
    }

    /// Rows not yet reached
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl ValueSource for BufferedCursor {
    fn get_value(&mut self, index: usize) -> Result<Value> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| DataExpressError::Driver("cursor is not positioned on a row".into()))?;
        index
            .checked_sub(1)
            .and_then(|i| row.get(i))
            .cloned()
            .ok_or_else(|| DataExpressError::Driver(format!("column index {} out of range", index)))
    }
}

impl Cursor for BufferedCursor {
    fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    fn advance(&mut self) -> Result<bool> {
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }
}
