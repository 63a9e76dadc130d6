//! SQLite connection implementation

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use dataexpress_core::{
    BindValue, BufferedCursor, ColumnInfo, Connection, Cursor, DataExpressError,
    PreparedStatement, Result, SqlType, StatementKind, Value, ValueSource,
};
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags, params_from_iter};
use std::sync::Arc;

/// SQLite connection wrapper
pub struct SqliteConnection {
    conn: Arc<Mutex<RusqliteConnection>>,
    name: String,
}

impl SqliteConnection {
    /// Open a SQLite database, named after its path
    pub fn open(path: &str) -> Result<Self> {
        Self::open_named(path, path)
    }

    /// Open a SQLite database under an explicit connection name
    pub fn open_named(name: &str, path: &str) -> Result<Self> {
        tracing::info!(name = %name, path = %path, "opening SQLite database");
        let expanded_path = Self::expand_path(path)?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                DataExpressError::Driver(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            if !expanded_path.starts_with("file:") {
                let file_path = std::path::Path::new(&expanded_path);
                if let Some(parent) = file_path.parent()
                    && !parent.as_os_str().is_empty()
                    && !parent.exists()
                {
                    return Err(DataExpressError::Configuration(format!(
                        "Parent directory does not exist: {}",
                        parent.display()
                    )));
                }
            }

            RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                DataExpressError::Driver(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?
        };

        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| DataExpressError::Driver(format!("Failed to enable foreign keys: {}", e)))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| DataExpressError::Driver(format!("Failed to set journal mode: {}", e)))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| DataExpressError::Driver(format!("Failed to set synchronous mode: {}", e)))?;

        tracing::info!(path = %expanded_path, "SQLite database connection established");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            name: name.to_string(),
        })
    }

    /// Expand a leading `~/` to the home directory
    fn expand_path(path: &str) -> Result<String> {
        if path == ":memory:" || path.starts_with("file:") {
            return Ok(path.to_string());
        }

        match path.strip_prefix("~/") {
            Some(rest) => {
                let home = std::env::var_os("HOME").ok_or_else(|| {
                    DataExpressError::Configuration("Unable to determine HOME directory".into())
                })?;
                Ok(std::path::PathBuf::from(home)
                    .join(rest)
                    .to_string_lossy()
                    .to_string())
            }
            None => Ok(path.to_string()),
        }
    }

    /// Run a script of one or more statements without parameters
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!("executing SQL batch");
        self.conn
            .lock()
            .execute_batch(sql)
            .map_err(|e| DataExpressError::Driver(format!("Failed to execute batch: {}", e)))
    }
}

impl Connection for SqliteConnection {
    fn vendor(&self) -> &str {
        "sqlite"
    }

    fn connection_name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    fn prepare(&self, sql: &str, want_generated_keys: bool) -> Result<Box<dyn PreparedStatement + '_>> {
        // Compile up front so syntax errors surface at prepare time. The
        // compiled statement goes back to the connection's cache for the
        // execute call.
        {
            let conn = self.conn.lock();
            conn.prepare_cached(sql).map(drop).map_err(|e| {
                DataExpressError::Driver(format!("Failed to prepare statement: {}", e))
            })?;
        }

        Ok(Box::new(SqliteStatement {
            conn: &self.conn,
            sql: sql.to_string(),
            binds: Vec::new(),
            want_generated_keys,
            generated_key: None,
        }))
    }

    fn supports_generated_keys(&self) -> Result<bool> {
        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        tracing::trace!(table = %table, "fetching column information");
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT cid, name, type FROM pragma_table_info(?1)")
            .map_err(|e| DataExpressError::Driver(format!("Failed to prepare table info: {}", e)))?;

        let rows = stmt
            .query_map([table], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                ))
            })
            .map_err(|e| DataExpressError::Driver(format!("Failed to read table info: {}", e)))?;

        let mut columns = Vec::new();
        for row in rows {
            let (cid, name, declared) =
                row.map_err(|e| DataExpressError::Driver(format!("Failed to read table info: {}", e)))?;
            let mut column = ColumnInfo::new(name, sqlite_type(&declared)).with_type_name(declared);
            column.ordinal = cid as usize;
            columns.push(column);
        }
        Ok(columns)
    }
}

/// SQL type for a declared SQLite column type
fn sqlite_type(declared: &str) -> SqlType {
    let first = declared.split_whitespace().next().unwrap_or("");
    if first.eq_ignore_ascii_case("REAL") {
        return SqlType::Double;
    }
    SqlType::from_type_name(declared)
}

struct SqliteStatement<'a> {
    conn: &'a Mutex<RusqliteConnection>,
    sql: String,
    binds: Vec<rusqlite::types::Value>,
    want_generated_keys: bool,
    generated_key: Option<i64>,
}

impl PreparedStatement for SqliteStatement<'_> {
    fn bind(&mut self, index: usize, value: BindValue) -> Result<()> {
        if index == 0 {
            return Err(DataExpressError::Driver("parameter indexes start at 1".into()));
        }
        if self.binds.len() < index {
            self.binds.resize(index, rusqlite::types::Value::Null);
        }
        self.binds[index - 1] = bind_to_rusqlite(value)?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(sql_preview = %self.sql.chars().take(100).collect::<String>()))]
    fn execute_query(&mut self) -> Result<Box<dyn Cursor + '_>> {
        let start_time = std::time::Instant::now();
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(&self.sql)
            .map_err(|e| DataExpressError::Driver(format!("Failed to prepare query: {}", e)))?;

        let columns: Vec<ColumnInfo> = stmt
            .columns()
            .iter()
            .map(|col| match col.decl_type() {
                Some(declared) => {
                    ColumnInfo::new(col.name(), sqlite_type(declared)).with_type_name(declared)
                }
                None => ColumnInfo::new(col.name(), SqlType::Unknown),
            })
            .collect();

        let mut rows = Vec::new();
        let mut query_rows = stmt
            .query(params_from_iter(self.binds.iter()))
            .map_err(|e| DataExpressError::Driver(format!("Failed to execute query: {}", e)))?;

        while let Some(row) = query_rows
            .next()
            .map_err(|e| DataExpressError::Driver(format!("Failed to fetch row: {}", e)))?
        {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(rusqlite_to_value(row, i)?);
            }
            rows.push(values);
        }

        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = start_time.elapsed().as_millis() as u64,
            "query executed"
        );
        Ok(Box::new(SqliteCursor {
            inner: BufferedCursor::new(columns, rows),
        }))
    }

    #[tracing::instrument(skip(self), fields(sql_preview = %self.sql.chars().take(100).collect::<String>()))]
    fn execute_update(&mut self) -> Result<u64> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(&self.sql)
            .map_err(|e| DataExpressError::Driver(format!("Failed to prepare statement: {}", e)))?;

        let rows_affected = stmt
            .execute(params_from_iter(self.binds.iter()))
            .map_err(|e| DataExpressError::Driver(format!("Failed to execute statement: {}", e)))?;

        // last_insert_rowid is connection-wide, so only an INSERT may report it.
        self.generated_key = (self.want_generated_keys
            && rows_affected > 0
            && StatementKind::of(&self.sql) == StatementKind::Insert)
            .then(|| conn.last_insert_rowid());

        tracing::debug!(affected_rows = rows_affected, generated_key = ?self.generated_key, "statement executed");
        Ok(rows_affected as u64)
    }

    fn generated_key(&mut self) -> Result<Option<i64>> {
        Ok(self.generated_key)
    }
}

/// Rows fetched from SQLite. Date/time text is parsed on timestamp reads
/// since SQLite stores it as TEXT or as unix seconds.
struct SqliteCursor {
    inner: BufferedCursor,
}

impl ValueSource for SqliteCursor {
    fn get_value(&mut self, index: usize) -> Result<Value> {
        self.inner.get_value(index)
    }

    fn get_timestamp(&mut self, index: usize) -> Result<Value> {
        Ok(match self.inner.get_value(index)? {
            Value::String(text) => parse_timestamp(&text).unwrap_or(Value::String(text)),
            Value::Int64(secs) => DateTime::from_timestamp(secs, 0)
                .map(Value::DateTimeUtc)
                .unwrap_or(Value::Int64(secs)),
            other => other,
        })
    }
}

impl Cursor for SqliteCursor {
    fn columns(&self) -> &[ColumnInfo] {
        self.inner.columns()
    }

    fn advance(&mut self) -> Result<bool> {
        self.inner.advance()
    }
}

pub(crate) fn parse_timestamp(text: &str) -> Option<Value> {
    const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

    let text = text.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .map(Value::DateTime)
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(Value::Date)
        })
}

pub(crate) fn bind_to_rusqlite(value: BindValue) -> Result<rusqlite::types::Value> {
    match value {
        BindValue::Null(_) => Ok(rusqlite::types::Value::Null),
        BindValue::Typed { value, .. } | BindValue::Untyped(value) => value_to_rusqlite(value),
    }
}

fn value_to_rusqlite(value: Value) -> Result<rusqlite::types::Value> {
    use rusqlite::types::Value as Sql;

    Ok(match value {
        Value::Null => Sql::Null,
        Value::Bool(b) => Sql::Integer(i64::from(b)),
        Value::Int8(i) => Sql::Integer(i64::from(i)),
        Value::Int16(i) => Sql::Integer(i64::from(i)),
        Value::Int32(i) => Sql::Integer(i64::from(i)),
        Value::Int64(i) => Sql::Integer(i),
        Value::Float32(f) => Sql::Real(f64::from(f)),
        Value::Float64(f) => Sql::Real(f),
        Value::Decimal(d) => Sql::Text(d),
        Value::String(s) => Sql::Text(s),
        Value::Bytes(b) => Sql::Blob(b),
        Value::File(path) => Sql::Blob(std::fs::read(&path)?),
        Value::Date(d) => Sql::Text(d.to_string()),
        Value::Time(t) => Sql::Text(t.to_string()),
        Value::DateTime(dt) => Sql::Text(dt.to_string()),
        Value::DateTimeUtc(dt) => Sql::Text(dt.to_rfc3339()),
        Value::Json(j) => Sql::Text(j.to_string()),
        Value::Uuid(u) => Sql::Text(u.to_string()),
        Value::Array(items) => {
            return Err(DataExpressError::NotSupported(format!(
                "SQLite cannot bind an array of {} values",
                items.len()
            )));
        }
    })
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| DataExpressError::Driver(e.to_string()))?;

    Ok(match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    })
}
