//! Shared fixtures: logging, a SQLite blog database and a scripted
//! connection for procedure calls

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Once};

use dataexpress_core::{
    BindValue, BufferedCursor, CallableStatement, ColumnInfo, Connection, Cursor,
    DataExpressError, EngineConfig, PreparedStatement, ProcedureColumn, Result, SqlType, Value,
    ValueSource,
};
use dataexpress_drivers::sqlite::SqliteConnection;
use dataexpress_services::DataExpress;
use parking_lot::Mutex;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

pub const BLOG_CONFIG: &str = r#"
max_autofill_depth = 4

[statements]
find_post = "SELECT * FROM posts WHERE id = ?id"
posts_by_user = "SELECT * FROM posts WHERE user_id = ?user_id"
add_post = "INSERT INTO posts (user_id, title, body) VALUES (?user_id, ?title, ?body)"
latest_author = "SELECT MAX(user_id) FROM posts"
posts_of_latest = "SELECT id, title FROM posts WHERE user_id = ?@latest_author ORDER BY id"
loop_a = "SELECT id FROM posts WHERE id = ?@loop_b"
loop_b = "SELECT id FROM posts WHERE id = ?@loop_a"
table_count = "SELECT COUNT(*) FROM #table#"
sorted_by_lookup = "SELECT id FROM posts WHERE user_id = ?@no_such_lookup ORDER BY #sort#"
"#;

pub fn blog_engine() -> DataExpress {
    init_test_logging();
    let config = EngineConfig::from_toml_str(BLOG_CONFIG).expect("valid config");
    DataExpress::new(config).expect("engine")
}

/// Six posts, two per user, ids 1 to 6
pub fn blog_db() -> SqliteConnection {
    let conn = SqliteConnection::open_named("blog", ":memory:").expect("open in-memory db");
    conn.execute_batch(
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER, title VARCHAR(100), body TEXT);
         INSERT INTO posts (user_id, title, body) VALUES
            (1, 'post 1', 'a'), (1, 'post 2', 'b'),
            (2, 'post 3', 'c'), (2, 'post 4', 'd'),
            (3, 'post 5', 'e'), (3, 'post 6', 'f');",
    )
    .expect("create posts");
    conn
}

pub fn inputs<const N: usize>(pairs: [(&str, Value); N]) -> dataexpress_core::Inputs {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Catalog rows and outputs of one scripted procedure
#[derive(Clone, Default)]
pub struct Script {
    pub columns: Vec<ProcedureColumn>,
    pub scalars: HashMap<usize, Value>,
    pub cursors: HashMap<usize, (Vec<ColumnInfo>, Vec<Vec<Value>>)>,
}

/// Connection answering procedure metadata and calls from scripts
#[derive(Default)]
pub struct ScriptedConnection {
    procedures: HashMap<String, Script>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub bound: Arc<Mutex<Vec<(usize, BindValue)>>>,
    pub registered: Arc<Mutex<Vec<(usize, SqlType)>>>,
}

impl ScriptedConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_procedure(mut self, api: &str, script: Script) -> Self {
        self.procedures.insert(api.to_ascii_uppercase(), script);
        self
    }
}

pub fn procedure_column(sequence: i32, name: &str, mode: i32, sql_type: SqlType, type_name: &str) -> ProcedureColumn {
    ProcedureColumn {
        sequence,
        name: name.to_string(),
        mode,
        data_type: sql_type.code(),
        type_name: type_name.to_string(),
    }
}

impl Connection for ScriptedConnection {
    fn vendor(&self) -> &str {
        "scripted"
    }

    fn connection_name(&self) -> &str {
        "procedures"
    }

    fn prepare(&self, sql: &str, _want_generated_keys: bool) -> Result<Box<dyn PreparedStatement + '_>> {
        Err(DataExpressError::NotSupported(sql.to_string()))
    }

    fn prepare_call(&self, call_text: &str) -> Result<Box<dyn CallableStatement + '_>> {
        let script = self
            .procedures
            .iter()
            .find(|(api, _)| call_text.contains(&format!("{}(", api)))
            .map(|(_, s)| s.clone())
            .ok_or_else(|| DataExpressError::NotFound(call_text.to_string()))?;
        Ok(Box::new(ScriptedCall {
            conn: self,
            script,
            call_text: call_text.to_string(),
        }))
    }

    fn table_columns(&self, _table: &str) -> Result<Vec<ColumnInfo>> {
        Ok(Vec::new())
    }

    fn procedure_columns(&self, _catalog: Option<&str>, _schema: Option<&str>, api: &str) -> Result<Vec<ProcedureColumn>> {
        Ok(self
            .procedures
            .get(&api.to_ascii_uppercase())
            .map(|s| s.columns.clone())
            .unwrap_or_default())
    }
}

struct ScriptedCall<'a> {
    conn: &'a ScriptedConnection,
    script: Script,
    call_text: String,
}

impl ValueSource for ScriptedCall<'_> {
    fn get_value(&mut self, index: usize) -> Result<Value> {
        self.script
            .scalars
            .get(&index)
            .cloned()
            .ok_or_else(|| DataExpressError::NotFound(format!("output {}", index)))
    }
}

impl CallableStatement for ScriptedCall<'_> {
    fn register_out(&mut self, index: usize, sql_type: SqlType) -> Result<()> {
        self.conn.registered.lock().push((index, sql_type));
        Ok(())
    }

    fn bind(&mut self, index: usize, value: BindValue) -> Result<()> {
        self.conn.bound.lock().push((index, value));
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        self.conn.calls.lock().push(self.call_text.clone());
        Ok(())
    }

    fn take_cursor(&mut self, index: usize) -> Result<Box<dyn Cursor + '_>> {
        let (columns, rows) = self
            .script
            .cursors
            .remove(&index)
            .ok_or_else(|| DataExpressError::NotFound(format!("cursor {}", index)))?;
        Ok(Box::new(BufferedCursor::new(columns, rows)))
    }
}
