//! SQLite vendor adapter

use dataexpress_core::{
    DataExpressError, Inputs, OutputFilter, PageWindow, Result, StatementKind, VendorAdapter,
    inputs::DEFAULT_PAGINATION_LIMIT,
};

/// Pagination through `LIMIT`/`OFFSET`
#[derive(Debug, Clone, Copy)]
pub struct SqliteAdapter {
    default_limit: i64,
}

impl SqliteAdapter {
    pub fn new() -> Self {
        Self {
            default_limit: DEFAULT_PAGINATION_LIMIT,
        }
    }

    pub fn with_default_limit(default_limit: i64) -> Self {
        Self { default_limit }
    }
}

impl Default for SqliteAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl VendorAdapter for SqliteAdapter {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn build_paginated_sql(
        &self,
        sql: &str,
        inputs: &mut Inputs,
        _filter: &mut OutputFilter,
    ) -> Result<String> {
        if StatementKind::of(sql) != StatementKind::Select {
            return Err(DataExpressError::NotSupported(format!(
                "Only SELECT statements can be paginated: {}",
                sql
            )));
        }
        let window = PageWindow::from_inputs(inputs, self.default_limit);
        Ok(window.append_limit_offset(sql, inputs))
    }
}
