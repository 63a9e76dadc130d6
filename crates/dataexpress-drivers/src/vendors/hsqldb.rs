use dataexpress_core::inputs::{self, DEFAULT_PAGINATION_LIMIT};
use dataexpress_core::{Inputs, OutputFilter, PageWindow, Result, VendorAdapter};

use super::require_select;

/// HSQLDB puts the window right after the SELECT keyword:
/// `SELECT LIMIT <offset> <limit> ...`.
#[derive(Debug, Clone, Default)]
pub struct HsqldbAdapter;

impl VendorAdapter for HsqldbAdapter {
    fn name(&self) -> &str {
        "hsqldb"
    }

    fn build_paginated_sql(
        &self,
        sql: &str,
        inputs: &mut Inputs,
        _filter: &mut OutputFilter,
    ) -> Result<String> {
        require_select(self.name(), sql)?;
        let window = PageWindow::from_inputs(inputs, DEFAULT_PAGINATION_LIMIT);
        window.store(inputs);

        let body = &sql.trim_start()["SELECT".len()..];
        Ok(format!(
            "SELECT LIMIT ?{}:INTEGER ?{}:INTEGER{}",
            inputs::RECORDS_OFFSET,
            inputs::RECORDS_LIMIT,
            body
        ))
    }
}
