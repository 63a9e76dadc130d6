use dataexpress_core::{Inputs, OutputFilter, PageWindow, Result, VendorAdapter, inputs::DEFAULT_PAGINATION_LIMIT};

use super::require_select;

#[derive(Debug, Clone, Default)]
pub struct PostgresAdapter;

impl VendorAdapter for PostgresAdapter {
    fn name(&self) -> &str {
        "postgres"
    }

    fn build_paginated_sql(
        &self,
        sql: &str,
        inputs: &mut Inputs,
        _filter: &mut OutputFilter,
    ) -> Result<String> {
        require_select(self.name(), sql)?;
        let window = PageWindow::from_inputs(inputs, DEFAULT_PAGINATION_LIMIT);
        Ok(window.append_limit_offset(sql, inputs))
    }
}
