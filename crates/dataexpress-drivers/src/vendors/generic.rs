use dataexpress_core::{Inputs, OutputFilter, PageWindow, Result, VendorAdapter, inputs::DEFAULT_PAGINATION_LIMIT};

/// Fallback for vendors without a dedicated adapter. Paginates with
/// `LIMIT`/`OFFSET` and leaves binding and extraction to the generic paths.
#[derive(Debug, Clone, Default)]
pub struct GenericAdapter;

impl VendorAdapter for GenericAdapter {
    fn name(&self) -> &str {
        "generic"
    }

    fn build_paginated_sql(
        &self,
        sql: &str,
        inputs: &mut Inputs,
        _filter: &mut OutputFilter,
    ) -> Result<String> {
        let window = PageWindow::from_inputs(inputs, DEFAULT_PAGINATION_LIMIT);
        Ok(window.append_limit_offset(sql, inputs))
    }
}
