use dataexpress_core::{
    Inputs, OutputFilter, PageWindow, Result, VendorAdapter, inputs::DEFAULT_PAGINATION_LIMIT,
};

use super::{order_by_clause, remain_sql};

/// Synthetic row-number column added by the wrapper
const ROW_NUMBER_COLUMN: &str = "rownumber";

/// Pagination through `ROW_NUMBER() OVER (ORDER BY ..)`. The window is
/// written into the SQL as literals.
#[derive(Debug, Clone, Default)]
pub struct SqlServerAdapter;

impl VendorAdapter for SqlServerAdapter {
    fn name(&self) -> &str {
        "sqlserver"
    }

    fn build_paginated_sql(
        &self,
        sql: &str,
        inputs: &mut Inputs,
        filter: &mut OutputFilter,
    ) -> Result<String> {
        let window = PageWindow::from_inputs(inputs, DEFAULT_PAGINATION_LIMIT);
        let order_by = order_by_clause(sql, inputs)?;
        let remain = remain_sql(sql)?;
        window.store(inputs);
        filter.add_except(ROW_NUMBER_COLUMN);

        Ok(format!(
            "SELECT TOP {} * FROM (SELECT ROW_NUMBER() OVER (ORDER BY {}) AS {}, {}) AS result WHERE {} > {}",
            window.limit, order_by, ROW_NUMBER_COLUMN, remain, ROW_NUMBER_COLUMN, window.offset
        ))
    }
}
