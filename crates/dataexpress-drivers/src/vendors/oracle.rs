use dataexpress_core::inputs::{self, DEFAULT_PAGINATION_LIMIT};
use dataexpress_core::{
    ColumnInfo, Inputs, OutputFilter, PageWindow, Result, Value, ValueSource, VendorAdapter,
};

/// Synthetic row-number column added by the offset wrapper
const ROW_NUMBER_COLUMN: &str = "RNUM";

#[derive(Debug, Clone, Default)]
pub struct OracleAdapter;

impl VendorAdapter for OracleAdapter {
    fn name(&self) -> &str {
        "oracle"
    }

    fn build_paginated_sql(
        &self,
        sql: &str,
        inputs: &mut Inputs,
        filter: &mut OutputFilter,
    ) -> Result<String> {
        let window = PageWindow::from_inputs(inputs, DEFAULT_PAGINATION_LIMIT);
        window.store(inputs);
        filter.add_except(ROW_NUMBER_COLUMN);

        if !window.has_offset() {
            return Ok(format!(
                "SELECT * FROM ( {} ) WHERE rownum <= ?{}:INTEGER",
                sql.trim(),
                inputs::MAX_ROW_INDEX
            ));
        }

        Ok(format!(
            "SELECT * FROM (SELECT /*+ FIRST_ROWS({}) */ a.*, rownum rnum FROM ( {} ) a WHERE rownum <= ?{}:INTEGER ) WHERE rnum > ?{}:INTEGER",
            window.limit,
            sql.trim(),
            inputs::MAX_ROW_INDEX,
            inputs::RECORDS_OFFSET
        ))
    }

    fn extract_by_native_type(
        &self,
        source: &mut dyn ValueSource,
        index: usize,
        column: &ColumnInfo,
    ) -> Result<Option<Value>> {
        match column.native_class.as_deref() {
            Some("oracle.sql.BLOB") => source.get_bytes(index).map(Some),
            Some("oracle.sql.CLOB") => source.get_text(index).map(Some),
            _ => Ok(None),
        }
    }
}
