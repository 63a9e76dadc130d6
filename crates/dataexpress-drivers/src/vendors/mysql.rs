use dataexpress_core::{
    BindValue, ColumnInfo, Inputs, OutputFilter, PageWindow, Parameter, Result, SqlType, Value,
    ValueSource, VendorAdapter, inputs::DEFAULT_PAGINATION_LIMIT,
};

/// Zero dates MySQL accepts but no date type can represent
const ZERO_DATES: &[&str] = &["0000-00-00", "0000-00-00 00:00:00"];

#[derive(Debug, Clone, Default)]
pub struct MySqlAdapter;

impl VendorAdapter for MySqlAdapter {
    fn name(&self) -> &str {
        "mysql"
    }

    /// Zero dates go to the server as text.
    fn try_bind_vendor_specific(&self, parameter: &Parameter, value: &Value) -> Option<BindValue> {
        let text = value.as_str()?;
        if !parameter.sql_type.is_temporal() || !ZERO_DATES.contains(&text.trim()) {
            return None;
        }
        tracing::debug!(index = parameter.index, value = text, "binding MySQL zero date as text");
        Some(BindValue::Typed {
            value: value.clone(),
            sql_type: SqlType::Varchar,
        })
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

    /// A timestamp the driver cannot read comes back as NULL.
    fn extract_by_native_type(
        &self,
        source: &mut dyn ValueSource,
        index: usize,
        column: &ColumnInfo,
    ) -> Result<Option<Value>> {
        if column.sql_type != SqlType::Timestamp {
            return Ok(None);
        }
        match source.get_timestamp(index) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(column = %column.name, error = %e, "unreadable MySQL timestamp, using NULL");
                Ok(Some(Value::Null))
            }
        }
    }
}
