//! Vendor adapter trait
//!
//! An adapter carries the database-specific behavior the engine cannot
//! express generically: pagination SQL, binding quirks and extraction of
//! native column types.

use crate::inputs::{self, Inputs};
use crate::{BindValue, ColumnInfo, OutputFilter, Parameter, Result, Value, ValueSource};

/// Database-specific hooks consulted by the processors
pub trait VendorAdapter: Send + Sync {
    /// Vendor name this adapter serves (e.g., "mysql")
    fn name(&self) -> &str;

    /// First refusal on every IN binding. Returning `Some` bypasses the
    /// generic type binder for this value.
    fn try_bind_vendor_specific(&self, parameter: &Parameter, value: &Value) -> Option<BindValue> {
        let _ = (parameter, value);
        None
    }

    /// Rewrite a SELECT into its paginated form.
    ///
    /// The rewritten text may reference new placeholders; their values are
    /// written into `inputs`. Synthetic columns the wrapper adds are pushed
    /// onto the filter's deny-list.
    fn build_paginated_sql(
        &self,
        sql: &str,
        inputs: &mut Inputs,
        filter: &mut OutputFilter,
    ) -> Result<String>;

    /// Extract a column whose native type needs vendor handling. Returning
    /// `None` falls through to the generic extractor.
    fn extract_by_native_type(
        &self,
        source: &mut dyn ValueSource,
        index: usize,
        column: &ColumnInfo,
    ) -> Result<Option<Value>> {
        let _ = (source, index, column);
        Ok(None)
    }
}

/// Limit and offset requested through the reserved input keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

impl PageWindow {
    /// Read the window from inputs. A missing limit or the no-limit marker
    /// falls back to `default_limit`; a missing offset is 0.
    pub fn from_inputs(inputs: &Inputs, default_limit: i64) -> Self {
        let mut limit = inputs::int_value(inputs, inputs::RECORDS_LIMIT).unwrap_or(default_limit);
        if limit == inputs::NO_ROW_LIMIT {
            limit = default_limit;
        }
        let offset = inputs::int_value(inputs, inputs::RECORDS_OFFSET).unwrap_or(0);
        Self { limit, offset }
    }

    pub fn has_offset(&self) -> bool {
        self.offset > 0
    }

    /// Highest row number included in the window
    pub fn max_row_index(&self) -> i64 {
        self.limit + self.offset
    }

    /// Write the resolved window back into the inputs so the placeholders
    /// a pagination rewrite adds can bind.
    pub fn store(&self, inputs: &mut Inputs) {
        inputs.insert(inputs::RECORDS_LIMIT.to_string(), Value::Int64(self.limit));
        inputs.insert(inputs::RECORDS_OFFSET.to_string(), Value::Int64(self.offset));
        inputs.insert(inputs::MAX_ROW_INDEX.to_string(), Value::Int64(self.max_row_index()));
    }

    /// Append `LIMIT`/`OFFSET` placeholders, the form shared by MySQL,
    /// PostgreSQL, H2 and SQLite.
    pub fn append_limit_offset(&self, sql: &str, inputs: &mut Inputs) -> String {
        let mut paged = format!("{} LIMIT ?{}:INTEGER", sql.trim_end(), inputs::RECORDS_LIMIT);
        if self.has_offset() {
            paged.push_str(&format!(" OFFSET ?{}:INTEGER", inputs::RECORDS_OFFSET));
        }
        self.store(inputs);
        paged
    }
}
