//! Materialized tabular results

use crate::{SqlType, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Metadata for one result column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name as reported by the driver
    pub name: String,
    pub sql_type: SqlType,
    /// Declared type name (e.g., "VARCHAR", "INTEGER")
    pub type_name: Option<String>,
    /// Native class name hint used by vendor extraction
    pub native_class: Option<String>,
    /// 0-based position within the owning [`RowInfo`]
    pub ordinal: usize,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            type_name: None,
            native_class: None,
            ordinal: 0,
        }
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_native_class(mut self, native_class: impl Into<String>) -> Self {
        self.native_class = Some(native_class.into());
        self
    }
}

/// Ordered, deduplicated header of a result table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowInfo {
    columns: Vec<ColumnInfo>,
}

impl RowInfo {
    /// Build a header, dropping columns whose name repeats an earlier one
    /// (compared case-insensitively) and renumbering ordinals.
    pub fn new(columns: impl IntoIterator<Item = ColumnInfo>) -> Self {
        let mut kept: Vec<ColumnInfo> = Vec::new();
        for column in columns {
            if kept.iter().any(|c| c.name.eq_ignore_ascii_case(&column.name)) {
                continue;
            }
            kept.push(ColumnInfo {
                ordinal: kept.len(),
                ..column
            });
        }
        Self { columns: kept }
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&ColumnInfo> {
        self.columns.get(index)
    }

    /// Case-insensitive position lookup
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// One row's cells, aligned to a shared [`RowInfo`]
#[derive(Debug, Clone, PartialEq)]
pub struct RowData {
    header: Arc<RowInfo>,
    cells: Vec<Value>,
}

impl RowData {
    /// Pair a header with its cells. Missing trailing cells become NULL and
    /// surplus cells are dropped so the row always matches its header.
    pub fn new(header: Arc<RowInfo>, mut cells: Vec<Value>) -> Self {
        cells.resize(header.len(), Value::Null);
        Self { header, cells }
    }

    pub fn header(&self) -> &Arc<RowInfo> {
        &self.header
    }

    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&Value> {
        self.cells.get(index)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Value> {
        self.header.position_of(name).and_then(|i| self.cells.get(i))
    }

    /// Column name to value, in column order
    pub fn to_map(&self) -> IndexMap<String, Value> {
        self.header
            .columns()
            .iter()
            .zip(&self.cells)
            .map(|(c, v)| (c.name.clone(), v.clone()))
            .collect()
    }
}

/// A fully materialized result set
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    header: Arc<RowInfo>,
    rows: Vec<RowData>,
}

impl TableData {
    pub fn new(header: RowInfo) -> Self {
        Self {
            header: Arc::new(header),
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> &Arc<RowInfo> {
        &self.header
    }

    /// Append a row built against this table's header.
    pub fn push_cells(&mut self, cells: Vec<Value>) {
        let row = RowData::new(self.header.clone(), cells);
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[RowData] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.header.column_names()
    }

    pub fn first_row(&self) -> Option<&RowData> {
        self.rows.first()
    }

    /// First cell of the first row
    pub fn first_object(&self) -> Option<&Value> {
        self.first_row().and_then(|r| r.field(0))
    }

    pub fn rows_as_maps(&self) -> Vec<IndexMap<String, Value>> {
        self.rows.iter().map(RowData::to_map).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header() -> RowInfo {
        RowInfo::new([
            ColumnInfo::new("ID", SqlType::Integer),
            ColumnInfo::new("title", SqlType::Varchar),
            ColumnInfo::new("Id", SqlType::Integer),
        ])
    }

    #[test]
    fn test_header_dedups_and_renumbers() {
        let h = header();
        assert_eq!(h.column_names(), vec!["ID".to_string(), "title".to_string()]);
        assert_eq!(h.column(1).map(|c| c.ordinal), Some(1));
        assert_eq!(h.position_of("TITLE"), Some(1));
    }

    #[test]
    fn test_rows_share_header() {
        let mut t = TableData::new(header());
        t.push_cells(vec![Value::Int64(1), Value::from("a")]);
        t.push_cells(vec![Value::Int64(2)]);
        assert!(Arc::ptr_eq(t.rows()[0].header(), t.rows()[1].header()));
        assert_eq!(t.rows()[1].field(1), Some(&Value::Null));
        assert_eq!(t.first_object(), Some(&Value::Int64(1)));
    }

    #[test]
    fn test_rows_as_maps_keep_column_order() {
        let mut t = TableData::new(header());
        t.push_cells(vec![Value::Int64(1), Value::from("a")]);
        let maps = t.rows_as_maps();
        let keys: Vec<&String> = maps[0].keys().collect();
        assert_eq!(keys, vec!["ID", "title"]);
        assert_eq!(t.rows()[0].field_by_name("Title"), Some(&Value::from("a")));
    }
}
