//! Per-call result container

use crate::{ProcedureDescriptor, ProcessorType, TableData, Value};
use indexmap::IndexMap;
use uuid::Uuid;

/// Everything one `execute` call produced
///
/// Table and value keys are stored upper-cased, so lookups are
/// case-insensitive.
#[derive(Debug, Clone)]
pub struct ResultBag {
    id: Uuid,
    processor_name: String,
    processor_type: ProcessorType,
    tables: IndexMap<String, TableData>,
    named_values: IndexMap<String, Value>,
    /// Rows affected by a non-SELECT statement, or -1
    pub updated_row_count: i64,
    /// First generated key of an INSERT, when the driver reported one
    pub generated_key: Option<i64>,
    /// Wall-clock time spent in the processor
    pub execution_time_ms: u64,
}

impl ResultBag {
    pub fn new(processor_name: impl Into<String>, processor_type: ProcessorType) -> Self {
        Self {
            id: Uuid::new_v4(),
            processor_name: processor_name.into(),
            processor_type,
            tables: IndexMap::new(),
            named_values: IndexMap::new(),
            updated_row_count: -1,
            generated_key: None,
            execution_time_ms: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn processor_name(&self) -> &str {
        &self.processor_name
    }

    pub fn processor_type(&self) -> ProcessorType {
        self.processor_type
    }

    pub fn add_table(&mut self, name: &str, table: TableData) {
        self.tables.insert(name.to_ascii_uppercase(), table);
    }

    pub fn table(&self, name: &str) -> Option<&TableData> {
        self.tables.get(&name.to_ascii_uppercase())
    }

    /// The first table added, if any
    pub fn first_table(&self) -> Option<&TableData> {
        self.tables.values().next()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn tables(&self) -> &IndexMap<String, TableData> {
        &self.tables
    }

    pub fn into_tables(self) -> IndexMap<String, TableData> {
        self.tables
    }

    pub fn add_named_value(&mut self, name: &str, value: Value) {
        self.named_values.insert(name.to_ascii_uppercase(), value);
    }

    pub fn named_value(&self, name: &str) -> Option<&Value> {
        self.named_values.get(&name.to_ascii_uppercase())
    }

    pub fn named_values(&self) -> &IndexMap<String, Value> {
        &self.named_values
    }

    /// Value returned by a function call
    pub fn function_result(&self) -> Option<&Value> {
        self.named_value(ProcedureDescriptor::FUNCTION_RETURN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnInfo, RowInfo, SqlType};

    #[test]
    fn test_lookups_ignore_case() {
        let mut bag = ResultBag::new("posts", ProcessorType::NamedSql);
        bag.add_table("posts", TableData::new(RowInfo::new([ColumnInfo::new("ID", SqlType::Integer)])));
        bag.add_named_value("functionReturn", Value::Int64(3));

        assert!(bag.table("POSTS").is_some());
        assert!(bag.first_table().is_some());
        assert_eq!(bag.function_result(), Some(&Value::Int64(3)));
        assert_eq!(bag.updated_row_count, -1);
    }

    #[test]
    fn test_each_bag_has_its_own_id() {
        let a = ResultBag::new("a", ProcessorType::DirectSql);
        let b = ResultBag::new("a", ProcessorType::DirectSql);
        assert_ne!(a.id(), b.id());
    }
}
