//! Convenience client over [`DataExpress::execute`]

use std::sync::Arc;

use dataexpress_core::{
    Connection, DataExpressError, Inputs, ProcessorType, Result, ResultBag, RowData, TableData,
    Value,
};

use crate::engine::DataExpress;

/// An engine bound to one connection
///
/// Every method goes through [`DataExpress::execute`] and returns its errors
/// unchanged.
#[derive(Clone)]
pub struct SqlClient {
    engine: Arc<DataExpress>,
    connection: Arc<dyn Connection>,
}

impl SqlClient {
    pub fn new(engine: Arc<DataExpress>, connection: Arc<dyn Connection>) -> Self {
        Self { engine, connection }
    }

    pub fn engine(&self) -> &Arc<DataExpress> {
        &self.engine
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn execute(&self, processor_type: ProcessorType, name: &str, inputs: Inputs) -> Result<ResultBag> {
        self.engine
            .execute(self.connection.as_ref(), processor_type, name, inputs, None)
    }

    /// Rows of a SELECT given as SQL text
    pub fn retrieve_table_by_sql(&self, sql: &str, inputs: Inputs) -> Result<TableData> {
        first_table(self.execute(ProcessorType::DirectSql, sql, inputs)?, sql)
    }

    /// Rows of a named SELECT
    pub fn retrieve_table_by_key(&self, key: &str, inputs: Inputs) -> Result<TableData> {
        first_table(self.execute(ProcessorType::NamedSql, key, inputs)?, key)
    }

    pub fn retrieve_rows(&self, sql: &str, inputs: Inputs) -> Result<Vec<RowData>> {
        Ok(self.retrieve_table_by_sql(sql, inputs)?.rows().to_vec())
    }

    pub fn retrieve_one_row(&self, sql: &str, inputs: Inputs) -> Result<Option<RowData>> {
        Ok(self.retrieve_table_by_sql(sql, inputs)?.first_row().cloned())
    }

    /// First column of the first row
    pub fn retrieve_object(&self, sql: &str, inputs: Inputs) -> Result<Option<Value>> {
        Ok(self.retrieve_table_by_sql(sql, inputs)?.first_object().cloned())
    }

    /// Run a non-SELECT statement and return the affected row count
    pub fn execute_sql(&self, sql: &str, inputs: Inputs) -> Result<i64> {
        Ok(self.execute(ProcessorType::DirectSql, sql, inputs)?.updated_row_count)
    }

    pub fn execute_sql_by_key(&self, key: &str, inputs: Inputs) -> Result<i64> {
        Ok(self.execute(ProcessorType::NamedSql, key, inputs)?.updated_row_count)
    }

    pub fn execute_procedure(&self, name: &str, inputs: Inputs) -> Result<ResultBag> {
        self.execute(ProcessorType::StoredProcedure, name, inputs)
    }

    /// Call a function and return its value, NULL when it returned none
    pub fn execute_function(&self, name: &str, inputs: Inputs) -> Result<Value> {
        let bag = self.execute(ProcessorType::Function, name, inputs)?;
        Ok(bag.function_result().cloned().unwrap_or(Value::Null))
    }
}

fn first_table(bag: ResultBag, name: &str) -> Result<TableData> {
    bag.into_tables()
        .into_values()
        .next()
        .ok_or_else(|| DataExpressError::NotFound(format!("no result table for {}", name)))
}
