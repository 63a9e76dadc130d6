//! Procedure processor for STORED_PROCEDURE and FUNCTION
//!
//! The signature is discovered from the connection's catalog on first use
//! and remembered per connection identity.

use std::collections::HashMap;
use std::sync::Arc;

use dataexpress_core::inputs::{self, Inputs};
use dataexpress_core::{
    ColumnInfo, Connection, DataExpressError, OutputFilter, Parameter, ParameterMode,
    ProcedureColumn, ProcedureDescriptor, ProcessorType, Result, ResultBag, SqlType,
};
use dataexpress_query::{bind_value, extract_value, materialize};
use parking_lot::RwLock;

use super::{ExecutionEnv, Processor};

pub struct ProcedureProcessor {
    name: String,
    is_function: bool,
    signatures: RwLock<HashMap<String, Arc<ProcedureDescriptor>>>,
}

impl ProcedureProcessor {
    pub fn new(name: &str, is_function: bool) -> Self {
        Self {
            name: name.trim().to_string(),
            is_function,
            signatures: RwLock::new(HashMap::new()),
        }
    }

    /// The signature for `connection`, discovering it on first use
    pub fn descriptor(&self, connection: &dyn Connection) -> Result<Arc<ProcedureDescriptor>> {
        let identity = connection.identity();
        if let Some(descriptor) = self.signatures.read().get(&identity) {
            return Ok(descriptor.clone());
        }

        let descriptor = Arc::new(self.discover(connection)?);
        Ok(self
            .signatures
            .write()
            .entry(identity)
            .or_insert(descriptor)
            .clone())
    }

    fn discover(&self, connection: &dyn Connection) -> Result<ProcedureDescriptor> {
        let mut descriptor = ProcedureDescriptor::new(&self.name, self.is_function);
        let mut columns = connection.procedure_columns(
            descriptor.catalog(),
            descriptor.schema(),
            descriptor.api(),
        )?;
        if columns.is_empty() {
            return Err(DataExpressError::UnsupportedProcessorName(self.name.clone()));
        }
        columns.sort_by_key(|c| c.sequence);

        for column in &columns {
            let Some(mode) = ParameterMode::from_code(column.mode) else {
                tracing::debug!(procedure = %self.name, column = %column.name, mode = column.mode, "skipping column");
                continue;
            };
            let index = descriptor.parameters().len() + 1;
            descriptor.add_parameter(signature_parameter(column, mode, index));
        }

        if self.is_function && descriptor.return_parameter().is_none() {
            return Err(DataExpressError::Configuration(format!(
                "Function {} has no return value",
                self.name
            )));
        }

        tracing::debug!(
            procedure = %descriptor.name(),
            parameter_count = descriptor.parameters().len(),
            "discovered callable signature"
        );
        Ok(descriptor)
    }

    fn run(&self, env: &ExecutionEnv<'_>, inputs: Inputs, filter: OutputFilter) -> Result<ResultBag> {
        let descriptor = self.descriptor(env.connection)?;

        let supplied = inputs.keys().filter(|k| !inputs::is_reserved(k)).count();
        let expected = descriptor.input_count();
        if supplied < expected {
            return Err(DataExpressError::InsufficientInputs {
                expected,
                actual: supplied,
            });
        }

        let mut call = env.connection.prepare_call(&descriptor.call_text())?;
        for parameter in descriptor.parameters() {
            if parameter.is_output() {
                call.register_out(parameter.index, parameter.sql_type)?;
            }
            if parameter.is_input() {
                let value = inputs
                    .get(&parameter.name)
                    .or_else(|| lookup_ignoring_case(&inputs, &parameter.name))
                    .ok_or_else(|| DataExpressError::MissingInput {
                        key: parameter.name.clone(),
                        available: inputs::key_list(&inputs),
                    })?;
                call.bind(parameter.index, bind_value(parameter, value, Some(env.vendor()))?)?;
            }
        }

        call.execute()?;

        let filter = (!filter.is_empty()).then_some(&filter);
        let mut bag = ResultBag::new(descriptor.name(), self.processor_type());
        for parameter in descriptor.parameters().iter().filter(|p| p.is_output()) {
            if parameter.is_cursor {
                let mut cursor = call.take_cursor(parameter.index)?;
                let table = materialize(&mut *cursor, filter, Some(env.vendor()))?;
                bag.add_table(&parameter.name, table);
            } else if filter.is_none_or(|f| f.allows(&parameter.name)) {
                let column = output_column(parameter);
                let value = extract_value(&mut *call, parameter.index, &column, Some(env.vendor()))?;
                bag.add_named_value(&parameter.name, value);
            }
        }
        Ok(bag)
    }
}

fn lookup_ignoring_case<'i>(inputs: &'i Inputs, name: &str) -> Option<&'i dataexpress_core::Value> {
    inputs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

fn signature_parameter(column: &ProcedureColumn, mode: ParameterMode, index: usize) -> Parameter {
    let sql_type = SqlType::from_code(column.data_type);
    let name = if mode == ParameterMode::Return {
        ProcedureDescriptor::FUNCTION_RETURN.to_string()
    } else {
        column.name.clone()
    };
    let is_cursor = mode.is_output()
        && (sql_type == SqlType::Other || column.type_name.to_ascii_uppercase().contains("CURSOR"));

    Parameter::new(name, index)
        .with_mode(mode)
        .with_sql_type(sql_type)
        .with_type_name(column.type_name.clone())
        .with_cursor(is_cursor)
}

fn output_column(parameter: &Parameter) -> ColumnInfo {
    let mut column = ColumnInfo::new(parameter.name.clone(), parameter.sql_type);
    if let Some(type_name) = &parameter.type_name {
        column = column.with_type_name(type_name.clone());
    }
    if let Some(class) = &parameter.native_class {
        column = column.with_native_class(class.clone());
    }
    column
}

impl Processor for ProcedureProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> ProcessorType {
        if self.is_function {
            ProcessorType::Function
        } else {
            ProcessorType::StoredProcedure
        }
    }

    #[tracing::instrument(skip(self, env, inputs, filter), fields(processor = %self.name))]
    fn execute(&self, env: &ExecutionEnv<'_>, inputs: Inputs, filter: OutputFilter) -> Result<ResultBag> {
        self.run(env, inputs, filter)
    }
}
