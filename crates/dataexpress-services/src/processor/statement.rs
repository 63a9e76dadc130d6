//! Statement processor for NAMED_SQL and DIRECT_SQL

use std::collections::HashMap;
use std::sync::Arc;

use dataexpress_core::inputs::{self, Inputs};
use dataexpress_core::{
    Connection, DataExpressError, OutputFilter, Parameter, ProcessorType, Result, ResultBag,
    StatementDescriptor, Value,
};
use dataexpress_query::{
    StatementParser, auto_replace, autofill_input_key, autofill_keys, bind_value,
    check_replacements, materialize, should_paginate, to_executable,
};
use parking_lot::RwLock;

use super::{ExecutionEnv, Processor};
use crate::table_cache::CachedCatalog;

pub struct StatementProcessor {
    processor_type: ProcessorType,
    descriptor: Arc<StatementDescriptor>,
    /// Paginated forms of the statement, keyed by rewritten text
    paginated: RwLock<HashMap<String, Arc<StatementDescriptor>>>,
    /// Generated-key support per connection identity
    key_support: RwLock<HashMap<String, bool>>,
}

impl StatementProcessor {
    pub fn new(processor_type: ProcessorType, name: &str, sql: &str) -> Self {
        let sql = sql.trim();
        Self {
            processor_type,
            descriptor: Arc::new(StatementDescriptor::new(name, sql, to_executable(sql))),
            paginated: RwLock::new(HashMap::new()),
            key_support: RwLock::new(HashMap::new()),
        }
    }

    pub fn descriptor(&self) -> &Arc<StatementDescriptor> {
        &self.descriptor
    }

    /// Forget every cached generated-key probe result
    pub fn invalidate_capabilities(&self) {
        self.key_support.write().clear();
    }

    /// Whether the connection reports generated keys. A failed probe counts
    /// as unsupported and is retried on the next call.
    fn supports_generated_keys(&self, connection: &dyn Connection) -> bool {
        let identity = connection.identity();
        if let Some(supported) = self.key_support.read().get(&identity) {
            return *supported;
        }

        match connection.supports_generated_keys() {
            Ok(supported) => {
                tracing::debug!(identity = %identity, supported, "probed generated-key support");
                self.key_support.write().insert(identity, supported);
                supported
            }
            Err(e) => {
                tracing::debug!(identity = %identity, error = %e, "generated-key probe failed");
                false
            }
        }
    }

    /// Run every `?@key` lookup and store its scalar under `@key`.
    fn auto_fill(&self, env: &ExecutionEnv<'_>, inputs: &mut Inputs) -> Result<()> {
        for key in autofill_keys(self.descriptor.original_text()) {
            let context = env.context.enter(&key)?;
            tracing::debug!(statement = %self.name(), lookup = %key, depth = context.depth(), "auto-filling input");

            let bag = env.engine.run(
                env.connection,
                ProcessorType::NamedSql,
                &key,
                inputs.clone(),
                OutputFilter::new(),
                context,
            )?;
            let value = bag
                .first_table()
                .and_then(|t| t.first_object())
                .cloned()
                .unwrap_or(Value::Null);
            inputs.insert(autofill_input_key(&key), value);
        }
        Ok(())
    }

    fn paginated_descriptor(&self, sql: &str) -> Arc<StatementDescriptor> {
        if let Some(descriptor) = self.paginated.read().get(sql) {
            return descriptor.clone();
        }
        self.paginated
            .write()
            .entry(sql.to_string())
            .or_insert_with(|| {
                Arc::new(StatementDescriptor::new(self.name(), sql, to_executable(sql)))
            })
            .clone()
    }

    fn run(&self, env: &ExecutionEnv<'_>, mut inputs: Inputs, mut filter: OutputFilter) -> Result<ResultBag> {
        check_replacements(self.descriptor.original_text(), &inputs)?;
        self.auto_fill(env, &mut inputs)?;

        let mut descriptor = self.descriptor.clone();
        if should_paginate(descriptor.kind(), &inputs) {
            let limit = inputs::int_value(&inputs, inputs::RECORDS_LIMIT);
            if limit.is_none_or(|l| l == inputs::NO_ROW_LIMIT) {
                let default_limit = env.engine.config().default_pagination_limit;
                inputs.insert(inputs::RECORDS_LIMIT.to_string(), Value::Int64(default_limit));
            }
            let sql = env
                .vendor()
                .build_paginated_sql(descriptor.original_text(), &mut inputs, &mut filter)?;
            descriptor = self.paginated_descriptor(&sql);
        }

        let replaced = auto_replace(descriptor.original_text(), &inputs)?;
        if replaced != descriptor.original_text() {
            descriptor = Arc::new(StatementDescriptor::new(
                self.name(),
                replaced.as_str(),
                to_executable(&replaced),
            ));
        }

        let catalog = CachedCatalog::new(env.engine.tables(), env.connection);
        let parameters = descriptor.resolve_with(|d| StatementParser::new(&catalog).parse(d.original_text()))?;
        let values = collect_values(&parameters, &inputs)?;

        let want_keys = !descriptor.is_select() && self.supports_generated_keys(env.connection);
        let mut stmt = env.connection.prepare(descriptor.executable_text(), want_keys)?;
        for (parameter, value) in parameters.iter().zip(values) {
            stmt.bind(parameter.index, bind_value(parameter, value, Some(env.vendor()))?)?;
        }

        let mut bag = ResultBag::new(self.name(), self.processor_type);
        if descriptor.is_select() {
            let filter = (!filter.is_empty()).then_some(&filter);
            let mut cursor = stmt.execute_query()?;
            let table = materialize(&mut *cursor, filter, Some(env.vendor()))?;
            tracing::debug!(statement = %self.name(), rows = table.len(), "query complete");
            bag.add_table(self.name(), table);
        } else {
            let affected = stmt.execute_update()?;
            bag.updated_row_count = i64::try_from(affected).unwrap_or(i64::MAX);
            if want_keys {
                match stmt.generated_key() {
                    Ok(key) => bag.generated_key = key,
                    Err(e) => tracing::debug!(error = %e, "generated key unavailable"),
                }
            }
            tracing::debug!(
                statement = %self.name(),
                affected_rows = affected,
                generated_key = ?bag.generated_key,
                "update complete"
            );
        }
        Ok(bag)
    }
}

/// Input value of every parameter, in parameter order
fn collect_values<'i>(parameters: &[Parameter], inputs: &'i Inputs) -> Result<Vec<&'i Value>> {
    parameters
        .iter()
        .map(|p| {
            inputs.get(&p.name).ok_or_else(|| DataExpressError::MissingInput {
                key: p.name.clone(),
                available: inputs::key_list(inputs),
            })
        })
        .collect()
}

impl Processor for StatementProcessor {
    fn name(&self) -> &str {
        self.descriptor.name()
    }

    fn processor_type(&self) -> ProcessorType {
        self.processor_type
    }

    #[tracing::instrument(
        skip(self, env, inputs, filter),
        fields(processor = %self.name(), depth = env.context.depth())
    )]
    fn execute(&self, env: &ExecutionEnv<'_>, inputs: Inputs, filter: OutputFilter) -> Result<ResultBag> {
        self.run(env, inputs, filter)
    }
}
