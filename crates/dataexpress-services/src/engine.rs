//! The `execute` entry point

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use dataexpress_core::{
    Connection, EngineConfig, Inputs, OutputFilter, ProcessorType, Result, ResultBag,
};
use dataexpress_drivers::VendorRegistry;

use crate::ExecutionContext;
use crate::factory::ProcessorFactory;
use crate::processor::{ExecutionEnv, Processor};
use crate::table_cache::TableInfoCache;

/// SQL execution engine
///
/// Holds the processor factory, the vendor registry and the column cache.
/// All three are shared and can be injected, so tests get fresh state by
/// building a fresh engine.
pub struct DataExpress {
    config: EngineConfig,
    factory: ProcessorFactory,
    vendors: Arc<VendorRegistry>,
    tables: Arc<TableInfoCache>,
}

impl DataExpress {
    /// Build an engine whose named statements come from `config`
    pub fn new(config: EngineConfig) -> Result<Self> {
        let statements = Arc::new(config.named_statements()?);
        Ok(Self::with_parts(
            config,
            ProcessorFactory::new(statements),
            Arc::new(VendorRegistry::with_defaults()),
            Arc::new(TableInfoCache::new()),
        ))
    }

    pub fn with_parts(
        config: EngineConfig,
        factory: ProcessorFactory,
        vendors: Arc<VendorRegistry>,
        tables: Arc<TableInfoCache>,
    ) -> Self {
        Self {
            config,
            factory,
            vendors,
            tables,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn factory(&self) -> &ProcessorFactory {
        &self.factory
    }

    pub fn vendors(&self) -> &Arc<VendorRegistry> {
        &self.vendors
    }

    pub fn tables(&self) -> &TableInfoCache {
        &self.tables
    }

    /// Run a processor against `connection`.
    ///
    /// `output_filters` may carry `only` and `except` column lists. Errors
    /// other than configuration and coercion errors come back wrapped as
    /// `Execution` errors naming the processor.
    #[tracing::instrument(
        skip(self, connection, inputs, output_filters),
        fields(processor_type = %processor_type, identity = %connection.identity())
    )]
    pub fn execute(
        &self,
        connection: &dyn Connection,
        processor_type: ProcessorType,
        processor_name: &str,
        inputs: Inputs,
        output_filters: Option<&HashMap<String, String>>,
    ) -> Result<ResultBag> {
        let filter = output_filters.map(OutputFilter::from_map).unwrap_or_default();
        let context = ExecutionContext::root(processor_name, self.config.max_autofill_depth);

        self.run(connection, processor_type, processor_name, inputs, filter, context)
            .inspect_err(|e| {
                tracing::error!(processor = %processor_name, error = %e, "processor execution failed");
            })
    }

    /// Run one level of a call. Auto-fill re-enters here with a deeper
    /// context.
    pub(crate) fn run(
        &self,
        connection: &dyn Connection,
        processor_type: ProcessorType,
        processor_name: &str,
        inputs: Inputs,
        filter: OutputFilter,
        context: ExecutionContext,
    ) -> Result<ResultBag> {
        let started = Instant::now();
        let processor = self.factory.processor(processor_type, processor_name)?;
        let env = ExecutionEnv {
            engine: self,
            connection,
            vendor: self.vendors.for_connection(connection),
            context,
        };

        let mut bag = processor
            .execute(&env, inputs, filter)
            .map_err(|e| e.into_execution(processor.name()))?;
        bag.execution_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(
            processor = %processor.name(),
            elapsed_ms = bag.execution_time_ms,
            "processor finished"
        );
        Ok(bag)
    }
}

impl Default for DataExpress {
    fn default() -> Self {
        Self::with_parts(
            EngineConfig::default(),
            ProcessorFactory::new(Arc::new(dataexpress_core::NamedStatements::new())),
            Arc::new(VendorRegistry::with_defaults()),
            Arc::new(TableInfoCache::new()),
        )
    }
}
