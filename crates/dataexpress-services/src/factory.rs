//! Processor factory and cache

use std::collections::HashMap;
use std::sync::Arc;

use dataexpress_core::{DataExpressError, NamedStatements, ProcessorType, Result};
use parking_lot::RwLock;

use crate::processor::{ProcedureProcessor, Processor, StatementProcessor};

/// Processors by type and name, shared across calls
#[derive(Default)]
pub struct ProcessorCache {
    entries: RwLock<HashMap<(ProcessorType, String), Arc<dyn Processor>>>,
}

impl ProcessorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, processor_type: ProcessorType, name: &str) -> Option<Arc<dyn Processor>> {
        self.entries
            .read()
            .get(&(processor_type, cache_name(processor_type, name)))
            .cloned()
    }

    /// Return the cached processor, or insert the one `create` builds.
    /// When two threads race, the first insert wins and both get it.
    pub fn get_or_try_insert<F>(&self, processor_type: ProcessorType, name: &str, create: F) -> Result<Arc<dyn Processor>>
    where
        F: FnOnce() -> Result<Arc<dyn Processor>>,
    {
        if let Some(processor) = self.get(processor_type, name) {
            tracing::trace!(processor = %name, "processor cache hit");
            return Ok(processor);
        }

        let created = create()?;
        tracing::debug!(processor = %name, processor_type = %processor_type, "processor cache miss");
        Ok(self
            .entries
            .write()
            .entry((processor_type, cache_name(processor_type, name)))
            .or_insert(created)
            .clone())
    }

    pub fn remove(&self, processor_type: ProcessorType, name: &str) -> Option<Arc<dyn Processor>> {
        self.entries
            .write()
            .remove(&(processor_type, cache_name(processor_type, name)))
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Direct SQL keeps its exact text; every other name ignores case.
fn cache_name(processor_type: ProcessorType, name: &str) -> String {
    match processor_type {
        ProcessorType::DirectSql => name.trim().to_string(),
        _ => name.trim().to_ascii_uppercase(),
    }
}

/// Builds processors and keeps them in an injected cache
pub struct ProcessorFactory {
    statements: Arc<NamedStatements>,
    cache: Arc<ProcessorCache>,
}

impl ProcessorFactory {
    pub fn new(statements: Arc<NamedStatements>) -> Self {
        Self::with_cache(statements, Arc::new(ProcessorCache::new()))
    }

    pub fn with_cache(statements: Arc<NamedStatements>, cache: Arc<ProcessorCache>) -> Self {
        Self { statements, cache }
    }

    pub fn statements(&self) -> &Arc<NamedStatements> {
        &self.statements
    }

    pub fn cache(&self) -> &Arc<ProcessorCache> {
        &self.cache
    }

    /// Get the processor for `(processor_type, name)`, creating it on first
    /// use. Unknown statement names fail with `UnsupportedProcessorName`.
    pub fn processor(&self, processor_type: ProcessorType, name: &str) -> Result<Arc<dyn Processor>> {
        if name.trim().is_empty() {
            return Err(DataExpressError::UnsupportedProcessorName(name.to_string()));
        }

        self.cache.get_or_try_insert(processor_type, name, || {
            let processor: Arc<dyn Processor> = match processor_type {
                ProcessorType::NamedSql => {
                    let sql = self
                        .statements
                        .get(name)
                        .ok_or_else(|| DataExpressError::UnsupportedProcessorName(name.to_string()))?;
                    Arc::new(StatementProcessor::new(processor_type, name, &sql))
                }
                ProcessorType::DirectSql => Arc::new(StatementProcessor::new(processor_type, name, name)),
                ProcessorType::StoredProcedure => Arc::new(ProcedureProcessor::new(name, false)),
                ProcessorType::Function => Arc::new(ProcedureProcessor::new(name, true)),
            };
            Ok(processor)
        })
    }

    /// Same as [`processor`](Self::processor) with the type given by name,
    /// e.g. `"named_sql"` or `"function"`.
    pub fn processor_by_type_name(&self, processor_type: &str, name: &str) -> Result<Arc<dyn Processor>> {
        self.processor(processor_type.parse()?, name)
    }
}
