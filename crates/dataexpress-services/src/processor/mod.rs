//! Processors
//!
//! A processor owns the descriptor for one statement, procedure or function
//! and knows how to run it against a connection:
//!
//! - [`StatementProcessor`] - NAMED_SQL and DIRECT_SQL
//! - [`ProcedureProcessor`] - STORED_PROCEDURE and FUNCTION

mod procedure;
mod statement;

use std::sync::Arc;

use dataexpress_core::{Connection, Inputs, OutputFilter, ProcessorType, Result, ResultBag, VendorAdapter};

use crate::ExecutionContext;
use crate::engine::DataExpress;

pub use procedure::ProcedureProcessor;
pub use statement::StatementProcessor;

/// Everything a processor needs for one call besides its inputs
pub struct ExecutionEnv<'a> {
    pub engine: &'a DataExpress,
    pub connection: &'a dyn Connection,
    pub vendor: Arc<dyn VendorAdapter>,
    pub context: ExecutionContext,
}

impl ExecutionEnv<'_> {
    pub fn vendor(&self) -> &dyn VendorAdapter {
        self.vendor.as_ref()
    }
}

/// A cached, reusable executor for one processor name
pub trait Processor: Send + Sync {
    fn name(&self) -> &str;

    fn processor_type(&self) -> ProcessorType;

    /// Run once with the given inputs. `filter` may be empty.
    fn execute(&self, env: &ExecutionEnv<'_>, inputs: Inputs, filter: OutputFilter) -> Result<ResultBag>;
}
