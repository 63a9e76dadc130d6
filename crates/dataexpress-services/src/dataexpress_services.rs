//! DataExpress Services - processor dispatch for the SQL execution engine
//!
//! # Architecture
//!
//! ```text
//! SqlClient / DataExpress::execute   (this crate)
//!     ↓
//! ProcessorFactory → StatementProcessor | ProcedureProcessor
//!     ↓
//! dataexpress-query   (parser, binder, materializer, rewrites)
//!     ↓
//! dataexpress-drivers (vendor adapters, SQLite) + dataexpress-core
//! ```
//!
//! A call resolves its processor from the factory's cache, picks the vendor
//! adapter for the connection, then binds, executes and materializes. Each
//! call's [`ResultBag`](dataexpress_core::ResultBag) belongs to the caller.

mod client;
mod context;
mod engine;
mod factory;
pub mod processor;
mod table_cache;

pub use client::SqlClient;
pub use context::ExecutionContext;
pub use engine::DataExpress;
pub use factory::{ProcessorCache, ProcessorFactory};
pub use processor::{ExecutionEnv, ProcedureProcessor, Processor, StatementProcessor};
pub use table_cache::{CachedCatalog, TableInfoCache};
