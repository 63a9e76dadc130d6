//! DataExpress Core - Core abstractions for the SQL execution engine
//!
//! This crate provides the types every other DataExpress crate depends on:
//!
//! - `Value` and `SqlType` - the value model and closed SQL type space
//! - `Parameter`, `StatementDescriptor`, `ProcedureDescriptor` - statement metadata
//! - `RowInfo`, `RowData`, `TableData`, `ResultBag` - materialized output
//! - `Connection`, `PreparedStatement`, `CallableStatement`, `Cursor` - driver traits
//! - `VendorAdapter` - database-specific pagination, binding and extraction hooks
//! - `EngineConfig`, `NamedStatements` - configuration and the statement registry

pub mod config;
mod connection;
mod descriptor;
mod error;
pub mod filter;
pub mod inputs;
mod parameter;
mod result;
mod sql_type;
mod table;
mod types;
mod vendor;

pub use config::{EngineConfig, NamedStatements};
pub use connection::*;
pub use descriptor::*;
pub use error::*;
pub use filter::OutputFilter;
pub use inputs::Inputs;
pub use parameter::*;
pub use result::*;
pub use sql_type::*;
pub use table::*;
pub use types::*;
pub use vendor::*;
