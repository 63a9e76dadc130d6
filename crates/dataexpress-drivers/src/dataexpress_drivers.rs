//! DataExpress Drivers - vendor adapters and database drivers
//!
//! Vendor adapters carry the per-database pieces of statement execution:
//! pagination SQL, binding quirks and native-type extraction. The
//! [`VendorRegistry`] picks one for a connection.

#[cfg(feature = "sqlite")]
pub use dataexpress_driver_sqlite as sqlite;

mod registry;
pub mod vendors;

pub use registry::VendorRegistry;
pub use vendors::{
    GenericAdapter, H2Adapter, HsqldbAdapter, MySqlAdapter, OracleAdapter, PostgresAdapter,
    SqlServerAdapter,
};

/// Re-export commonly used types from dataexpress-core
pub use dataexpress_core::{
    Connection, DataExpressError, OutputFilter, PageWindow, Result, VendorAdapter,
};
