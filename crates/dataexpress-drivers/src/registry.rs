//! Vendor adapter registry

use std::collections::HashMap;
use std::sync::Arc;

use dataexpress_core::{Connection, VendorAdapter};
use parking_lot::RwLock;

use crate::vendors::{
    GenericAdapter, H2Adapter, HsqldbAdapter, MySqlAdapter, OracleAdapter, PostgresAdapter,
    SqlServerAdapter,
};

/// Registry of vendor adapters, with the adapter chosen for each connection
/// identity remembered
pub struct VendorRegistry {
    adapters: RwLock<HashMap<String, Arc<dyn VendorAdapter>>>,
    by_connection: RwLock<HashMap<String, Arc<dyn VendorAdapter>>>,
    fallback: Arc<dyn VendorAdapter>,
}

impl VendorRegistry {
    /// Create a registry with no adapters besides the generic fallback
    pub fn new() -> Self {
        Self {
            adapters: RwLock::new(HashMap::new()),
            by_connection: RwLock::new(HashMap::new()),
            fallback: Arc::new(GenericAdapter),
        }
    }

    /// Create a registry with all built-in adapters registered
    pub fn with_defaults() -> Self {
        let registry = Self::new();

        registry.register(Arc::new(MySqlAdapter));
        registry.register(Arc::new(PostgresAdapter));
        registry.register(Arc::new(H2Adapter));
        registry.register(Arc::new(HsqldbAdapter));
        registry.register(Arc::new(OracleAdapter));
        registry.register(Arc::new(SqlServerAdapter));
        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::SqliteAdapter::new()));

        registry
    }

    /// Register an adapter under its own name, replacing any previous one.
    ///
    /// Remembered per-connection choices are dropped so the next lookup sees
    /// the new adapter.
    pub fn register(&self, adapter: Arc<dyn VendorAdapter>) {
        let name = canonical_name(adapter.name());
        tracing::info!(vendor = %name, "registering vendor adapter");
        self.adapters.write().insert(name, adapter);
        self.by_connection.write().clear();
    }

    /// Get an adapter by vendor name. Common aliases such as `postgresql`,
    /// `mariadb` and `mssql` are accepted.
    pub fn get(&self, name: &str) -> Option<Arc<dyn VendorAdapter>> {
        let adapter = self.adapters.read().get(&canonical_name(name)).cloned();
        if adapter.is_none() {
            tracing::debug!(vendor = %name, "vendor adapter not found in registry");
        }
        adapter
    }

    /// List all registered vendor names
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.adapters.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if an adapter is registered for a vendor
    pub fn has(&self, name: &str) -> bool {
        self.adapters.read().contains_key(&canonical_name(name))
    }

    /// The adapter for a connection, chosen by its vendor and remembered
    /// by its identity. Unknown vendors get the generic adapter.
    pub fn for_connection(&self, connection: &dyn Connection) -> Arc<dyn VendorAdapter> {
        let identity = connection.identity();
        if let Some(adapter) = self.by_connection.read().get(&identity) {
            tracing::trace!(identity = %identity, "vendor adapter cache hit");
            return adapter.clone();
        }

        let adapter = self.get(connection.vendor()).unwrap_or_else(|| {
            tracing::debug!(
                vendor = %connection.vendor(),
                "no dedicated vendor adapter, using generic"
            );
            self.fallback.clone()
        });
        tracing::debug!(identity = %identity, adapter = adapter.name(), "selected vendor adapter");
        self.by_connection.write().insert(identity, adapter.clone());
        adapter
    }
}

impl Default for VendorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn canonical_name(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    match lower.as_str() {
        "postgresql" | "pg" => "postgres".to_string(),
        "mariadb" => "mysql".to_string(),
        "mssql" | "sql server" => "sqlserver".to_string(),
        "hsql" => "hsqldb".to_string(),
        _ => lower,
    }
}
