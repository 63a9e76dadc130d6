//! Table column cache used for parameter type inference

use std::collections::HashMap;
use std::sync::Arc;

use dataexpress_core::{ColumnInfo, Connection, Result};
use dataexpress_query::TableCatalog;
use parking_lot::RwLock;

/// Column metadata per connection identity and table
///
/// Tables the catalog does not know are not cached, so a table created
/// later is picked up on the next lookup.
#[derive(Default)]
pub struct TableInfoCache {
    entries: RwLock<HashMap<(String, String), Arc<[ColumnInfo]>>>,
}

impl TableInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get cached columns for a table
    pub fn get(&self, identity: &str, table: &str) -> Option<Arc<[ColumnInfo]>> {
        let key = cache_key(identity, table);
        let result = self.entries.read().get(&key).cloned();
        if result.is_some() {
            tracing::debug!(identity = %identity, table = %table, "cache hit for columns");
        } else {
            tracing::debug!(identity = %identity, table = %table, "cache miss for columns");
        }
        result
    }

    pub fn insert(&self, identity: &str, table: &str, columns: Arc<[ColumnInfo]>) {
        self.entries.write().insert(cache_key(identity, table), columns);
    }

    /// Columns of `table`, read through the connection on a miss
    pub fn columns_for(&self, connection: &dyn Connection, table: &str) -> Result<Arc<[ColumnInfo]>> {
        let identity = connection.identity();
        if let Some(columns) = self.get(&identity, table) {
            return Ok(columns);
        }

        let columns: Arc<[ColumnInfo]> = connection.table_columns(table)?.into();
        if !columns.is_empty() {
            self.insert(&identity, table, columns.clone());
        }
        Ok(columns)
    }

    /// Drop one table, or every table of a connection when `table` is `None`
    pub fn invalidate(&self, identity: &str, table: Option<&str>) {
        let mut entries = self.entries.write();
        match table {
            Some(table) => {
                entries.remove(&cache_key(identity, table));
            }
            None => entries.retain(|(id, _), _| id != identity),
        }
        tracing::debug!(identity = %identity, table = ?table, "invalidated column cache");
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

fn cache_key(identity: &str, table: &str) -> (String, String) {
    (identity.to_string(), table.to_ascii_uppercase())
}

/// Catalog view of one connection backed by a [`TableInfoCache`]
pub struct CachedCatalog<'a> {
    cache: &'a TableInfoCache,
    connection: &'a dyn Connection,
}

impl<'a> CachedCatalog<'a> {
    pub fn new(cache: &'a TableInfoCache, connection: &'a dyn Connection) -> Self {
        Self { cache, connection }
    }
}

impl TableCatalog for CachedCatalog<'_> {
    fn columns_of(&self, table: &str) -> Result<Arc<[ColumnInfo]>> {
        self.cache.columns_for(self.connection, table)
    }
}
