//! Engine configuration and the named-statement registry
//!
//! Configuration is plain TOML:
//!
//! ```toml
//! max_autofill_depth = 8
//! default_pagination_limit = 10
//! statements_file = "statements.toml"
//!
//! [statements]
//! find_post = "SELECT * FROM posts WHERE id = ?id"
//! ```

use crate::{DataExpressError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deepest chain of nested auto-fill lookups allowed
    #[serde(default = "default_max_autofill_depth")]
    pub max_autofill_depth: usize,

    /// Row limit used when pagination is requested without one
    #[serde(default = "default_pagination_limit")]
    pub default_pagination_limit: i64,

    /// Extra TOML file holding a `[statements]` table, relative to the
    /// config file it was read from
    #[serde(default)]
    pub statements_file: Option<PathBuf>,

    /// Named SQL statements
    #[serde(default)]
    pub statements: HashMap<String, String>,
}

fn default_max_autofill_depth() -> usize {
    8
}

fn default_pagination_limit() -> i64 {
    crate::inputs::DEFAULT_PAGINATION_LIMIT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_autofill_depth: default_max_autofill_depth(),
            default_pagination_limit: default_pagination_limit(),
            statements_file: None,
            statements: HashMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct StatementsFile {
    #[serde(default)]
    statements: HashMap<String, String>,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read a config file, merging in its `statements_file` if one is named.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;

        if let Some(extra) = &config.statements_file {
            let extra_path = match path.parent() {
                Some(dir) if extra.is_relative() => dir.join(extra),
                _ => extra.clone(),
            };
            let extra_text = std::fs::read_to_string(&extra_path)?;
            let file: StatementsFile = toml::from_str(&extra_text)?;
            tracing::debug!(
                path = %extra_path.display(),
                count = file.statements.len(),
                "loaded statements file"
            );
            for (name, sql) in file.statements {
                config.statements.entry(name).or_insert(sql);
            }
        }

        Ok(config)
    }

    /// Build a statement registry from this config
    pub fn named_statements(&self) -> Result<NamedStatements> {
        let registry = NamedStatements::new();
        for (name, sql) in &self.statements {
            registry.register(name, sql)?;
        }
        Ok(registry)
    }
}

/// Registry resolving statement names to SQL text
///
/// Names are stored upper-cased, so lookups ignore case.
#[derive(Debug, Default)]
pub struct NamedStatements {
    statements: RwLock<HashMap<String, String>>,
}

impl NamedStatements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: &str, sql: &str) -> Result<()> {
        if sql.trim().is_empty() {
            return Err(DataExpressError::Configuration(format!(
                "There is no sql statement for {}.",
                name
            )));
        }
        tracing::debug!(statement = %name, "registering named statement");
        self.statements
            .write()
            .insert(name.to_ascii_uppercase(), sql.trim().to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.statements.read().get(&name.to_ascii_uppercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.statements.read().contains_key(&name.to_ascii_uppercase())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.statements.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.statements.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.read().is_empty()
    }
}
