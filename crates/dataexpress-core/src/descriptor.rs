//! Statement and procedure descriptors
//!
//! A descriptor holds the text of a statement or callable signature together
//! with its parameter list. Statement parameters are resolved lazily, exactly
//! once per descriptor, and published as an immutable slice.

use crate::{DataExpressError, Parameter, ParameterMode, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// The kind of processor a caller asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessorType {
    /// SQL text looked up by name from the statement registry
    NamedSql,
    /// The processor name is the SQL text itself
    DirectSql,
    StoredProcedure,
    Function,
}

impl ProcessorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NamedSql => "NAMED_SQL",
            Self::DirectSql => "DIRECT_SQL",
            Self::StoredProcedure => "STORED_PROCEDURE",
            Self::Function => "FUNCTION",
        }
    }

    /// Whether this type is served by a statement processor
    pub fn is_statement(&self) -> bool {
        matches!(self, Self::NamedSql | Self::DirectSql)
    }
}

impl FromStr for ProcessorType {
    type Err = DataExpressError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NAMED_SQL" | "NAMEDSQL" => Ok(Self::NamedSql),
            "DIRECT_SQL" | "DIRECTSQL" => Ok(Self::DirectSql),
            "STORED_PROCEDURE" | "SPOC" => Ok(Self::StoredProcedure),
            "FUNCTION" => Ok(Self::Function),
            _ => Err(DataExpressError::UnsupportedProcessorType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProcessorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leading keyword of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    pub fn of(sql: &str) -> Self {
        let head: String = sql
            .trim_start()
            .chars()
            .take(6)
            .collect::<String>()
            .to_ascii_uppercase();
        match head.as_str() {
            "SELECT" => Self::Select,
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Other,
        }
    }
}

/// A SQL statement and its lazily resolved parameters
#[derive(Debug)]
pub struct StatementDescriptor {
    name: String,
    original_text: String,
    executable_text: String,
    kind: StatementKind,
    parameters: OnceLock<Arc<[Parameter]>>,
    parse_lock: Mutex<()>,
}

impl StatementDescriptor {
    /// Create an unresolved descriptor.
    ///
    /// `executable_text` is the driver-ready form of `original_text` with
    /// every placeholder reduced to a bare `?`.
    pub fn new(
        name: impl Into<String>,
        original_text: impl Into<String>,
        executable_text: impl Into<String>,
    ) -> Self {
        let original_text = original_text.into();
        Self {
            name: name.into(),
            kind: StatementKind::of(&original_text),
            original_text,
            executable_text: executable_text.into(),
            parameters: OnceLock::new(),
            parse_lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn executable_text(&self) -> &str {
        &self.executable_text
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn is_select(&self) -> bool {
        self.kind == StatementKind::Select
    }

    /// Whether the parameter list has been published
    pub fn is_resolved(&self) -> bool {
        self.parameters.get().is_some()
    }

    /// The published parameter list, if parsing already happened
    pub fn parameters(&self) -> Option<Arc<[Parameter]>> {
        self.parameters.get().cloned()
    }

    /// Return the parameter list, running `parse` if no thread has yet.
    ///
    /// Concurrent first callers serialize on the descriptor's own lock; only
    /// one of them runs `parse` and the rest observe its result. A failed
    /// parse publishes nothing, so the next caller tries again.
    pub fn resolve_with<F>(&self, parse: F) -> Result<Arc<[Parameter]>>
    where
        F: FnOnce(&Self) -> Result<Vec<Parameter>>,
    {
        if let Some(params) = self.parameters.get() {
            return Ok(params.clone());
        }

        let _guard = self.parse_lock.lock();
        if let Some(params) = self.parameters.get() {
            return Ok(params.clone());
        }

        let parsed: Arc<[Parameter]> = parse(self)?.into();
        tracing::debug!(
            statement = %self.name,
            parameter_count = parsed.len(),
            "statement parameters resolved"
        );
        let _ = self.parameters.set(parsed.clone());
        Ok(parsed)
    }
}

/// Signature of a stored procedure or function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureDescriptor {
    name: String,
    schema: Option<String>,
    catalog: Option<String>,
    api: String,
    is_function: bool,
    parameters: Vec<Parameter>,
}

impl ProcedureDescriptor {
    /// Name of the RETURN parameter of a function
    pub const FUNCTION_RETURN: &'static str = "functionReturn";

    /// Build a descriptor from a `[schema.][catalog.]api` name.
    pub fn new(name: &str, is_function: bool) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        let mut parts: Vec<&str> = upper.rsplitn(3, '.').collect();
        parts.reverse();

        let (schema, catalog, api) = match parts.as_slice() {
            [schema, catalog, api] => (
                Some(schema.to_string()),
                Some(catalog.to_string()),
                api.to_string(),
            ),
            [catalog, api] => (None, Some(catalog.to_string()), api.to_string()),
            _ => (None, None, upper.clone()),
        };

        Self {
            name: upper,
            schema,
            catalog,
            api,
            is_function,
            parameters: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    pub fn api(&self) -> &str {
        &self.api
    }

    pub fn is_function(&self) -> bool {
        self.is_function
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    /// Number of IN parameters
    pub fn input_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| p.mode == ParameterMode::In)
            .count()
    }

    /// The function's RETURN parameter
    pub fn return_parameter(&self) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.mode == ParameterMode::Return)
    }

    /// Driver call text, e.g. `{call S.C.API(?,?)}` or `{? = call API(?)}`
    pub fn call_text(&self) -> String {
        let mut qualified = String::new();
        if let Some(schema) = &self.schema {
            qualified.push_str(schema);
            qualified.push('.');
        }
        if let Some(catalog) = &self.catalog {
            qualified.push_str(catalog);
            qualified.push('.');
        }
        qualified.push_str(&self.api);

        if self.is_function {
            let args = self.parameters.len().saturating_sub(1);
            format!("{{? = call {}({})}}", qualified, marks(args))
        } else {
            format!("{{call {}({})}}", qualified, marks(self.parameters.len()))
        }
    }
}

fn marks(n: usize) -> String {
    vec!["?"; n].join(",")
}
