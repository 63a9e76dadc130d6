//! Error types for DataExpress

use thiserror::Error;

/// Core error type for DataExpress operations
#[derive(Error, Debug)]
pub enum DataExpressError {
    #[error("Unsupported processor type: {0}")]
    UnsupportedProcessorType(String),

    #[error("Unsupported processor name: {0}")]
    UnsupportedProcessorName(String),

    #[error("There must be a key/value pair corresponding to key named {key} in input parameters: {available:?}")]
    MissingInput { key: String, available: Vec<String> },

    #[error("Input parameters insufficient: expected at least {expected}, got {actual}")]
    InsufficientInputs { expected: usize, actual: usize },

    #[error("There is no input data to replace {0}.")]
    UnresolvedReplacement(String),

    #[error("Auto-fill cycle detected: {}", chain.join(" -> "))]
    AutoFillCycle { chain: Vec<String> },

    #[error("Auto-fill depth {depth} exceeds the configured maximum of {max}")]
    AutoFillDepthExceeded { depth: usize, max: usize },

    #[error("Failed to convert object of value \"{value}\" to {target} for parameter \"{parameter}\".")]
    Conversion {
        value: String,
        target: &'static str,
        parameter: String,
    },

    #[error("Failed to setObject: {message}, Param Index = {index}, TargetSqlType = {sql_type}, parameterObj = {value}.")]
    Binding {
        index: usize,
        sql_type: i32,
        value: String,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Execution of {processor} failed: {source}")]
    Execution {
        processor: String,
        #[source]
        source: Box<DataExpressError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl DataExpressError {
    /// Wrap an error raised while a processor was running.
    ///
    /// Configuration and coercion errors pass through untouched so callers can
    /// still match on the offending key; everything else is wrapped once.
    pub fn into_execution(self, processor: &str) -> Self {
        if self.is_configuration() || self.is_coercion() || matches!(self, Self::Execution { .. }) {
            return self;
        }
        Self::Execution {
            processor: processor.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error beneath any `Execution` wrappers.
    pub fn root_cause(&self) -> &DataExpressError {
        let mut current = self;
        while let Self::Execution { source, .. } = current {
            current = source;
        }
        current
    }

    /// Fatal, non-retryable errors caused by how the engine was called.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedProcessorType(_)
                | Self::UnsupportedProcessorName(_)
                | Self::MissingInput { .. }
                | Self::InsufficientInputs { .. }
                | Self::UnresolvedReplacement(_)
                | Self::AutoFillCycle { .. }
                | Self::AutoFillDepthExceeded { .. }
                | Self::Configuration(_)
        )
    }

    /// Errors raised while coercing an input value to its declared SQL type.
    pub fn is_coercion(&self) -> bool {
        matches!(self, Self::Conversion { .. } | Self::Binding { .. })
    }
}

/// Result type alias for DataExpress operations
pub type Result<T> = std::result::Result<T, DataExpressError>;
