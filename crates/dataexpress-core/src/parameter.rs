//! Bound parameter model

use crate::SqlType;
use serde::{Deserialize, Serialize};

/// Direction of a parameter in a statement or call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterMode {
    In,
    InOut,
    Out,
    Return,
}

impl ParameterMode {
    /// Mode codes as reported by procedure column metadata
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::In),
            2 => Some(Self::InOut),
            4 => Some(Self::Out),
            5 => Some(Self::Return),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::In => 1,
            Self::InOut => 2,
            Self::Out => 4,
            Self::Return => 5,
        }
    }

    /// Parse a mode name such as `IN`, `IN/OUT`, `INOUT` or `RETURN`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "IN" => Some(Self::In),
            "INOUT" | "IN/OUT" | "IN_OUT" => Some(Self::InOut),
            "OUT" => Some(Self::Out),
            "RETURN" => Some(Self::Return),
            _ => None,
        }
    }

    /// Values flow from the caller into the call
    pub fn is_input(&self) -> bool {
        matches!(self, Self::In | Self::InOut)
    }

    /// Values flow from the call back to the caller
    pub fn is_output(&self) -> bool {
        matches!(self, Self::InOut | Self::Out | Self::Return)
    }
}

impl std::fmt::Display for ParameterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::In => "IN",
            Self::InOut => "INOUT",
            Self::Out => "OUT",
            Self::Return => "RETURN",
        };
        f.write_str(s)
    }
}

/// One bound slot in a statement or call
///
/// Parameters are built by the parser (or by procedure discovery) and never
/// change once their descriptor publishes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Key used to look up the input value
    pub name: String,
    /// 1-based position in the executable text
    pub index: usize,
    pub mode: ParameterMode,
    pub sql_type: SqlType,
    /// Vendor type name, when known
    pub type_name: Option<String>,
    /// Native class name hint used during extraction
    pub native_class: Option<String>,
    pub is_cursor: bool,
    /// Table the value is compared against, if the parser could tell
    pub table: Option<String>,
    /// Column the value is compared against, if the parser could tell
    pub column: Option<String>,
    /// The placeholder feeds a `COUNT(..)` expression
    pub used_by_count: bool,
}

impl Parameter {
    /// A new IN parameter of unknown type
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            mode: ParameterMode::In,
            sql_type: SqlType::Unknown,
            type_name: None,
            native_class: None,
            is_cursor: false,
            table: None,
            column: None,
            used_by_count: false,
        }
    }

    pub fn with_mode(mut self, mode: ParameterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_sql_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type = sql_type;
        self
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_column(mut self, table: Option<String>, column: impl Into<String>) -> Self {
        self.table = table;
        self.column = Some(column.into());
        self
    }

    pub fn with_cursor(mut self, is_cursor: bool) -> Self {
        self.is_cursor = is_cursor;
        self
    }

    pub fn is_input(&self) -> bool {
        self.mode.is_input()
    }

    pub fn is_output(&self) -> bool {
        self.mode.is_output()
    }
}
