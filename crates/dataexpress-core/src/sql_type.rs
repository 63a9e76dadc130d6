//! SQL type codes
//!
//! The numeric codes are the standard ones catalog metadata reports (4 for
//! INTEGER, 1111 for OTHER and so on), so every vendor maps onto one closed
//! set of tags.

use serde::{Deserialize, Serialize};

/// A SQL data type tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    Array,
    BigInt,
    Binary,
    Bit,
    Blob,
    Boolean,
    Char,
    Clob,
    Date,
    Decimal,
    Double,
    Float,
    Integer,
    LongNVarchar,
    LongVarbinary,
    LongVarchar,
    NChar,
    NClob,
    Null,
    Numeric,
    NVarchar,
    Other,
    Real,
    RowId,
    SmallInt,
    Time,
    Timestamp,
    TinyInt,
    Varbinary,
    Varchar,
    /// No type could be resolved for this slot
    #[default]
    Unknown,
}

impl SqlType {
    /// Code used when a parameter's type is not known
    pub const UNKNOWN_CODE: i32 = -9999;

    /// Every known tag, `Unknown` excluded
    pub const ALL: [SqlType; 30] = [
        SqlType::Array,
        SqlType::BigInt,
        SqlType::Binary,
        SqlType::Bit,
        SqlType::Blob,
        SqlType::Boolean,
        SqlType::Char,
        SqlType::Clob,
        SqlType::Date,
        SqlType::Decimal,
        SqlType::Double,
        SqlType::Float,
        SqlType::Integer,
        SqlType::LongNVarchar,
        SqlType::LongVarbinary,
        SqlType::LongVarchar,
        SqlType::NChar,
        SqlType::NClob,
        SqlType::Null,
        SqlType::Numeric,
        SqlType::NVarchar,
        SqlType::Other,
        SqlType::Real,
        SqlType::RowId,
        SqlType::SmallInt,
        SqlType::Time,
        SqlType::Timestamp,
        SqlType::TinyInt,
        SqlType::Varbinary,
        SqlType::Varchar,
    ];

    /// Numeric code of this type
    pub fn code(&self) -> i32 {
        match self {
            SqlType::Array => 2003,
            SqlType::BigInt => -5,
            SqlType::Binary => -2,
            SqlType::Bit => -7,
            SqlType::Blob => 2004,
            SqlType::Boolean => 16,
            SqlType::Char => 1,
            SqlType::Clob => 2005,
            SqlType::Date => 91,
            SqlType::Decimal => 3,
            SqlType::Double => 8,
            SqlType::Float => 6,
            SqlType::Integer => 4,
            SqlType::LongNVarchar => -16,
            SqlType::LongVarbinary => -4,
            SqlType::LongVarchar => -1,
            SqlType::NChar => -15,
            SqlType::NClob => 2011,
            SqlType::Null => 0,
            SqlType::Numeric => 2,
            SqlType::NVarchar => -9,
            SqlType::Other => 1111,
            SqlType::Real => 7,
            SqlType::RowId => -8,
            SqlType::SmallInt => 5,
            SqlType::Time => 92,
            SqlType::Timestamp => 93,
            SqlType::TinyInt => -6,
            SqlType::Varbinary => -3,
            SqlType::Varchar => 12,
            SqlType::Unknown => Self::UNKNOWN_CODE,
        }
    }

    /// Look up a type by its numeric code
    pub fn from_code(code: i32) -> SqlType {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.code() == code)
            .unwrap_or(SqlType::Unknown)
    }

    /// Canonical upper-case name
    pub fn name(&self) -> &'static str {
        match self {
            SqlType::Array => "ARRAY",
            SqlType::BigInt => "BIGINT",
            SqlType::Binary => "BINARY",
            SqlType::Bit => "BIT",
            SqlType::Blob => "BLOB",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Char => "CHAR",
            SqlType::Clob => "CLOB",
            SqlType::Date => "DATE",
            SqlType::Decimal => "DECIMAL",
            SqlType::Double => "DOUBLE",
            SqlType::Float => "FLOAT",
            SqlType::Integer => "INTEGER",
            SqlType::LongNVarchar => "LONGNVARCHAR",
            SqlType::LongVarbinary => "LONGVARBINARY",
            SqlType::LongVarchar => "LONGVARCHAR",
            SqlType::NChar => "NCHAR",
            SqlType::NClob => "NCLOB",
            SqlType::Null => "NULL",
            SqlType::Numeric => "NUMERIC",
            SqlType::NVarchar => "NVARCHAR",
            SqlType::Other => "OTHER",
            SqlType::Real => "REAL",
            SqlType::RowId => "ROWID",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Time => "TIME",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::TinyInt => "TINYINT",
            SqlType::Varbinary => "VARBINARY",
            SqlType::Varchar => "VARCHAR",
            SqlType::Unknown => "UNKNOWN",
        }
    }

    /// Resolve a declared type name such as `INTEGER`, `varchar(40)` or
    /// `TIMESTAMP WITH TIME ZONE`.
    ///
    /// Only the first word is considered and any length/precision suffix is
    /// dropped. Common vendor spellings map onto the closest tag.
    pub fn from_type_name(type_name: &str) -> SqlType {
        let upper = type_name.trim().to_ascii_uppercase();
        let first = upper.split_whitespace().next().unwrap_or("");
        let base = first.split('(').next().unwrap_or("");

        if let Some(t) = Self::ALL.iter().copied().find(|t| t.name() == base) {
            return t;
        }

        match base {
            "INT" | "INT4" | "MEDIUMINT" | "SERIAL" => SqlType::Integer,
            "INT8" | "BIGSERIAL" | "LONG" => SqlType::BigInt,
            "INT2" => SqlType::SmallInt,
            "BOOL" => SqlType::Boolean,
            "TEXT" | "STRING" | "VARCHAR2" | "CHARACTER" => SqlType::Varchar,
            "NVARCHAR2" => SqlType::NVarchar,
            "NUMBER" | "MONEY" => SqlType::Numeric,
            "DEC" => SqlType::Decimal,
            "FLOAT8" | "DOUBLE_PRECISION" => SqlType::Double,
            "FLOAT4" => SqlType::Real,
            "DATETIME" | "TIMESTAMPTZ" | "DATETIME2" => SqlType::Timestamp,
            "BYTEA" | "RAW" => SqlType::Varbinary,
            "LONGBLOB" | "MEDIUMBLOB" | "TINYBLOB" => SqlType::Blob,
            "LONGTEXT" | "MEDIUMTEXT" | "TINYTEXT" => SqlType::LongVarchar,
            "REFCURSOR" | "CURSOR" | "REF" => SqlType::Other,
            _ => SqlType::Unknown,
        }
    }

    /// Character types whose blank values are bound as-is rather than NULL
    pub fn keeps_blank(&self) -> bool {
        matches!(self, SqlType::Char | SqlType::Varchar | SqlType::LongVarchar)
    }

    /// Date and time types
    pub fn is_temporal(&self) -> bool {
        matches!(self, SqlType::Date | SqlType::Time | SqlType::Timestamp)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SqlType::Unknown)
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_lookup() {
        for t in SqlType::ALL {
            assert_eq!(SqlType::from_code(t.code()), t);
        }
        assert_eq!(SqlType::from_code(-9999), SqlType::Unknown);
        assert_eq!(SqlType::from_code(424242), SqlType::Unknown);
    }

    #[test]
    fn test_type_names_use_first_word() {
        assert_eq!(SqlType::from_type_name("integer"), SqlType::Integer);
        assert_eq!(SqlType::from_type_name("VARCHAR(40)"), SqlType::Varchar);
        assert_eq!(
            SqlType::from_type_name("TIMESTAMP WITH TIME ZONE"),
            SqlType::Timestamp
        );
        assert_eq!(SqlType::from_type_name("text"), SqlType::Varchar);
        assert_eq!(SqlType::from_type_name("geometry"), SqlType::Unknown);
    }

    #[test]
    fn test_blank_handling_is_limited_to_char_family() {
        assert!(SqlType::Varchar.keeps_blank());
        assert!(SqlType::LongVarchar.keeps_blank());
        assert!(!SqlType::Integer.keeps_blank());
        assert!(!SqlType::Unknown.keeps_blank());
    }
}
