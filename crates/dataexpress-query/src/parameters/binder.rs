//! Type binder
//!
//! Coerces an untyped input value to a parameter's SQL type. Dispatch goes
//! through a table from type tag to coercion function; types without an entry
//! are handed to the driver with their declared type.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dataexpress_core::{BindValue, DataExpressError, Parameter, Result, SqlType, Value, VendorAdapter};
use regex::Regex;

type BindFn = fn(&Parameter, &Value) -> Result<BindValue>;

static BINDERS: LazyLock<HashMap<SqlType, BindFn>> = LazyLock::new(|| {
    let mut table: HashMap<SqlType, BindFn> = HashMap::new();
    table.insert(SqlType::Boolean, bind_boolean);
    table.insert(SqlType::Bit, bind_int);
    table.insert(SqlType::TinyInt, bind_int);
    table.insert(SqlType::SmallInt, bind_int);
    table.insert(SqlType::Integer, bind_int);
    table.insert(SqlType::BigInt, bind_long);
    table.insert(SqlType::Float, bind_float);
    table.insert(SqlType::Double, bind_double);
    table.insert(SqlType::Real, bind_double);
    table.insert(SqlType::Decimal, bind_decimal);
    table.insert(SqlType::Binary, bind_binary);
    table.insert(SqlType::Varbinary, bind_binary);
    table.insert(SqlType::LongVarbinary, bind_binary);
    table.insert(SqlType::Blob, bind_binary);
    table.insert(SqlType::Clob, bind_clob);
    table.insert(SqlType::Date, bind_date);
    table.insert(SqlType::Time, bind_time);
    table.insert(SqlType::Timestamp, bind_timestamp);
    table
});

static DECIMAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid regex")
});

/// Coerce `value` for an IN slot.
///
/// NULL and blank values bind as SQL NULL of the declared type (`Other` when
/// unknown), except for CHAR/VARCHAR/LONGVARCHAR slots which keep blanks. A
/// vendor adapter then gets first refusal before the type table is consulted.
pub fn bind_value(
    parameter: &Parameter,
    value: &Value,
    vendor: Option<&dyn VendorAdapter>,
) -> Result<BindValue> {
    let sql_type = parameter.sql_type;

    if value.is_null() || (value.is_blank() && !sql_type.keeps_blank()) {
        let null_type = if sql_type.is_unknown() { SqlType::Other } else { sql_type };
        return Ok(BindValue::Null(null_type));
    }

    if let Some(bound) = vendor.and_then(|v| v.try_bind_vendor_specific(parameter, value)) {
        tracing::trace!(index = parameter.index, "vendor adapter bound parameter");
        return Ok(bound);
    }

    if sql_type.is_unknown() {
        return Ok(BindValue::Untyped(value.clone()));
    }

    match BINDERS.get(&sql_type) {
        Some(bind) => bind(parameter, value),
        None => Ok(BindValue::Typed {
            value: value.clone(),
            sql_type,
        }),
    }
}

fn typed(value: Value, parameter: &Parameter) -> BindValue {
    BindValue::Typed {
        value,
        sql_type: parameter.sql_type,
    }
}

fn conversion_error(value: &Value, target: &'static str, parameter: &Parameter) -> DataExpressError {
    DataExpressError::Conversion {
        value: value.to_string(),
        target,
        parameter: parameter.name.clone(),
    }
}

fn binding_error(parameter: &Parameter, value: &Value, message: String) -> DataExpressError {
    DataExpressError::Binding {
        index: parameter.index,
        sql_type: parameter.sql_type.code(),
        value: value.to_string(),
        message,
    }
}

fn bind_boolean(parameter: &Parameter, value: &Value) -> Result<BindValue> {
    let flag = match value {
        Value::Bool(b) => *b,
        // Any text other than "0" is true.
        Value::String(s) => s.trim() != "0",
        v if v.is_numeric() => v.as_f64().is_some_and(|n| n != 0.0),
        other => {
            return Err(binding_error(
                parameter,
                other,
                format!(
                    "Cannot convert from {} to BOOLEAN for object {} at index {}",
                    other.kind(),
                    other,
                    parameter.index
                ),
            ));
        }
    };
    Ok(typed(Value::Bool(flag), parameter))
}

fn bind_int(parameter: &Parameter, value: &Value) -> Result<BindValue> {
    value
        .to_string()
        .trim()
        .parse::<i32>()
        .map(|n| typed(Value::Int32(n), parameter))
        .map_err(|_| conversion_error(value, "Integer", parameter))
}

fn bind_long(parameter: &Parameter, value: &Value) -> Result<BindValue> {
    value
        .to_string()
        .trim()
        .parse::<i64>()
        .map(|n| typed(Value::Int64(n), parameter))
        .map_err(|_| conversion_error(value, "Long", parameter))
}

fn bind_float(parameter: &Parameter, value: &Value) -> Result<BindValue> {
    value
        .to_string()
        .trim()
        .parse::<f32>()
        .map(|n| typed(Value::Float32(n), parameter))
        .map_err(|_| conversion_error(value, "Float", parameter))
}

fn bind_double(parameter: &Parameter, value: &Value) -> Result<BindValue> {
    value
        .to_string()
        .trim()
        .parse::<f64>()
        .map(|n| typed(Value::Float64(n), parameter))
        .map_err(|_| conversion_error(value, "Double", parameter))
}

fn bind_decimal(parameter: &Parameter, value: &Value) -> Result<BindValue> {
    let text = value.to_string();
    let text = text.trim();
    if DECIMAL_REGEX.is_match(text) {
        Ok(typed(Value::Decimal(text.to_string()), parameter))
    } else {
        Err(conversion_error(value, "BigDecimal", parameter))
    }
}

fn bind_binary(parameter: &Parameter, value: &Value) -> Result<BindValue> {
    let bytes = match value {
        Value::Bytes(b) => b.clone(),
        Value::File(path) => std::fs::read(path).map_err(|e| {
            binding_error(parameter, value, format!("cannot read {}: {}", path.display(), e))
        })?,
        Value::String(s) => s.as_bytes().to_vec(),
        other => other.to_string().into_bytes(),
    };
    Ok(typed(Value::Bytes(bytes), parameter))
}

fn bind_clob(parameter: &Parameter, value: &Value) -> Result<BindValue> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        other => other.to_string(),
    };
    Ok(typed(Value::String(text), parameter))
}

fn bind_date(parameter: &Parameter, value: &Value) -> Result<BindValue> {
    let date = match value {
        Value::Date(d) => *d,
        Value::DateTime(dt) => dt.date(),
        Value::DateTimeUtc(dt) => dt.date_naive(),
        other => parse_date_time(&other.to_string())
            .map(|dt| dt.date())
            .ok_or_else(|| unparseable(parameter, other))?,
    };
    Ok(typed(Value::Date(date), parameter))
}

fn bind_time(parameter: &Parameter, value: &Value) -> Result<BindValue> {
    let time = match value {
        Value::Time(t) => *t,
        Value::DateTime(dt) => dt.time(),
        Value::DateTimeUtc(dt) => dt.naive_utc().time(),
        other => parse_date_time(&other.to_string())
            .map(|dt| dt.time())
            .ok_or_else(|| unparseable(parameter, other))?,
    };
    Ok(typed(Value::Time(time), parameter))
}

fn bind_timestamp(parameter: &Parameter, value: &Value) -> Result<BindValue> {
    let timestamp = match value {
        Value::DateTime(dt) => *dt,
        Value::DateTimeUtc(dt) => dt.naive_utc(),
        Value::Date(d) => d.and_time(NaiveTime::MIN),
        other => parse_date_time(&other.to_string()).ok_or_else(|| unparseable(parameter, other))?,
    };
    Ok(typed(Value::DateTime(timestamp), parameter))
}

fn unparseable(parameter: &Parameter, value: &Value) -> DataExpressError {
    binding_error(parameter, value, format!("Unparseable date: \"{}\"", value))
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%y-%m-%d", "%m/%d/%y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Parse date/time text in the accepted layouts: `yyyy-MM-dd`,
/// `MM/dd/yyyy` (either with an optional `HH:mm[:ss[.SSS]]` time) or a
/// bare time, which lands on 1970-01-01.
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .or_else(|| {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
            TIME_FORMATS
                .iter()
                .find_map(|f| NaiveTime::parse_from_str(text, f).ok())
                .map(|t| epoch.and_time(t))
        })
}
