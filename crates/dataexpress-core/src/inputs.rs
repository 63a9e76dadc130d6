//! Input maps and reserved control keys

use crate::Value;
use std::collections::HashMap;

/// Caller-supplied inputs keyed by parameter name
pub type Inputs = HashMap<String, Value>;

pub const DATABASE_CONNECTION_NAME: &str = "SCOOTER.DATABASE_CONNECTION_NAME";
pub const MAX_ROW_INDEX: &str = "SCOOTER.MAX_ROW_INDEX";
pub const MIN_ROW_INDEX: &str = "SCOOTER.MIN_ROW_INDEX";
pub const RECORDS_OFFSET: &str = "SCOOTER.RECORDS_OFFSET";
pub const RECORDS_LIMIT: &str = "SCOOTER.RECORDS_LIMIT";
pub const RECORDS_FIXED: &str = "SCOOTER.RECORDS_FIXED";
pub const USE_PAGINATION: &str = "SCOOTER.USE_PAGINATION";

/// Input key carrying an explicit ORDER BY for row-number pagination
pub const ORDER_BY: &str = "order_by";

/// Row limit meaning "no limit"
pub const NO_ROW_LIMIT: i64 = -1;
pub const DEFAULT_PAGINATION_LIMIT: i64 = 10;

/// Whether `key` is one of the reserved `SCOOTER.` control keys
pub fn is_reserved(key: &str) -> bool {
    key.to_ascii_uppercase().starts_with("SCOOTER.")
}

/// Read an integer input, accepting numeric values and numeric text
pub fn int_value(inputs: &Inputs, key: &str) -> Option<i64> {
    inputs.get(key).and_then(Value::as_i64)
}

/// Read a flag input. Text is true for `true`, `t`, `y` or `yes`.
pub fn bool_value(inputs: &Inputs, key: &str) -> Option<bool> {
    match inputs.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "t" | "y" | "yes"
        )),
        v if v.is_numeric() => v.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Sorted key list used in error messages
pub fn key_list(inputs: &Inputs) -> Vec<String> {
    let mut keys: Vec<String> = inputs.keys().cloned().collect();
    keys.sort();
    keys
}
