//! Statement text rewrites applied before parsing
//!
//! - auto-fill: `?@key` placeholders take their value from another named
//!   statement, run first with the same inputs
//! - auto-replace: `#key#` tokens are substituted textually from the inputs
//! - pagination: whether a SELECT should be wrapped by the vendor adapter

use std::ops::Range;
use std::sync::LazyLock;

use dataexpress_core::inputs::{self, Inputs, NO_ROW_LIMIT};
use dataexpress_core::{DataExpressError, Result, StatementKind, Value};
use regex::Regex;

use crate::parameters::{mask_literals, split_tokens};

/// Delimiters used when scanning for auto-fill placeholders
const AUTOFILL_DELIMITERS: &str = " ,><=(){}";

static REPLACEMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([^#\s,()]+)#").expect("valid regex"));

/// Named statements referenced by `?@key` placeholders, in first-use order.
///
/// The key drops the `?@` prefix and any `:TYPE` suffix. The value is stored
/// back into the inputs under `@key`, the name the parser gives the
/// placeholder.
///
/// ```
/// use dataexpress_query::rewrite::autofill_keys;
///
/// let sql = "SELECT * FROM posts WHERE author_id = ?@current_author AND id > ?@current_author";
/// assert_eq!(autofill_keys(sql), vec!["current_author".to_string()]);
/// ```
pub fn autofill_keys(sql: &str) -> Vec<String> {
    let masked = mask_literals(sql);
    let mut keys: Vec<String> = Vec::new();
    for token in split_tokens(&masked, AUTOFILL_DELIMITERS) {
        let Some(body) = token.strip_prefix("?@") else {
            continue;
        };
        let key = body.split(':').next().unwrap_or(body);
        if key.is_empty() || keys.iter().any(|k| k == key) {
            continue;
        }
        keys.push(key.to_string());
    }
    keys
}

/// Input key under which an auto-filled value is stored
pub fn autofill_input_key(key: &str) -> String {
    format!("@{}", key)
}

/// `#key#` tokens outside string literals and comments, as the byte range
/// of the whole token and the key it names
fn replacement_tokens(sql: &str) -> Vec<(Range<usize>, &str)> {
    if !sql.contains('#') {
        return Vec::new();
    }
    let masked = mask_literals(sql);
    REPLACEMENT_REGEX
        .captures_iter(&masked)
        .filter_map(|captures| {
            let (whole, key) = (captures.get(0)?, captures.get(1)?);
            Some((whole.range(), &sql[key.range()]))
        })
        .collect()
}

fn lookup<'a>(sql: &str, token: &Range<usize>, key: &str, inputs: &'a Inputs) -> Result<&'a Value> {
    inputs
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| DataExpressError::UnresolvedReplacement(sql[token.clone()].to_string()))
}

/// Fail on the first `#key#` token with no usable input, without rewriting
/// the text. `#@key#` tokens are skipped since auto-fill supplies them.
pub fn check_replacements(sql: &str, inputs: &Inputs) -> Result<()> {
    for (token, key) in replacement_tokens(sql) {
        if key.starts_with('@') {
            continue;
        }
        lookup(sql, &token, key, inputs)?;
    }
    Ok(())
}

/// Substitute every `#key#` token with the text form of `inputs[key]`.
///
/// Tokens inside string literals and comments are left alone. A missing or
/// NULL value is an error naming the token.
pub fn auto_replace(sql: &str, inputs: &Inputs) -> Result<String> {
    let tokens = replacement_tokens(sql);
    if tokens.is_empty() {
        return Ok(sql.to_string());
    }

    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for (token, key) in tokens {
        let value = lookup(sql, &token, key, inputs)?;
        out.push_str(&sql[last..token.start]);
        out.push_str(&value.to_string());
        last = token.end;
    }
    out.push_str(&sql[last..]);

    tracing::trace!(original = sql, replaced = %out, "auto-replaced statement text");
    Ok(out)
}

/// Whether a statement should be run through the vendor's pagination
/// rewrite.
///
/// Only SELECTs are paginated. An explicit `SCOOTER.USE_PAGINATION` decides;
/// otherwise a positive `SCOOTER.RECORDS_LIMIT` turns pagination on.
pub fn should_paginate(kind: StatementKind, inputs: &Inputs) -> bool {
    if kind != StatementKind::Select {
        return false;
    }
    if inputs.contains_key(inputs::USE_PAGINATION) {
        return inputs::bool_value(inputs, inputs::USE_PAGINATION).unwrap_or(false);
    }
    let limit = inputs::int_value(inputs, inputs::RECORDS_LIMIT).unwrap_or(NO_ROW_LIMIT);
    limit != NO_ROW_LIMIT && limit > 0
}
