//! Placeholder tokens
//!
//! A placeholder starts with `?` and runs until one of the stopper characters
//! or whitespace:
//!
//! - `?` - positional, named by its 1-based index
//! - `?name` - named
//! - `?name:TYPE` - named with an inline SQL type
//! - `?table.column` - named after the column used for type lookup
//!
//! Placeholders inside string literals and comments are ignored.

use dataexpress_core::SqlType;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Characters that end a placeholder token
pub const STOPPERS: &str = " ,|><=(){}+-*/";

// Regex to identify string literals and comments that should be skipped
static STRING_LITERAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'(?:[^'\\]|\\.|'')*'|--[^\n]*|/\*[\s\S]*?\*/").expect("valid regex")
});

fn literal_ranges(sql: &str) -> Vec<Range<usize>> {
    STRING_LITERAL_REGEX
        .find_iter(sql)
        .map(|m| m.range())
        .collect()
}

/// Mask string literals and comments without changing byte offsets.
///
/// A string literal becomes `'___'` so it still reads as one token; a comment
/// becomes whitespace.
pub fn mask_literals(sql: &str) -> String {
    let mut masked = String::with_capacity(sql.len());
    let mut last = 0;
    for m in STRING_LITERAL_REGEX.find_iter(sql) {
        masked.push_str(&sql[last..m.start()]);
        let len = m.len();
        if m.as_str().starts_with('\'') && len >= 2 {
            masked.push('\'');
            masked.push_str(&"_".repeat(len - 2));
            masked.push('\'');
        } else {
            masked.push_str(&" ".repeat(len));
        }
        last = m.end();
    }
    masked.push_str(&sql[last..]);
    masked
}

/// Whether the text has at least one placeholder outside literals
pub fn has_placeholders(sql: &str) -> bool {
    mask_literals(sql).contains('?')
}

/// Reduce every placeholder token to a bare `?`.
///
/// ```
/// use dataexpress_query::parameters::to_executable;
///
/// assert_eq!(
///     to_executable("SELECT * FROM posts WHERE id = ?id:INTEGER AND flag = 'a?b'"),
///     "SELECT * FROM posts WHERE id = ? AND flag = 'a?b'"
/// );
/// ```
pub fn to_executable(sql: &str) -> String {
    if !sql.contains('?') {
        return sql.to_string();
    }

    let literals = literal_ranges(sql);
    let mut out = String::with_capacity(sql.len());
    let mut skipping = false;

    for (i, c) in sql.char_indices() {
        if literals.iter().any(|r| r.contains(&i)) {
            skipping = false;
            out.push(c);
            continue;
        }
        if c == '?' {
            skipping = true;
            out.push(c);
        } else if c.is_whitespace() || STOPPERS.contains(c) {
            skipping = false;
            out.push(c);
        } else if !skipping {
            out.push(c);
        }
    }
    out
}

/// Split text on whitespace and the given delimiter characters, dropping
/// empty pieces.
pub fn split_tokens<'a>(text: &'a str, delimiters: &str) -> Vec<&'a str> {
    text.split(|c: char| c.is_whitespace() || delimiters.contains(c))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parameter name for a placeholder token at the given 1-based position
pub fn placeholder_name(position: usize, token: &str) -> String {
    let Some(body) = token.strip_prefix('?') else {
        return String::new();
    };
    if body.is_empty() {
        return position.to_string();
    }
    match body.find(':') {
        Some(colon) => body[..colon].to_string(),
        None => body.to_string(),
    }
}

/// SQL type declared inline with `?name:TYPE`, `Unknown` when absent or
/// unrecognized
pub fn inline_type(token: &str) -> SqlType {
    match token.find(':') {
        Some(colon) if token.len() > 1 => {
            let type_name = &token[colon + 1..];
            let sql_type = SqlType::from_type_name(type_name);
            if sql_type.is_unknown() {
                tracing::warn!(token, type_name, "unrecognized inline sql type");
            }
            sql_type
        }
        _ => SqlType::Unknown,
    }
}

/// Table and column named by a dotted placeholder such as `?posts.id:INTEGER`
pub fn dotted_column(token: &str) -> Option<(String, String)> {
    let body = token.strip_prefix('?')?;
    let name = match body.find(':') {
        Some(colon) => &body[..colon],
        None => body,
    };
    let (table, column) = name.split_once('.')?;
    if table.is_empty() || column.is_empty() {
        return None;
    }
    Some((table.to_string(), column.to_string()))
}
