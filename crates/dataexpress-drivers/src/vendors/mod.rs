//! Built-in vendor adapters
//!
//! Each adapter rewrites a SELECT into its vendor's paginated form and may
//! override binding or extraction for native types. Statement text helpers
//! shared by the row-number based adapters live here.

mod generic;
mod h2;
mod hsqldb;
mod mysql;
mod oracle;
mod postgres;
mod sqlserver;

pub use generic::GenericAdapter;
pub use h2::H2Adapter;
pub use hsqldb::HsqldbAdapter;
pub use mysql::MySqlAdapter;
pub use oracle::OracleAdapter;
pub use postgres::PostgresAdapter;
pub use sqlserver::SqlServerAdapter;

use dataexpress_core::inputs::{self, Inputs};
use dataexpress_core::{DataExpressError, Result, StatementKind};

/// Reject anything but a SELECT for adapters whose pagination syntax only
/// applies to queries.
pub(crate) fn require_select(vendor: &str, sql: &str) -> Result<()> {
    if StatementKind::of(sql) == StatementKind::Select {
        return Ok(());
    }
    Err(DataExpressError::NotSupported(format!(
        "{} pagination only applies to SELECT statements: {}",
        vendor, sql
    )))
}

/// The ORDER BY expression a row-number wrapper should sort by.
///
/// Taken from the `order_by` input when present, then from the statement's
/// own ORDER BY (up to any `FOR UPDATE`), then from its select list. A
/// select list containing `*` cannot be used.
pub fn order_by_clause(sql: &str, inputs: &Inputs) -> Result<String> {
    if let Some(requested) = inputs
        .get(inputs::ORDER_BY)
        .filter(|v| !v.is_blank())
        .map(|v| v.to_string())
    {
        let trimmed = requested.trim();
        let clause = match find_keyword(trimmed, "ORDER BY") {
            Some(0) => trimmed["ORDER BY".len()..].trim(),
            _ => trimmed,
        };
        return Ok(clause.to_string());
    }

    if let Some(at) = find_keyword(sql, "ORDER BY") {
        let rest = &sql[at + "ORDER BY".len()..];
        let rest = match find_keyword(rest, "FOR UPDATE") {
            Some(end) => &rest[..end],
            None => rest,
        };
        let clause = rest.trim().trim_end_matches(';').trim();
        if !clause.is_empty() {
            return Ok(clause.to_string());
        }
    }

    let select_list = select_list(sql).unwrap_or("");
    if select_list.is_empty() || select_list.contains('*') {
        return Err(DataExpressError::Configuration(format!(
            "Failed to obtain order-by clause related to sql query '{}'",
            sql
        )));
    }
    Ok(select_list.to_string())
}

/// Everything after the leading `SELECT` and before any ORDER BY.
pub fn remain_sql(sql: &str) -> Result<String> {
    let trimmed = sql.trim();
    if StatementKind::of(trimmed) != StatementKind::Select {
        return Err(DataExpressError::Configuration(format!(
            "Expected a SELECT statement: {}",
            sql
        )));
    }
    let body = &trimmed["SELECT".len()..];
    let body = match find_keyword(body, "ORDER BY") {
        Some(end) => &body[..end],
        None => body,
    };
    Ok(body.trim().to_string())
}

/// Columns between `SELECT [DISTINCT | TOP n]` and `FROM`
fn select_list(sql: &str) -> Option<&str> {
    let trimmed = sql.trim();
    if StatementKind::of(trimmed) != StatementKind::Select {
        return None;
    }
    let mut rest = trimmed["SELECT".len()..].trim_start();
    if starts_with_keyword(rest, "DISTINCT") {
        rest = rest["DISTINCT".len()..].trim_start();
    } else if starts_with_keyword(rest, "TOP") {
        rest = rest["TOP".len()..].trim_start();
        let count_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[count_end..].trim_start();
    }
    let end = find_keyword(rest, "FROM").unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.len() >= keyword.len()
        && text.as_bytes()[..keyword.len()].eq_ignore_ascii_case(keyword.as_bytes())
}

/// Byte offset of a keyword, matched case-insensitively
fn find_keyword(text: &str, keyword: &str) -> Option<usize> {
    text.to_ascii_uppercase().find(keyword)
}

#[cfg(test)]
mod tests;
