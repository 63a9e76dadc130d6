//! Statement parser
//!
//! Turns statement text into its ordered parameter list. Each placeholder gets
//! a name and, where it can be worked out, the table and column it is compared
//! against; the column's SQL type is then read from the catalog. Types that
//! cannot be resolved stay `Unknown` and bind through the generic path.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dataexpress_core::{
    ColumnInfo, Connection, DataExpressError, Parameter, Result, StatementKind,
};

use super::placeholders::{
    dotted_column, inline_type, mask_literals, placeholder_name, split_tokens,
};

/// Column metadata source used for type inference
pub trait TableCatalog {
    fn columns_of(&self, table: &str) -> Result<Arc<[ColumnInfo]>>;
}

/// Catalog that asks the connection on every lookup
pub struct DirectCatalog<'a>(pub &'a dyn Connection);

impl TableCatalog for DirectCatalog<'_> {
    fn columns_of(&self, table: &str) -> Result<Arc<[ColumnInfo]>> {
        Ok(self.0.table_columns(table)?.into())
    }
}

/// Delimiters for the placeholder scan. `(`, `)` and `,` are kept as tokens
/// for alias resolution and dropped afterwards.
const ALIAS_DELIMITERS: &str = "|><={}+-*/";
/// Delimiters for INSERT column lists
const INSERT_DELIMITERS: &str = " ,()\"";

#[derive(Debug, Clone)]
struct Token {
    text: String,
    upper: String,
}

impl Token {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            upper: text.to_ascii_uppercase(),
        }
    }

    fn is(&self, keyword: &str) -> bool {
        self.upper == keyword
    }
}

/// Parses statement text against a catalog
pub struct StatementParser<'a> {
    catalog: &'a dyn TableCatalog,
}

impl<'a> StatementParser<'a> {
    pub fn new(catalog: &'a dyn TableCatalog) -> Self {
        Self { catalog }
    }

    /// Build the parameter list for `sql`.
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(60).collect::<String>()))]
    pub fn parse(&self, sql: &str) -> Result<Vec<Parameter>> {
        let masked = mask_literals(sql);
        if !masked.contains('?') {
            return Ok(Vec::new());
        }

        let mut parameters = if StatementKind::of(&masked) == StatementKind::Insert
            && !masked.to_ascii_uppercase().contains("SELECT")
        {
            self.parse_insert(&masked)?
        } else {
            self.parse_general(&masked)
        };

        self.lookup_types(&mut parameters);
        Ok(parameters)
    }

    fn parse_insert(&self, sql: &str) -> Result<Vec<Parameter>> {
        let tokens: Vec<Token> = split_tokens(sql, INSERT_DELIMITERS)
            .into_iter()
            .map(Token::new)
            .collect();

        if tokens.len() <= 3 {
            return Err(DataExpressError::Parse(format!(
                "Cannot parse sql statement: [{}]",
                sql
            )));
        }

        let table = tokens[2].text.clone();

        // INSERT INTO t VALUES (..) names no columns; bind positionally.
        if tokens[3].is("VALUES") {
            tracing::debug!(table = %table, "insert without column list, types left unresolved");
            return Ok(positional_only(&tokens[4..], &table));
        }

        let values_at = tokens
            .iter()
            .position(|t| t.is("VALUES"))
            .ok_or_else(|| {
                DataExpressError::Parse(format!("Cannot parse sql statement: [{}]", sql))
            })?;
        let columns = &tokens[3..values_at];
        let values = &tokens[values_at + 1..];

        if columns.len() != values.len() {
            return Err(DataExpressError::Parse(
                "The number of columns does not match the number of values.".to_string(),
            ));
        }

        let mut parameters = Vec::new();
        for (column, value) in columns.iter().zip(values) {
            if !value.text.starts_with('?') {
                continue;
            }
            let index = parameters.len() + 1;
            let parameter = Parameter::new(placeholder_name(index, &value.text), index)
                .with_sql_type(inline_type(&value.text))
                .with_column(Some(table.clone()), column.text.clone());
            parameters.push(parameter);
        }
        Ok(parameters)
    }

    fn parse_general(&self, sql: &str) -> Vec<Parameter> {
        let tokens = resolve_aliases(sql);
        let mut parameters = Vec::new();

        for (j, token) in tokens.iter().enumerate() {
            if !token.text.starts_with('?') {
                continue;
            }
            let index = parameters.len() + 1;
            let mut parameter = Parameter::new(placeholder_name(index, &token.text), index);

            let declared = inline_type(&token.text);
            if !declared.is_unknown() {
                parameter.sql_type = declared;
                parameters.push(parameter);
                continue;
            }

            if let Some((table, column)) = dotted_column(&token.text) {
                parameters.push(parameter.with_column(Some(table), column));
                continue;
            }

            let Some(column_token) = column_token_for(&tokens, j, &mut parameter) else {
                tracing::warn!(
                    index,
                    "failed to detect column name for placeholder, declare an inline type instead"
                );
                parameters.push(parameter);
                continue;
            };

            let (table, column) = match column_token.split_once('.') {
                Some((table, column)) => (Some(table.to_string()), column.to_string()),
                None => (self.table_for(&tokens, j, &column_token), column_token.clone()),
            };
            if table.is_some() {
                parameter = parameter.with_column(table, column);
            }
            parameters.push(parameter);
        }

        parameters
    }

    /// Table whose column a placeholder at `position` refers to, decided by
    /// the statement's leading verb.
    fn table_for(&self, tokens: &[Token], position: usize, column: &str) -> Option<String> {
        let text_at = |i: usize| tokens.get(i).map(|t| t.text.clone());

        for (i, token) in tokens.iter().enumerate().take(position + 1) {
            match token.upper.as_str() {
                "INSERT" => return text_at(i + 2),
                "UPDATE" => return text_at(i + 1),
                "DELETE" => {
                    let from = tokens.get(i + 1).is_some_and(|t| t.is("FROM"));
                    return text_at(if from { i + 2 } else { i + 1 });
                }
                "SELECT" => return self.select_table(tokens, position, column),
                _ => {}
            }
        }
        None
    }

    fn select_table(&self, tokens: &[Token], position: usize, column: &str) -> Option<String> {
        let mut from = None;
        let mut where_at = None;
        for i in (0..=position).rev() {
            if tokens[i].is("WHERE") {
                where_at = Some(i);
            } else if tokens[i].is("FROM") {
                from = Some(i);
                break;
            }
        }

        match (from, where_at) {
            (Some(from), Some(where_at)) if where_at - from == 2 => Some(tokens[from + 1].text.clone()),
            (Some(from), Some(where_at)) => tokens[from + 1..where_at]
                .iter()
                .find(|t| self.column_in_table(column, &t.text))
                .map(|t| t.text.clone()),
            (Some(from), None) if position >= from + 3 => {
                let grouped = (tokens[from + 2].is("ORDER") || tokens[from + 2].is("GROUP"))
                    && tokens[from + 3].is("BY");
                let table = &tokens[from + 1].text;
                (grouped && self.column_in_table(column, table)).then(|| table.clone())
            }
            _ => None,
        }
    }

    fn column_in_table(&self, column: &str, table: &str) -> bool {
        match self.catalog.columns_of(table) {
            Ok(columns) => columns.iter().any(|c| c.name.eq_ignore_ascii_case(column)),
            Err(e) => {
                tracing::warn!(table, column, error = %e, "column check failed");
                false
            }
        }
    }

    /// Fill in SQL types from the catalog. Lookup failures leave the type
    /// unknown.
    fn lookup_types(&self, parameters: &mut [Parameter]) {
        for parameter in parameters.iter_mut() {
            if parameter.used_by_count || !parameter.sql_type.is_unknown() {
                continue;
            }
            let (Some(table), Some(column)) = (&parameter.table, &parameter.column) else {
                tracing::debug!(
                    index = parameter.index,
                    name = %parameter.name,
                    "no table/column for parameter, type left unresolved"
                );
                continue;
            };

            let columns = match self.catalog.columns_of(table) {
                Ok(columns) => columns,
                Err(e) => {
                    tracing::warn!(table = %table, error = %e, "table lookup failed during parameter inference");
                    continue;
                }
            };

            match columns.iter().find(|c| c.name.eq_ignore_ascii_case(column)) {
                Some(info) => {
                    parameter.sql_type = info.sql_type;
                    parameter.type_name = info.type_name.clone();
                    parameter.native_class = info.native_class.clone();
                }
                None => tracing::warn!(
                    table = %table,
                    column = %column,
                    "column not found during parameter inference"
                ),
            }
        }
    }
}

fn positional_only(tokens: &[Token], table: &str) -> Vec<Parameter> {
    tokens
        .iter()
        .filter(|t| t.text.starts_with('?'))
        .enumerate()
        .map(|(i, t)| {
            let mut parameter = Parameter::new(placeholder_name(i + 1, &t.text), i + 1)
                .with_sql_type(inline_type(&t.text));
            parameter.table = Some(table.to_string());
            parameter
        })
        .collect()
}

/// The token naming the column a placeholder at `j` is compared against.
fn column_token_for(tokens: &[Token], j: usize, parameter: &mut Parameter) -> Option<String> {
    let is = |offset: usize, keyword: &str| j >= offset && tokens[j - offset].is(keyword);
    let text = |offset: usize| tokens[j - offset].text.clone();

    if j >= 2 && is(1, "BETWEEN") {
        Some(text(2))
    } else if j >= 4 && is(3, "BETWEEN") && is(1, "AND") {
        Some(text(4))
    } else if j >= 2 && is(1, "COUNT") {
        parameter.used_by_count = true;
        Some("COUNT(*)".to_string())
    } else if j >= 2 && is(2, "COUNT") {
        parameter.used_by_count = true;
        Some(text(1))
    } else if j >= 2 && (is(1, "IN") || is(1, "LIKE")) {
        if j >= 3 && is(2, "NOT") {
            Some(text(3))
        } else {
            Some(text(2))
        }
    } else if j >= 1 && !tokens[j - 1].text.starts_with('?') {
        Some(text(1))
    } else {
        None
    }
}

/// Tokenize for the placeholder scan, replacing table aliases with the
/// table names they stand for.
///
/// Handles `FROM posts p`, `FROM posts AS p` and `JOIN posts p`; `p.col`
/// becomes `posts.col` and the alias token itself is dropped.
fn resolve_aliases(sql: &str) -> Vec<Token> {
    let spaced = sql
        .replace('(', " ( ")
        .replace(')', " ) ")
        .replace(',', " , ");
    let tokens: Vec<Token> = split_tokens(&spaced, ALIAS_DELIMITERS)
        .into_iter()
        .map(Token::new)
        .collect();

    let is_punct = |t: &Token| matches!(t.text.as_str(), "(" | ")" | ",");

    if !tokens.iter().any(|t| t.text.contains('.')) {
        return tokens.into_iter().filter(|t| !is_punct(t)).collect();
    }

    let mut candidates: HashSet<String> = HashSet::new();
    for token in tokens.iter().filter(|t| !t.text.starts_with('?')) {
        if let Some((alias, _)) = token.upper.split_once('.') {
            candidates.insert(alias.to_string());
        }
    }

    let mut aliases: HashMap<String, String> = HashMap::new();
    let mut as_aliases: HashSet<String> = HashSet::new();
    for j in 1..tokens.len() {
        let token = &tokens[j];
        if !candidates.contains(&token.upper) || aliases.contains_key(&token.upper) {
            continue;
        }
        let prev = &tokens[j - 1];
        if prev.is("AS") {
            if j >= 2 {
                aliases.insert(token.upper.clone(), tokens[j - 2].text.clone());
                as_aliases.insert(token.upper.clone());
            }
        } else if !matches!(prev.upper.as_str(), "," | "UPDATE" | "FROM" | "JOIN" | ")") {
            aliases.insert(token.upper.clone(), prev.text.clone());
        }
    }

    if !aliases.is_empty() {
        tracing::trace!(?aliases, "resolved table aliases");
    }

    let mut resolved: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];

        if token.is("AS")
            && tokens
                .get(i + 1)
                .is_some_and(|next| as_aliases.contains(&next.upper))
        {
            i += 2;
            continue;
        }

        if let Some(table) = aliases.get(&token.upper) {
            let follows_table = resolved
                .last()
                .is_some_and(|prev| prev.text.eq_ignore_ascii_case(table));
            if follows_table {
                i += 1;
                continue;
            }
        }

        let rewritten = match token.text.split_once('.') {
            Some((alias, column)) if !token.text.starts_with('?') => {
                match aliases.get(&alias.to_ascii_uppercase()) {
                    Some(table) => Token::new(&format!("{}.{}", table, column)),
                    None => token.clone(),
                }
            }
            _ => token.clone(),
        };
        resolved.push(rewritten);
        i += 1;
    }

    resolved.into_iter().filter(|t| !is_punct(t)).collect()
}
