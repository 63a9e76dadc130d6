//! Cursor to table materialization

use dataexpress_core::{ColumnInfo, Cursor, OutputFilter, Result, RowInfo, TableData, VendorAdapter};

use super::extractor::extract_value;

/// Drain `cursor` into a [`TableData`].
///
/// Every row is read fully before the next `advance`. When a filter is
/// given, only the columns it allows are read; an allow-list also fixes the
/// column order. A filter that leaves no columns yields an empty table.
#[tracing::instrument(skip_all)]
pub fn materialize(
    cursor: &mut dyn Cursor,
    filter: Option<&OutputFilter>,
    vendor: Option<&dyn VendorAdapter>,
) -> Result<TableData> {
    let selected = select_columns(cursor.columns(), filter);
    let header = RowInfo::new(selected.iter().map(|(_, c)| c.clone()));
    let mut table = TableData::new(header);

    if selected.is_empty() {
        tracing::debug!("no columns survive the output filter, rows dropped");
        return Ok(table);
    }

    while cursor.advance()? {
        let mut cells = Vec::with_capacity(selected.len());
        for (index, column) in &selected {
            cells.push(extract_value(&mut *cursor, *index, column, vendor)?);
        }
        table.push_cells(cells);
    }

    tracing::debug!(rows = table.len(), columns = selected.len(), "materialized result set");
    Ok(table)
}

/// Columns to read, as (1-based cursor index, metadata). Only the first
/// occurrence of a repeated name is kept.
fn select_columns(columns: &[ColumnInfo], filter: Option<&OutputFilter>) -> Vec<(usize, ColumnInfo)> {
    let mut distinct: Vec<(usize, ColumnInfo)> = Vec::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        if !distinct.iter().any(|(_, c)| c.name.eq_ignore_ascii_case(&column.name)) {
            distinct.push((i + 1, column.clone()));
        }
    }

    let Some(filter) = filter.filter(|f| !f.is_empty()) else {
        return distinct;
    };

    if filter.only_columns().is_empty() {
        return distinct
            .into_iter()
            .filter(|(_, c)| filter.allows(&c.name))
            .collect();
    }

    filter
        .only_columns()
        .iter()
        .filter(|name| filter.allows(name))
        .filter_map(|name| {
            distinct
                .iter()
                .find(|(_, c)| c.name.eq_ignore_ascii_case(name))
                .cloned()
        })
        .collect()
}
