use log::info;

use super::model::Table;
use crate::error::Result;

/// Row counts around a drop step. `rows_removed + rows_remaining` always
/// equals `initial_rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropSummary {
    pub initial_rows: usize,
    pub rows_removed: usize,
    pub rows_remaining: usize,
}

/// Drop every row missing a value in any `subset` column. Every subset
/// column must exist.
pub fn drop_missing(table: &Table, subset: &[&str]) -> Result<(Table, DropSummary)> {
    let cols = subset
        .iter()
        .map(|c| table.require_column(c))
        .collect::<Result<Vec<_>>>()?;

    let kept = table.filter_rows(|row| cols.iter().all(|&c| !row[c].is_missing()));

    let summary = DropSummary {
        initial_rows: table.len(),
        rows_removed: table.len() - kept.len(),
        rows_remaining: kept.len(),
    };
    info!(
        "'{}': dropped {} rows missing {:?}, {} remain",
        table.name(),
        summary.rows_removed,
        subset,
        summary.rows_remaining
    );
    Ok((kept, summary))
}
