use super::model::Table;

/// Missing-value count for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingEntry {
    pub column: String,
    pub count: usize,
    /// Share of all rows, in percent, rounded half-to-even to two decimals.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissingReport {
    pub total_rows: usize,
    /// Only columns with at least one missing cell, most missing first.
    pub entries: Vec<MissingEntry>,
}

impl MissingReport {
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Count missing cells per column. Pure reporting; the table is not touched.
/// Columns with equal counts keep their table order.
pub fn missing_report(table: &Table) -> MissingReport {
    let total_rows = table.len();
    let mut entries: Vec<MissingEntry> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let count = table.rows().iter().filter(|r| r[idx].is_missing()).count();
            MissingEntry {
                column: column.clone(),
                count,
                percentage: percentage(count, total_rows),
            }
        })
        .filter(|e| e.count > 0)
        .collect();

    entries.sort_by(|a, b| b.count.cmp(&a.count));

    MissingReport {
        total_rows,
        entries,
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 100.0 * 100.0).round_ties_even() / 100.0
}
