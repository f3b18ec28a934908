use std::fmt;

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Value – a single cell in a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a dataframe infers from a
/// delimited text file.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Missing,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// `None` maps to [`Value::Missing`].
    pub fn from_opt_text(s: Option<&str>) -> Self {
        s.map_or(Value::Missing, Value::text)
    }

    /// A NaN float counts as missing, as it does in a dataframe.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Text is accepted when it parses as a number
    /// once trimmed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Missing => None,
        }
    }

    /// Text representation used for CSV output and for zip normalization.
    /// Missing renders as an empty string.
    pub fn render(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(v) => format_float(*v),
            Value::Missing => String::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "<missing>"),
            other => write!(f, "{}", other.render()),
        }
    }
}

/// Shortest round-trip form; integral values keep a trailing `.0` so a float
/// column never reads back as integers.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else if v.is_infinite() {
        if v > 0.0 { "inf".into() } else { "-inf".into() }
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

// ---------------------------------------------------------------------------
// Table – ordered rows over ordered, named columns
// ---------------------------------------------------------------------------

/// Row-oriented table. Every transform returns a new table; nothing here
/// mutates a table that another stage may still hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Label used in error messages (usually the source file stem).
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Table {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from pre-assembled rows, checking every row width.
    pub fn from_rows(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self> {
        let mut table = Table::new(name, columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append one row. Used while a table is being assembled.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::RowWidth {
                table: self.name.clone(),
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Index of a column the caller cannot do without.
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| PipelineError::MissingSourceColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Name of the column at `position`, for sources whose headers vary.
    pub fn column_at(&self, position: usize) -> Result<&str> {
        self.columns
            .get(position)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::MissingOrdinalColumn {
                table: self.name.clone(),
                position,
            })
    }

    /// All cells of one column, in row order.
    pub fn column(&self, column: &str) -> Result<impl Iterator<Item = &Value> + '_> {
        let idx = self.require_column(column)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Copy of this table with `column` set to `values`. An existing column of
    /// that name is replaced in place, otherwise the column is appended.
    pub fn with_column(&self, column: &str, values: Vec<Value>) -> Result<Table> {
        if values.len() != self.rows.len() {
            return Err(PipelineError::RowWidth {
                table: self.name.clone(),
                row: values.len().min(self.rows.len()),
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        let mut out = self.clone();
        match self.column_index(column) {
            Some(idx) => {
                for (row, value) in out.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                out.columns.push(column.to_string());
                for (row, value) in out.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(out)
    }

    /// Keep-list projection: output columns follow `keep` order. Names absent
    /// from this table are skipped rather than treated as errors.
    pub fn select(&self, keep: &[&str]) -> Table {
        let indices: Vec<usize> = keep
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        self.project(&indices)
    }

    /// Like [`Table::select`] but every named column must exist.
    pub fn select_required(&self, keep: &[&str]) -> Result<Table> {
        let indices = keep
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.project(&indices))
    }

    fn project(&self, indices: &[usize]) -> Table {
        Table {
            name: self.name.clone(),
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<Table> {
        let idx = self.require_column(from)?;
        let mut out = self.clone();
        out.columns[idx] = to.to_string();
        Ok(out)
    }

    /// Keep rows for which `keep` returns true, preserving order.
    pub fn filter_rows(&self, mut keep: impl FnMut(&[Value]) -> bool) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// First `n` rows, for previews.
    pub fn head(&self, n: usize) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}
