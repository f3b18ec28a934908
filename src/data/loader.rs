use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt8Type,
};
use log::debug;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Table, Value};

/// Cell contents read as "missing" regardless of column type.
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a source table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus records (the usual case)
/// * `.json`    – `[{ "zipcode": "02139", "-5": 120, ... }, ...]`
/// * `.parquet` – flat columns of string / integer / float type
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    debug!(
        "loaded '{}': {} rows x {} columns",
        table.name(),
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

fn table_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table")
        .to_string()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
///
/// Types are inferred per column, not per cell: a column whose present cells
/// all parse as integers becomes Integer, one whose cells all parse as numbers
/// becomes Float, anything else stays Text. A zip column containing one
/// non-numeric entry therefore keeps its leading zeros everywhere.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(&mut reader, table_name(path))
}

/// Parse CSV from any reader; shared by the file loader and tests.
pub fn read_csv<R: std::io::Read>(reader: &mut csv::Reader<R>, name: String) -> Result<Table> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: expected {} fields but found {}",
                headers.len(),
                record.len()
            );
        }
        raw.push(record.iter().map(|f| f.to_string()).collect());
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|col| infer_kind(raw.iter().map(|row| row[col].as_str())))
        .collect();

    let rows: Vec<Vec<Value>> = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(cell, kind)| kind.parse(cell))
                .collect()
        })
        .collect();

    Ok(Table::from_rows(name, headers, rows)?)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl ColumnKind {
    fn parse(self, cell: String) -> Value {
        if is_na(&cell) {
            return Value::Missing;
        }
        match self {
            ColumnKind::Integer => cell
                .trim()
                .parse::<i64>()
                .map_or(Value::Text(cell.clone()), Value::Integer),
            ColumnKind::Float => cell
                .trim()
                .parse::<f64>()
                .map_or(Value::Text(cell.clone()), Value::Float),
            ColumnKind::Text => Value::Text(cell),
        }
    }
}

fn is_na(cell: &str) -> bool {
    NA_TOKENS.contains(&cell.trim())
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Integer;
    let mut any_missing = false;
    for cell in cells {
        if is_na(cell) {
            any_missing = true;
            continue;
        }
        let cell = cell.trim();
        if kind == ColumnKind::Integer && cell.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && cell.parse::<f64>().is_err() {
            return ColumnKind::Text;
        }
    }
    // An integer column with holes cannot stay integral.
    if kind == ColumnKind::Integer && any_missing {
        ColumnKind::Float
    } else {
        kind
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "zipcode": 2139, "-5": 120, "5-9": 98, "10-14": null },
///   ...
/// ]
/// ```
///
/// Columns appear in first-seen order; a key absent from a record is Missing.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = Table::new(table_name(path), columns.clone());
    for rec in records {
        let row = columns
            .iter()
            .map(|col| rec.get(col).map_or(Value::Missing, json_to_value))
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) if is_na(s) => Value::Missing,
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Text(b.to_string()),
        JsonValue::Null => Value::Missing,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Nested columns are rendered as text.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = Table::new(table_name(path), columns);

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .map(|col| arrow_cell(col, row))
                .collect();
            table.push_row(values)?;
        }
    }

    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Missing;
    }
    match col.data_type() {
        DataType::Utf8 => Value::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => Value::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => Value::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Value::Integer(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => Value::Integer(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => Value::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::Float32 => match col.as_primitive::<Float32Type>().value(row) {
            v if v.is_nan() => Value::Missing,
            v => Value::Float(v as f64),
        },
        DataType::Float64 => match col.as_primitive::<Float64Type>().value(row) {
            v if v.is_nan() => Value::Missing,
            v => Value::Float(v),
        },
        DataType::Boolean => Value::Text(col.as_boolean().value(row).to_string()),
        other => Value::Text(format!("{other:?}")),
    }
}
