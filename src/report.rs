//! Human-readable console report. Nothing here feeds back into the pipeline.

use std::fmt::Write;

use crate::data::audit::MissingReport;
use crate::data::filter::DropSummary;
use crate::data::model::{Table, Value};
use crate::pipeline::RunSummary;
use crate::pipeline::demand::DemandOutcome;
use crate::pipeline::facility::FacilityOutcome;
use crate::pipeline::population::PopulationOutcome;
use crate::pipeline::zip::ZipColumnSummary;

// ---------------------------------------------------------------------------
// Markdown tables
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq)]
enum Align {
    Left,
    Right,
}

/// Pipe-style markdown table. Numeric columns are right-aligned.
fn markdown(headers: &[String], rows: &[Vec<String>], align: &[Align]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
                .max(3)
        })
        .collect();

    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| match align[i] {
                Align::Left => format!("{c:<w$}", w = widths[i]),
                Align::Right => format!("{c:>w$}", w = widths[i]),
            })
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let rule: Vec<String> = widths
        .iter()
        .zip(align)
        .map(|(&w, a)| match a {
            Align::Left => format!(":{}", "-".repeat(w - 1)),
            Align::Right => format!("{}:", "-".repeat(w - 1)),
        })
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(headers));
    let _ = writeln!(out, "| {} |", rule.join(" | "));
    for row in rows {
        let _ = writeln!(out, "{}", line(row.as_slice()));
    }
    out
}

fn preview_cell(v: &Value) -> String {
    match v {
        Value::Missing => "nan".into(),
        other => other.render(),
    }
}

/// First `limit` rows of a table as markdown.
pub fn table_markdown(table: &Table, limit: usize) -> String {
    let head = table.head(limit);
    let align: Vec<Align> = (0..head.columns().len())
        .map(|i| {
            let numeric = head
                .rows()
                .iter()
                .all(|r| matches!(r[i], Value::Integer(_) | Value::Float(_) | Value::Missing));
            if numeric && !head.is_empty() { Align::Right } else { Align::Left }
        })
        .collect();
    let rows: Vec<Vec<String>> = head
        .rows()
        .iter()
        .map(|r| r.iter().map(preview_cell).collect())
        .collect();
    markdown(head.columns(), &rows, &align)
}

pub fn missing_report_markdown(report: &MissingReport) -> String {
    let headers = vec![
        String::new(),
        "Missing Count".to_string(),
        "Missing Percentage".to_string(),
    ];
    let rows: Vec<Vec<String>> = report
        .entries
        .iter()
        .map(|e| vec![e.column.clone(), e.count.to_string(), format!("{:.2}", e.percentage)])
        .collect();
    markdown(&headers, &rows, &[Align::Left, Align::Right, Align::Right])
}

// ---------------------------------------------------------------------------
// Stage sections
// ---------------------------------------------------------------------------

pub fn missing_section(table_label: &str, report: &MissingReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Missing Value Report for {table_label} ---");
    let _ = writeln!(out, "Total rows processed: {}", report.total_rows);
    if report.is_clean() {
        let _ = writeln!(out, "\n[Result]: No missing values found in any column.");
    } else {
        let _ = writeln!(out, "\n[Result]: Columns with missing data:");
        out.push_str(&missing_report_markdown(report));
    }
    out
}

pub fn zip_section(summary: &ZipColumnSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Zip codes longer than 5 digits ('{}') ---", summary.source_column);
    if summary.long_examples.is_empty() {
        let _ = writeln!(out, "No zip codes found with length greater than 5 digits.");
    } else {
        for (raw, digits) in &summary.long_examples {
            let _ = writeln!(out, "{raw} -> {digits}");
        }
    }
    let _ = writeln!(out, "\n--- Zip Code Cleaning Summary ---");
    let _ = writeln!(out, "Total entries truncated to 5 digits: {}", summary.truncated);
    let _ = writeln!(out, "Four-digit entries repaired with a leading zero: {}", summary.repaired);
    let _ = writeln!(out, "Missing entries: {}", summary.missing);
    let _ = writeln!(
        out,
        "Cleaned Min (Lexicographical): {}",
        summary.min.as_deref().unwrap_or("n/a")
    );
    let _ = writeln!(
        out,
        "Cleaned Max (Lexicographical): {}",
        summary.max.as_deref().unwrap_or("n/a")
    );
    out
}

pub fn geo_section(geo: &DropSummary) -> String {
    format!(
        "--- Missing Geographical Data Handling ---\n\
         Rows dropped due to missing 'latitude' or 'longitude': {}\n\
         Remaining rows for analysis: {}\n",
        geo.rows_removed, geo.rows_remaining
    )
}

pub fn facility_report(out: &FacilityOutcome, preview_rows: usize) -> String {
    [
        missing_section("facility table", &out.missing),
        zip_section(&out.zip),
        geo_section(&out.geo),
        format!("Preview of the cleaned facility table:\n{}", table_markdown(&out.table, preview_rows)),
    ]
    .join("\n")
}

pub fn population_report(out: &PopulationOutcome, preview_rows: usize) -> String {
    format!(
        "--- Population Estimates ---\n\
         Four-digit zip codes repaired: {}\n\
         Rows calculated: {}\n\n\
         Preview of the calculated population data:\n{}",
        out.zip.repaired,
        out.table.len(),
        table_markdown(&out.table, preview_rows)
    )
}

pub fn demand_report(out: &DemandOutcome, preview_rows: usize) -> String {
    format!(
        "--- Demand Classification Summary ---\n\
         Income zips repaired/truncated: {}/{}\n\
         Employment zips repaired/truncated: {}/{}\n\
         Total zip code rows processed: {}\n\
         Number of High Demand Areas: {}\n\n\
         Preview of Demand Classification:\n{}",
        out.income_zip.repaired,
        out.income_zip.truncated,
        out.employment_zip.repaired,
        out.employment_zip.truncated,
        out.records.len(),
        out.high_demand_count(),
        table_markdown(&out.table, preview_rows)
    )
}

/// Full console report for whatever stages ran.
pub fn run_report(summary: &RunSummary, preview_rows: usize) -> String {
    let mut sections = Vec::new();
    if let Some(f) = &summary.facility {
        sections.push(facility_report(f, preview_rows));
    }
    if let Some(p) = &summary.population {
        sections.push(population_report(p, preview_rows));
    }
    if let Some(d) = &summary.demand {
        sections.push(demand_report(d, preview_rows));
    }
    sections.join("\n")
}
