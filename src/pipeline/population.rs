//! Child-population estimates per zip code from 5-year age bands.

use log::info;

use super::CLEANED_ZIP_COLUMN;
use super::zip::{self, ZipColumnSummary, ZipRepair};
use crate::data::model::{Table, Value};
use crate::error::{PipelineError, Result};

pub const ZIP_COLUMN: &str = "zipcode";
/// Age-band headers exactly as they appear in the source.
pub const AGE_0_4_COLUMN: &str = "-5";
pub const AGE_5_9_COLUMN: &str = "5-9";
pub const AGE_10_14_COLUMN: &str = "10-14";

pub const POPULATION_0_5_COLUMN: &str = "Population_0_5";
pub const POPULATION_0_12_COLUMN: &str = "Population_0_12";

/// Share of the 5-9 band aged under 5 (one year of five).
const SHARE_5_9_UNDER_5: f64 = 1.0 / 5.0;
/// Share of the 10-14 band aged 12 or under (three years of five).
const SHARE_10_14_UP_TO_12: f64 = 3.0 / 5.0;

/// Population counts for the three youngest age bands of one row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgeBands {
    pub age_0_4: f64,
    pub age_5_9: f64,
    pub age_10_14: f64,
}

impl AgeBands {
    /// Children under 5, assuming ages are uniform within each band.
    pub fn population_0_5(&self) -> f64 {
        self.age_0_4 + self.age_5_9 * SHARE_5_9_UNDER_5
    }

    /// Children aged 12 or under.
    pub fn population_0_12(&self) -> f64 {
        self.age_0_4 + self.age_5_9 + self.age_10_14 * SHARE_10_14_UP_TO_12
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationEstimate {
    pub zip: Option<String>,
    pub population_0_5: i64,
    pub population_0_12: i64,
}

impl PopulationEstimate {
    pub fn from_bands(zip: Option<String>, bands: &AgeBands) -> Self {
        PopulationEstimate {
            zip,
            population_0_5: round_count(bands.population_0_5()),
            population_0_12: round_count(bands.population_0_12()),
        }
    }
}

/// Nearest integer, halves to even.
fn round_count(v: f64) -> i64 {
    v.round_ties_even() as i64
}

#[derive(Debug, Clone)]
pub struct PopulationOutcome {
    pub zip: ZipColumnSummary,
    pub estimates: Vec<PopulationEstimate>,
    pub table: Table,
}

/// One estimate per input row, in input order. Repeated zip codes are kept
/// as separate rows.
pub fn aggregate(raw: &Table) -> Result<PopulationOutcome> {
    let (zips, zip) = zip::normalize_values(raw, ZIP_COLUMN, ZipRepair::LeadingZero)?;

    let b0 = (AGE_0_4_COLUMN, raw.require_column(AGE_0_4_COLUMN)?);
    let b1 = (AGE_5_9_COLUMN, raw.require_column(AGE_5_9_COLUMN)?);
    let b2 = (AGE_10_14_COLUMN, raw.require_column(AGE_10_14_COLUMN)?);

    let mut estimates = Vec::with_capacity(raw.len());
    for (row_no, (row, zip_value)) in raw.rows().iter().zip(zips).enumerate() {
        let count = |(column, idx): (&str, usize)| band_count(raw, row_no, column, &row[idx]);
        let bands = AgeBands {
            age_0_4: count(b0)?,
            age_5_9: count(b1)?,
            age_10_14: count(b2)?,
        };
        let zip_code = match zip_value {
            Value::Text(s) => Some(s),
            _ => None,
        };
        estimates.push(PopulationEstimate::from_bands(zip_code, &bands));
    }

    let table = to_table(&estimates)?;
    info!(
        "population table: {} rows, {} zips repaired",
        table.len(),
        zip.repaired
    );

    Ok(PopulationOutcome {
        zip,
        estimates,
        table,
    })
}

/// Missing counts are zero population.
fn band_count(table: &Table, row: usize, column: &str, value: &Value) -> Result<f64> {
    if value.is_missing() {
        return Ok(0.0);
    }
    value.as_f64().ok_or_else(|| PipelineError::NonNumeric {
        table: table.name().to_string(),
        column: column.to_string(),
        row,
        value: value.render(),
    })
}

fn to_table(estimates: &[PopulationEstimate]) -> Result<Table> {
    let rows = estimates
        .iter()
        .map(|e| {
            vec![
                Value::from_opt_text(e.zip.as_deref()),
                Value::Integer(e.population_0_5),
                Value::Integer(e.population_0_12),
            ]
        })
        .collect();
    Table::from_rows(
        "population_calculated",
        vec![
            CLEANED_ZIP_COLUMN.to_string(),
            POPULATION_0_5_COLUMN.to_string(),
            POPULATION_0_12_COLUMN.to_string(),
        ],
        rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: Vec<Vec<Value>>) -> Table {
        Table::from_rows(
            "population",
            vec![
                "zipcode".into(),
                "-5".into(),
                "5-9".into(),
                "10-14".into(),
                "15-19".into(),
            ],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn interpolates_age_bands() {
        let bands = AgeBands {
            age_0_4: 10.0,
            age_5_9: 5.0,
            age_10_14: 10.0,
        };
        let est = PopulationEstimate::from_bands(Some("12345".into()), &bands);
        assert_eq!(est.population_0_5, 11);
        assert_eq!(est.population_0_12, 21);
    }

    #[test]
    fn rounds_halves_to_even() {
        assert_eq!(round_count(12.5), 12);
        assert_eq!(round_count(13.5), 14);
        assert_eq!(round_count(0.4), 0);
    }

    #[test]
    fn missing_bands_count_as_zero() {
        let out = aggregate(&raw(vec![vec![
            Value::Integer(2139),
            Value::Missing,
            Value::Integer(10),
            Value::Missing,
            Value::Integer(99),
        ]]))
        .unwrap();
        assert_eq!(
            out.estimates[0],
            PopulationEstimate {
                zip: Some("02139".into()),
                population_0_5: 2,
                population_0_12: 10,
            }
        );
        assert_eq!(out.zip.repaired, 1);
    }

    #[test]
    fn keeps_one_row_per_input_row() {
        let row = |zip: Value| vec![zip, Value::Integer(1), Value::Integer(1), Value::Integer(1)];
        let rows = vec![
            [row(Value::text("12345")), vec![Value::Missing]].concat(),
            [row(Value::text("12345")), vec![Value::Missing]].concat(),
            [row(Value::Missing), vec![Value::Missing]].concat(),
        ];
        let out = aggregate(&raw(rows)).unwrap();
        assert_eq!(out.table.len(), 3);
        assert_eq!(
            out.table.columns(),
            ["zip_code_cleaned", "Population_0_5", "Population_0_12"]
        );
        assert_eq!(out.table.rows()[2][0], Value::Missing);
        assert_eq!(out.table.rows()[0][1], Value::Integer(1));
    }

    #[test]
    fn non_numeric_band_is_an_error() {
        let err = aggregate(&raw(vec![vec![
            Value::text("12345"),
            Value::text("lots"),
            Value::Integer(1),
            Value::Integer(1),
            Value::Missing,
        ]]))
        .unwrap_err();
        assert!(matches!(err, PipelineError::NonNumeric { row: 0, .. }));
    }

    #[test]
    fn missing_band_column_is_fatal() {
        let t = Table::from_rows("population", vec!["zipcode".into(), "-5".into()], vec![])
            .unwrap();
        assert!(matches!(
            aggregate(&t),
            Err(PipelineError::MissingSourceColumn { column, .. }) if column == "5-9"
        ));
    }
}
