//! Income and employment reconciliation and High/Normal demand labelling.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::CLEANED_ZIP_COLUMN;
use super::zip::{self, ZipColumnSummary, ZipRepair};
use crate::data::model::{Table, Value};
use crate::error::{PipelineError, Result};

/// Zip header of the income source.
pub const INCOME_ZIP_COLUMN: &str = "ZIP code";
/// Zip header of the employment source.
pub const EMPLOYMENT_ZIP_COLUMN: &str = "zipcode";
/// The metric is always the second column, whatever its header.
pub const METRIC_POSITION: usize = 1;

pub const EMPLOYMENT_RATE_COLUMN: &str = "Employment_Rate";
pub const AVERAGE_INCOME_COLUMN: &str = "Average_Income";
pub const CLASSIFICATION_COLUMN: &str = "Demand_Classification";

/// Employment rate at or above which an area is High demand.
pub const HIGH_EMPLOYMENT_THRESHOLD: f64 = 0.60;
/// Average income at or below which an area is High demand.
pub const HIGH_INCOME_THRESHOLD: f64 = 60_000.0;

/// Fill for a zip with no employment figure. Can never reach the threshold.
pub const MISSING_EMPLOYMENT_RATE: f64 = 0.0;
/// Fill for a zip with no income figure. Can never fall under the threshold.
pub const MISSING_AVERAGE_INCOME: f64 = f64::INFINITY;

// ---------------------------------------------------------------------------
// Classification rule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub employment_rate: f64,
    pub average_income: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            employment_rate: HIGH_EMPLOYMENT_THRESHOLD,
            average_income: HIGH_INCOME_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub fn is_high_demand(&self, employment_rate: f64, average_income: f64) -> bool {
        employment_rate >= self.employment_rate || average_income <= self.average_income
    }

    pub fn classify(&self, employment_rate: f64, average_income: f64) -> DemandClass {
        if self.is_high_demand(employment_rate, average_income) {
            DemandClass::High
        } else {
            DemandClass::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemandClass {
    High,
    Normal,
}

impl DemandClass {
    pub fn label(self) -> &'static str {
        match self {
            DemandClass::High => "High",
            DemandClass::Normal => "Normal",
        }
    }
}

impl fmt::Display for DemandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Source reduction
// ---------------------------------------------------------------------------

/// One row of a reduced source: canonical zip plus its single metric.
#[derive(Debug, Clone, PartialEq)]
pub struct ZipMetric {
    pub zip: Option<String>,
    pub value: Option<f64>,
}

/// Normalize the zip column (with repair) and reduce the source to
/// `{zip_code_cleaned, metric_name}`, taking the metric from the column at
/// [`METRIC_POSITION`].
pub fn reduce_source(
    raw: &Table,
    zip_column: &str,
    metric_name: &str,
) -> Result<(Table, Vec<ZipMetric>, ZipColumnSummary)> {
    let (zips, summary) = zip::normalize_values(raw, zip_column, ZipRepair::LeadingZero)?;
    let metric_column = raw.column_at(METRIC_POSITION)?;
    debug!("'{}': metric column is '{metric_column}'", raw.name());

    let reduced = raw
        .with_column(CLEANED_ZIP_COLUMN, zips)?
        .select_required(&[CLEANED_ZIP_COLUMN, metric_column])?
        .rename(metric_column, metric_name)?;

    let metrics = reduced
        .rows()
        .iter()
        .enumerate()
        .map(|(row, cells)| -> Result<ZipMetric> {
            let value = match &cells[1] {
                cell if cell.is_missing() => None,
                cell => Some(cell.as_f64().ok_or_else(|| PipelineError::NonNumeric {
                    table: raw.name().to_string(),
                    column: metric_column.to_string(),
                    row,
                    value: cell.render(),
                })?),
            };
            let zip = match &cells[0] {
                Value::Text(s) => Some(s.clone()),
                _ => None,
            };
            Ok(ZipMetric { zip, value })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((reduced, metrics, summary))
}

// ---------------------------------------------------------------------------
// Outer join
// ---------------------------------------------------------------------------

/// A merged row before defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedFactors {
    pub zip: Option<String>,
    pub average_income: Option<f64>,
    pub employment_rate: Option<f64>,
}

/// Full outer join on canonical zip.
///
/// Keys come out in lexicographic order with the missing key last. For each
/// key every income occurrence is paired with every employment occurrence in
/// source order, so duplicated zips multiply rather than collapse. A key
/// present on one side only yields rows whose other metric is `None`. The
/// missing key matches itself.
pub fn outer_join(income: &[ZipMetric], employment: &[ZipMetric]) -> Vec<JoinedFactors> {
    let left = group_by_zip(income);
    let right = group_by_zip(employment);

    let mut keys: Vec<&Option<String>> = left.keys().chain(right.keys()).collect();
    keys.sort_by(|a, b| compare_keys(a, b));
    keys.dedup();

    let mut joined = Vec::new();
    for key in keys {
        let incomes = left.get(key).map(Vec::as_slice).unwrap_or(&[]);
        let rates = right.get(key).map(Vec::as_slice).unwrap_or(&[]);
        let incomes: Vec<Option<f64>> = if incomes.is_empty() {
            vec![None]
        } else {
            incomes.iter().map(|m| m.value).collect()
        };
        let rates: Vec<Option<f64>> = if rates.is_empty() {
            vec![None]
        } else {
            rates.iter().map(|m| m.value).collect()
        };
        for &average_income in &incomes {
            for &employment_rate in &rates {
                joined.push(JoinedFactors {
                    zip: key.clone(),
                    average_income,
                    employment_rate,
                });
            }
        }
    }
    joined
}

fn group_by_zip(rows: &[ZipMetric]) -> HashMap<Option<String>, Vec<&ZipMetric>> {
    let mut groups: HashMap<Option<String>, Vec<&ZipMetric>> = HashMap::new();
    for row in rows {
        groups.entry(row.zip.clone()).or_default().push(row);
    }
    groups
}

fn compare_keys(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DemandRecord {
    pub zip: Option<String>,
    pub employment_rate: f64,
    pub average_income: f64,
    pub is_high_demand: bool,
    pub classification: DemandClass,
}

/// Apply the missing-data defaults, then the threshold rule.
pub fn classify(joined: &[JoinedFactors], thresholds: &Thresholds) -> Vec<DemandRecord> {
    joined
        .iter()
        .map(|row| {
            let employment_rate = row.employment_rate.unwrap_or(MISSING_EMPLOYMENT_RATE);
            let average_income = row.average_income.unwrap_or(MISSING_AVERAGE_INCOME);
            let classification = thresholds.classify(employment_rate, average_income);
            DemandRecord {
                zip: row.zip.clone(),
                employment_rate,
                average_income,
                is_high_demand: classification == DemandClass::High,
                classification,
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct DemandOutcome {
    pub income_zip: ZipColumnSummary,
    pub employment_zip: ZipColumnSummary,
    pub records: Vec<DemandRecord>,
    pub table: Table,
}

impl DemandOutcome {
    pub fn high_demand_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_high_demand).count()
    }
}

/// Reduce both sources, outer-join them, fill defaults and classify.
pub fn classify_tables(
    income: &Table,
    employment: &Table,
    thresholds: &Thresholds,
) -> Result<DemandOutcome> {
    let (_, income_rows, income_zip) =
        reduce_source(income, INCOME_ZIP_COLUMN, AVERAGE_INCOME_COLUMN)?;
    let (_, employment_rows, employment_zip) =
        reduce_source(employment, EMPLOYMENT_ZIP_COLUMN, EMPLOYMENT_RATE_COLUMN)?;

    let joined = outer_join(&income_rows, &employment_rows);
    let records = classify(&joined, thresholds);
    let table = to_table(&records)?;

    let outcome = DemandOutcome {
        income_zip,
        employment_zip,
        records,
        table,
    };
    info!(
        "demand table: {} rows ({} income, {} employment), {} high demand",
        outcome.records.len(),
        income_rows.len(),
        employment_rows.len(),
        outcome.high_demand_count()
    );
    Ok(outcome)
}

fn to_table(records: &[DemandRecord]) -> Result<Table> {
    let rows = records
        .iter()
        .map(|r| {
            vec![
                Value::from_opt_text(r.zip.as_deref()),
                Value::Float(r.employment_rate),
                Value::Float(r.average_income),
                Value::text(r.classification.label()),
            ]
        })
        .collect();
    Table::from_rows(
        "demand_classification",
        vec![
            CLEANED_ZIP_COLUMN.to_string(),
            EMPLOYMENT_RATE_COLUMN.to_string(),
            AVERAGE_INCOME_COLUMN.to_string(),
            CLASSIFICATION_COLUMN.to_string(),
        ],
        rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(zip: Option<&str>, value: Option<f64>) -> ZipMetric {
        ZipMetric {
            zip: zip.map(str::to_string),
            value,
        }
    }

    fn source(name: &str, zip_header: &str, metric_header: &str, rows: Vec<(Value, Value)>) -> Table {
        Table::from_rows(
            name,
            vec![zip_header.into(), metric_header.into(), "notes".into()],
            rows.into_iter()
                .map(|(z, m)| vec![z, m, Value::Missing])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn employment_rule_fires() {
        let t = Thresholds::default();
        assert_eq!(t.classify(0.65, 70_000.0), DemandClass::High);
    }

    #[test]
    fn income_rule_fires() {
        let t = Thresholds::default();
        assert_eq!(t.classify(0.40, 50_000.0), DemandClass::High);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let t = Thresholds::default();
        assert!(t.is_high_demand(0.60, 1e9));
        assert!(t.is_high_demand(0.0, 60_000.0));
        assert!(!t.is_high_demand(0.59, 60_000.01));
    }

    #[test]
    fn defaults_never_trigger_high_demand() {
        let joined = vec![JoinedFactors {
            zip: Some("12345".into()),
            average_income: None,
            employment_rate: None,
        }];
        let rec = &classify(&joined, &Thresholds::default())[0];
        assert_eq!(rec.employment_rate, 0.0);
        assert_eq!(rec.average_income, f64::INFINITY);
        assert_eq!(rec.classification, DemandClass::Normal);
        assert!(!rec.is_high_demand);
    }

    #[test]
    fn custom_thresholds() {
        let t = Thresholds {
            employment_rate: 0.9,
            average_income: 10_000.0,
        };
        assert_eq!(t.classify(0.65, 50_000.0), DemandClass::Normal);
    }

    #[test]
    fn outer_join_keeps_every_key_sorted_with_missing_last() {
        let income = vec![
            metric(Some("20000"), Some(50_000.0)),
            metric(None, Some(1.0)),
            metric(Some("10000"), Some(80_000.0)),
        ];
        let employment = vec![
            metric(Some("30000"), Some(0.7)),
            metric(Some("10000"), Some(0.5)),
        ];
        let joined = outer_join(&income, &employment);
        let zips: Vec<_> = joined.iter().map(|j| j.zip.as_deref()).collect();
        assert_eq!(zips, [Some("10000"), Some("20000"), Some("30000"), None]);
        assert_eq!(joined[0].average_income, Some(80_000.0));
        assert_eq!(joined[0].employment_rate, Some(0.5));
        assert_eq!(joined[1].employment_rate, None);
        assert_eq!(joined[2].average_income, None);
    }

    #[test]
    fn missing_keys_pair_with_each_other_and_sort_last() {
        let income = vec![
            metric(None, Some(1.0)),
            metric(Some("10000"), Some(80_000.0)),
            metric(None, Some(2.0)),
        ];
        let employment = vec![
            metric(None, Some(0.1)),
            metric(Some("10000"), Some(0.5)),
            metric(None, Some(0.2)),
        ];
        let joined = outer_join(&income, &employment);
        assert_eq!(joined.len(), 5);
        assert_eq!(joined[0].zip.as_deref(), Some("10000"));
        let pairs: Vec<_> = joined[1..]
            .iter()
            .map(|j| {
                assert!(j.zip.is_none());
                (j.average_income, j.employment_rate)
            })
            .collect();
        assert_eq!(
            pairs,
            [
                (Some(1.0), Some(0.1)),
                (Some(1.0), Some(0.2)),
                (Some(2.0), Some(0.1)),
                (Some(2.0), Some(0.2)),
            ]
        );
    }

    #[test]
    fn nan_metric_gets_the_missing_default() {
        let income = source(
            "avg_individual_income",
            "ZIP code",
            "income",
            vec![(Value::text("12345"), Value::Float(f64::NAN))],
        );
        let employment = source(
            "employment_rate",
            "zipcode",
            "rate",
            vec![(Value::text("12345"), Value::Float(0.3))],
        );
        let out = classify_tables(&income, &employment, &Thresholds::default()).unwrap();
        assert_eq!(out.records[0].average_income, MISSING_AVERAGE_INCOME);
        assert_eq!(out.records[0].classification, DemandClass::Normal);
    }

    #[test]
    fn duplicate_keys_multiply() {
        let income = vec![
            metric(Some("10000"), Some(1.0)),
            metric(Some("10000"), Some(2.0)),
        ];
        let employment = vec![
            metric(Some("10000"), Some(0.1)),
            metric(Some("10000"), Some(0.2)),
            metric(Some("10000"), Some(0.3)),
        ];
        let joined = outer_join(&income, &employment);
        assert_eq!(joined.len(), 6);
        assert_eq!(joined[0].average_income, Some(1.0));
        assert_eq!(joined[0].employment_rate, Some(0.1));
        assert_eq!(joined[3].average_income, Some(2.0));
        assert_eq!(joined[3].employment_rate, Some(0.1));
    }

    #[test]
    fn one_sided_duplicates_are_all_kept() {
        let income = vec![
            metric(Some("10000"), Some(1.0)),
            metric(Some("10000"), Some(2.0)),
        ];
        let joined = outer_join(&income, &[]);
        assert_eq!(joined.len(), 2);
        assert!(joined.iter().all(|j| j.employment_rate.is_none()));
    }

    #[test]
    fn reduce_uses_metric_by_position() {
        let income = source(
            "avg_individual_income",
            "ZIP code",
            "Mean income (USD)",
            vec![
                (Value::Integer(2139), Value::Integer(55_000)),
                (Value::text("10001-2345"), Value::Missing),
            ],
        );
        let (reduced, rows, summary) =
            reduce_source(&income, INCOME_ZIP_COLUMN, AVERAGE_INCOME_COLUMN).unwrap();
        assert_eq!(reduced.columns(), ["zip_code_cleaned", "Average_Income"]);
        assert_eq!(reduced.rows()[0][0], Value::text("02139"));
        assert_eq!(rows[0], metric(Some("02139"), Some(55_000.0)));
        assert_eq!(rows[1], metric(Some("10001"), None));
        assert_eq!(summary.repaired, 1);
        assert_eq!(summary.truncated, 1);
    }

    #[test]
    fn classify_tables_end_to_end() {
        let income = source(
            "avg_individual_income",
            "ZIP code",
            "income",
            vec![
                (Value::text("12345"), Value::Integer(70_000)),
                (Value::text("2222"), Value::Integer(50_000)),
            ],
        );
        let employment = source(
            "employment_rate",
            "zipcode",
            "rate",
            vec![
                (Value::Float(12345.0), Value::Float(0.65)),
                (Value::text("99999"), Value::Float(0.1)),
            ],
        );
        let out = classify_tables(&income, &employment, &Thresholds::default()).unwrap();
        assert_eq!(
            out.table.columns(),
            ["zip_code_cleaned", "Employment_Rate", "Average_Income", "Demand_Classification"]
        );
        let labels: Vec<_> = out
            .records
            .iter()
            .map(|r| (r.zip.as_deref().unwrap(), r.classification))
            .collect();
        assert_eq!(
            labels,
            [
                ("02222", DemandClass::High),
                ("12345", DemandClass::High),
                ("99999", DemandClass::Normal),
            ]
        );
        assert_eq!(out.high_demand_count(), 2);
        assert_eq!(out.table.rows()[2][2], Value::Float(f64::INFINITY));
    }

    #[test]
    fn income_zip_header_is_required() {
        let income = source("avg_individual_income", "zip", "income", vec![]);
        let employment = source("employment_rate", "zipcode", "rate", vec![]);
        let err = classify_tables(&income, &employment, &Thresholds::default()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingSourceColumn {
                table: "avg_individual_income".into(),
                column: "ZIP code".into()
            }
        );
    }

    #[test]
    fn metric_column_must_exist() {
        let t = Table::from_rows("employment_rate", vec!["zipcode".into()], vec![]).unwrap();
        assert!(matches!(
            reduce_source(&t, EMPLOYMENT_ZIP_COLUMN, EMPLOYMENT_RATE_COLUMN),
            Err(PipelineError::MissingOrdinalColumn { position: 1, .. })
        ));
    }
}
