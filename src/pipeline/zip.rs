use log::{debug, info};

use crate::data::model::{Table, Value};
use crate::error::Result;

/// Canonical zip codes are this many digits.
pub const ZIP_LEN: usize = 5;

/// How many over-long source values a column summary keeps as examples.
const LONG_EXAMPLE_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Single-value normalization
// ---------------------------------------------------------------------------

/// Whether a 4-digit code gets its dropped leading zero back.
///
/// The facility table is normalized without it; population, income and
/// employment tables use [`ZipRepair::LeadingZero`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipRepair {
    None,
    LeadingZero,
}

/// Result of normalizing one raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedZip {
    /// `None` only when the raw value was missing. `Some("")` is a present
    /// value that contained no digits.
    pub canonical: Option<String>,
    /// Digits before repair and truncation.
    pub digits: String,
    pub repaired: bool,
    pub truncated: bool,
}

impl NormalizedZip {
    pub fn to_value(&self) -> Value {
        Value::from_opt_text(self.canonical.as_deref())
    }
}

/// Canonicalize a zip-like cell.
///
/// Steps, in order: text form, strip one trailing `.0`, keep ASCII digits,
/// optional 4-digit repair, truncate to [`ZIP_LEN`]. Codes shorter than four
/// digits are left as they are. Never fails.
pub fn normalize(raw: &Value, repair: ZipRepair) -> NormalizedZip {
    if raw.is_missing() {
        return NormalizedZip {
            canonical: None,
            digits: String::new(),
            repaired: false,
            truncated: false,
        };
    }

    let text = raw.render();
    let text = text.strip_suffix(".0").unwrap_or(&text);
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();

    let mut canonical = digits.clone();
    let repaired = repair == ZipRepair::LeadingZero && canonical.len() == ZIP_LEN - 1;
    if repaired {
        canonical.insert(0, '0');
    }
    let truncated = canonical.len() > ZIP_LEN;
    if truncated {
        // Only ASCII digits remain, so byte and char boundaries agree.
        canonical.truncate(ZIP_LEN);
    }

    NormalizedZip {
        canonical: Some(canonical),
        digits,
        repaired,
        truncated,
    }
}

// ---------------------------------------------------------------------------
// Column-level normalization
// ---------------------------------------------------------------------------

/// What happened while normalizing one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZipColumnSummary {
    pub source_column: String,
    pub rows: usize,
    pub missing: usize,
    pub repaired: usize,
    pub truncated: usize,
    /// Up to ten `(raw, digits)` pairs whose digits ran past five characters.
    pub long_examples: Vec<(Value, String)>,
    /// Lexicographic range of the non-missing canonical values.
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Normalize every cell of `source` and return the canonical values in row
/// order together with a summary.
pub fn normalize_values(
    table: &Table,
    source: &str,
    repair: ZipRepair,
) -> Result<(Vec<Value>, ZipColumnSummary)> {
    let mut summary = ZipColumnSummary {
        source_column: source.to_string(),
        ..Default::default()
    };
    let mut values = Vec::with_capacity(table.len());

    for raw in table.column(source)? {
        let zip = normalize(raw, repair);
        summary.rows += 1;
        match &zip.canonical {
            None => summary.missing += 1,
            Some(code) => {
                if summary.min.as_ref().map_or(true, |m| code < m) {
                    summary.min = Some(code.clone());
                }
                if summary.max.as_ref().map_or(true, |m| code > m) {
                    summary.max = Some(code.clone());
                }
            }
        }
        if zip.repaired {
            summary.repaired += 1;
        }
        if zip.truncated {
            summary.truncated += 1;
            if summary.long_examples.len() < LONG_EXAMPLE_LIMIT {
                summary.long_examples.push((raw.clone(), zip.digits.clone()));
            }
        }
        values.push(zip.to_value());
    }

    debug!(
        "'{}'.{source}: {} missing, range {:?}..{:?}",
        table.name(),
        summary.missing,
        summary.min,
        summary.max
    );
    if summary.repaired > 0 || summary.truncated > 0 {
        info!(
            "'{}'.{source}: repaired {} four-digit zips, truncated {} long zips",
            table.name(),
            summary.repaired,
            summary.truncated
        );
    }
    Ok((values, summary))
}

/// Copy of `table` with a `target` column holding the canonical form of
/// `source`. The source column is kept.
pub fn normalize_column(
    table: &Table,
    source: &str,
    target: &str,
    repair: ZipRepair,
) -> Result<(Table, ZipColumnSummary)> {
    let (values, summary) = normalize_values(table, source, repair)?;
    Ok((table.with_column(target, values)?, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(raw: Value, repair: ZipRepair) -> Option<String> {
        normalize(&raw, repair).canonical
    }

    fn text(s: &str, repair: ZipRepair) -> Option<String> {
        canon(Value::text(s), repair)
    }

    #[test]
    fn missing_stays_missing() {
        assert_eq!(canon(Value::Missing, ZipRepair::None), None);
        assert_eq!(canon(Value::Missing, ZipRepair::LeadingZero), None);
    }

    #[test]
    fn strips_float_suffix() {
        assert_eq!(text("12345.0", ZipRepair::None).as_deref(), Some("12345"));
        assert_eq!(canon(Value::Float(12345.0), ZipRepair::None).as_deref(), Some("12345"));
        assert_eq!(canon(Value::Float(2139.0), ZipRepair::LeadingZero).as_deref(), Some("02139"));
    }

    #[test]
    fn four_digit_repair_only_when_enabled() {
        assert_eq!(text("1234", ZipRepair::None).as_deref(), Some("1234"));
        assert_eq!(text("1234", ZipRepair::LeadingZero).as_deref(), Some("01234"));
        assert_eq!(canon(Value::Integer(2139), ZipRepair::LeadingZero).as_deref(), Some("02139"));
    }

    #[test]
    fn truncates_long_codes() {
        assert_eq!(text("123456", ZipRepair::None).as_deref(), Some("12345"));
        assert_eq!(text("02139-4307", ZipRepair::LeadingZero).as_deref(), Some("02139"));
        let zip = normalize(&Value::text("123456789"), ZipRepair::None);
        assert!(zip.truncated);
        assert_eq!(zip.digits, "123456789");
    }

    #[test]
    fn drops_non_digits() {
        assert_eq!(text("12a3b", ZipRepair::None).as_deref(), Some("123"));
        assert_eq!(text("MA 02139", ZipRepair::None).as_deref(), Some("02139"));
    }

    #[test]
    fn short_codes_are_not_padded() {
        assert_eq!(text("123", ZipRepair::LeadingZero).as_deref(), Some("123"));
    }

    #[test]
    fn digitless_text_is_present_but_empty() {
        assert_eq!(text("n/a-zip", ZipRepair::LeadingZero).as_deref(), Some(""));
    }

    #[test]
    fn only_one_float_suffix_is_stripped() {
        assert_eq!(text("1234.0.0", ZipRepair::None).as_deref(), Some("12340"));
    }

    #[test]
    fn repaired_result_is_never_four_digits_and_never_longer_than_five() {
        let inputs = [
            "1", "12", "123", "1234", "12345", "123456", "1234.0", "12345.0", "ab1234", "1-2-3-4",
            "9876543210", "", "x", "0000", "00000.0",
        ];
        for raw in inputs {
            let out = text(raw, ZipRepair::LeadingZero).unwrap();
            assert!(out.len() <= ZIP_LEN, "{raw} -> {out}");
            assert_ne!(out.len(), 4, "{raw} -> {out}");
            assert!(out.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn column_summary_counts() {
        let table = Table::from_rows(
            "pop",
            vec!["zipcode".into()],
            vec![
                vec![Value::text("1234")],
                vec![Value::text("123456")],
                vec![Value::Missing],
                vec![Value::text("99999")],
            ],
        )
        .unwrap();
        let (out, summary) =
            normalize_column(&table, "zipcode", "zip_code_cleaned", ZipRepair::LeadingZero)
                .unwrap();
        assert_eq!(out.columns(), ["zipcode", "zip_code_cleaned"]);
        assert_eq!(out.rows()[0][1], Value::text("01234"));
        assert_eq!(out.rows()[2][1], Value::Missing);
        assert_eq!(summary.repaired, 1);
        assert_eq!(summary.truncated, 1);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.long_examples, vec![(Value::text("123456"), "123456".to_string())]);
        assert_eq!(summary.min.as_deref(), Some("01234"));
        assert_eq!(summary.max.as_deref(), Some("99999"));
    }
}
