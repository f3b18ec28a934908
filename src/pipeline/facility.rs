//! Childcare facility table: audit, zip cleanup, geo filter, projection.

use log::info;

use super::CLEANED_ZIP_COLUMN;
use super::zip::{self, ZipColumnSummary, ZipRepair};
use crate::data::audit::{MissingReport, missing_report};
use crate::data::filter::{DropSummary, drop_missing};
use crate::data::model::Table;
use crate::error::Result;

pub const ZIP_COLUMN: &str = "zip_code";
pub const LATITUDE_COLUMN: &str = "latitude";
pub const LONGITUDE_COLUMN: &str = "longitude";

/// Columns of the cleaned facility table, in output order.
pub const RETAINED_COLUMNS: [&str; 10] = [
    "facility_id",
    CLEANED_ZIP_COLUMN,
    "infant_capacity",
    "toddler_capacity",
    "preschool_capacity",
    "school_age_capacity",
    "children_capacity",
    "total_capacity",
    LATITUDE_COLUMN,
    LONGITUDE_COLUMN,
];

/// Everything the facility stage produces.
#[derive(Debug, Clone)]
pub struct FacilityOutcome {
    /// Audit of the raw table, before any cleaning.
    pub missing: MissingReport,
    pub zip: ZipColumnSummary,
    pub geo: DropSummary,
    pub table: Table,
}

/// Clean the raw facility table.
///
/// Zip codes are normalized without the 4-digit repair. Rows lacking either
/// coordinate are dropped, then the table is projected onto
/// [`RETAINED_COLUMNS`]; retained columns absent from the source are simply
/// not emitted.
pub fn prepare(raw: &Table) -> Result<FacilityOutcome> {
    let missing = missing_report(raw);

    let (with_zip, zip) =
        zip::normalize_column(raw, ZIP_COLUMN, CLEANED_ZIP_COLUMN, ZipRepair::None)?;

    let (located, geo) = drop_missing(&with_zip, &[LATITUDE_COLUMN, LONGITUDE_COLUMN])?;

    let table = located.select(&RETAINED_COLUMNS);
    info!(
        "facility table: {} of {} rows kept, {} columns",
        table.len(),
        raw.len(),
        table.columns().len()
    );

    Ok(FacilityOutcome {
        missing,
        zip,
        geo,
        table,
    })
}
