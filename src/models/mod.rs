//! Domain models decoded from provider tables
//!
//! Every table arrives as a Utf8 [`RecordBatch`](arrow::record_batch::RecordBatch);
//! the modules here turn those rows into typed records and frames.

pub mod academic;
pub mod demographics;
pub mod finance;
pub mod frame;
pub mod records;
pub mod school;

pub use academic::{AcademicFrame, AcademicRecord, RowKind, RowMeta};
pub use demographics::{AttendanceRecord, AttendanceScope, DemographicRecord};
pub use finance::{FinanceTable, YearLabel};
pub use frame::{Datum, Panel, PanelKind, Table};
pub use records::{GrowthLevel, GrowthRecord, IreadRecord, IreadStatus, TestPeriod, WidaRecord};
pub use school::{AnalysisType, CorporationId, Grade, GradeSpan, School, SchoolId, SchoolType};

use crate::error::{DashboardError, Result};

/// Parse an integer identifier, tolerating a trailing `.0` left by float columns
pub(crate) fn parse_id(raw: &str, column: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    digits.parse::<u32>().map_err(|_| {
        DashboardError::Conversion(format!("Column {column}: '{trimmed}' is not an identifier"))
    })
}

/// Parse a four-digit school year
pub(crate) fn parse_year(raw: &str) -> Result<u16> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    digits
        .parse::<u16>()
        .ok()
        .filter(|y| (1900..=2200).contains(y))
        .ok_or_else(|| DashboardError::Conversion(format!("'{trimmed}' is not a year")))
}

pub(crate) fn parse_float(raw: Option<&str>) -> Option<f64> {
    crate::schema::cell::Cell::parse(raw).value()
}

pub(crate) fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "y" | "1.0")
    )
}
