//! Enrollment demographics and attendance rows

use arrow::record_batch::RecordBatch;
use indexmap::IndexMap;
use serde::Serialize;

use super::{parse_id, parse_year};
use crate::error::Result;
use crate::schema::cell::{sum_cells, Cell};
use crate::schema::columns::{meta, ETHNICITIES, SUBGROUPS};
use crate::schema::tables::{ATTENDANCE_RATE, CHRONIC_ABSENTEEISM, TOTAL_ENROLLMENT};
use crate::utils::arrow::extractors::{column_strings, optional_column_cells};

/// Per-year enrollment counts of a school or corporation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicRecord {
    pub id: u32,
    pub name: String,
    pub year: u16,
    pub total_enrollment: Cell,
    pub ethnicity: IndexMap<String, Cell>,
    pub subgroups: IndexMap<String, Cell>,
}

impl DemographicRecord {
    pub fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let ids = column_strings(batch, meta::SCHOOL_ID)?;
        let years = column_strings(batch, meta::YEAR)?;
        let names = if batch.schema().index_of(meta::SCHOOL_NAME).is_ok() {
            column_strings(batch, meta::SCHOOL_NAME)?
        } else {
            vec![None; batch.num_rows()]
        };
        let total = optional_column_cells(batch, TOTAL_ENROLLMENT)?;
        let ethnicity_cols = ETHNICITIES
            .iter()
            .map(|c| Ok((*c, optional_column_cells(batch, c)?)))
            .collect::<Result<Vec<_>>>()?;
        let subgroup_cols = SUBGROUPS
            .iter()
            .map(|c| Ok((*c, optional_column_cells(batch, c)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut records = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let (Some(id), Some(year)) = (ids[row].as_deref(), years[row].as_deref()) else {
                continue;
            };
            records.push(Self {
                id: parse_id(id, meta::SCHOOL_ID)?,
                name: names[row].clone().unwrap_or_default(),
                year: parse_year(year)?,
                total_enrollment: total[row],
                ethnicity: ethnicity_cols
                    .iter()
                    .map(|(c, cells)| ((*c).to_string(), cells[row]))
                    .collect(),
                subgroups: subgroup_cols
                    .iter()
                    .map(|(c, cells)| ((*c).to_string(), cells[row]))
                    .collect(),
            });
        }
        records.sort_by_key(|r| r.year);
        Ok(records)
    }

    /// Sum of the ethnicity counts
    #[must_use]
    pub fn ethnicity_total(&self) -> Cell {
        sum_cells(self.ethnicity.values())
    }

    /// Difference `Total Enrollment − Σ ethnicity` when it exceeds the tolerance
    #[must_use]
    pub fn enrollment_mismatch(&self, tolerance: f64) -> Option<f64> {
        let total = self.total_enrollment.value()?;
        let sum = self.ethnicity_total().value()?;
        let diff = total - sum;
        (diff.abs() > tolerance).then_some(diff)
    }
}

/// Whose attendance figures to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
pub enum AttendanceScope {
    School,
    Corporation,
}

impl AttendanceScope {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::School => "School",
            Self::Corporation => "Corporation",
        }
    }
}

/// Yearly attendance figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub year: u16,
    pub attendance_rate: Cell,
    pub chronic_absenteeism: Cell,
}

impl AttendanceRecord {
    pub fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let years = column_strings(batch, meta::YEAR)?;
        let rate = optional_column_cells(batch, ATTENDANCE_RATE)?;
        let chronic = optional_column_cells(batch, CHRONIC_ABSENTEEISM)?;
        let mut records = years
            .iter()
            .enumerate()
            .filter_map(|(row, year)| {
                let year = parse_year(year.as_deref()?).ok()?;
                Some(Self {
                    year,
                    attendance_rate: rate[row],
                    chronic_absenteeism: chronic[row],
                })
            })
            .collect::<Vec<_>>();
        records.sort_by_key(|r| r.year);
        Ok(records)
    }
}
