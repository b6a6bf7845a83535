//! Declared column contracts of the provider tables
//!
//! Each table has a fixed set of named columns and, for the wide tables, a
//! family of dynamic columns (academic [`ColumnKey`]s, finance year labels).
//! Anything else is a contract violation and fails fast.

use std::fmt;
use std::str::FromStr;

use arrow::datatypes::Schema;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::models::finance::YearLabel;
use crate::schema::columns::{meta, ColumnKey, ETHNICITIES, SUBGROUPS};

/// Column holding total enrollment in the demographics table
pub const TOTAL_ENROLLMENT: &str = "Total Enrollment";
/// Finance row-label column
pub const CATEGORY: &str = "Category";
/// Attendance rate column
pub const ATTENDANCE_RATE: &str = "Attendance Rate";
/// Chronic absenteeism column
pub const CHRONIC_ABSENTEEISM: &str = "Chronic Absenteeism %";

/// Named provider tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    SchoolIndex,
    K8Academic,
    HsAcademic,
    CorpK8,
    CorpHs,
    Demographics,
    Financial,
    GrowthStudent,
    IreadStudent,
    WidaStudent,
    SchoolStns,
    Attendance,
}

impl TableName {
    pub const ALL: [Self; 12] = [
        Self::SchoolIndex,
        Self::K8Academic,
        Self::HsAcademic,
        Self::CorpK8,
        Self::CorpHs,
        Self::Demographics,
        Self::Financial,
        Self::GrowthStudent,
        Self::IreadStudent,
        Self::WidaStudent,
        Self::SchoolStns,
        Self::Attendance,
    ];

    /// File stem used for the table on disk
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::SchoolIndex => "school_index",
            Self::K8Academic => "k8_academic",
            Self::HsAcademic => "hs_academic",
            Self::CorpK8 => "corp_k8",
            Self::CorpHs => "corp_hs",
            Self::Demographics => "demographics",
            Self::Financial => "financial",
            Self::GrowthStudent => "growth_student",
            Self::IreadStudent => "iread_student",
            Self::WidaStudent => "wida_student",
            Self::SchoolStns => "school_stns",
            Self::Attendance => "attendance",
        }
    }

    /// Column the per-school queries filter on
    #[must_use]
    pub const fn key_column(self) -> &'static str {
        match self {
            Self::CorpK8 | Self::CorpHs => meta::CORPORATION_ID,
            Self::WidaStudent => "STN",
            _ => meta::SCHOOL_ID,
        }
    }

    /// Declared column contract
    #[must_use]
    pub fn contract(self) -> Contract {
        let fixed: &'static [&'static str] = match self {
            Self::SchoolIndex => &[
                meta::SCHOOL_ID,
                meta::SCHOOL_NAME,
                meta::CORPORATION_ID,
                meta::CORPORATION_NAME,
                meta::SCHOOL_TYPE,
                meta::LOW_GRADE,
                meta::HIGH_GRADE,
                "Guest",
                "Network",
                "Lat",
                "Lon",
            ],
            Self::K8Academic | Self::HsAcademic | Self::CorpK8 | Self::CorpHs => &[
                meta::YEAR,
                meta::SCHOOL_ID,
                meta::SCHOOL_NAME,
                meta::SCHOOL_TYPE,
                meta::CORPORATION_ID,
                meta::CORPORATION_NAME,
                meta::LOW_GRADE,
                meta::HIGH_GRADE,
            ],
            Self::Demographics => &[
                meta::YEAR,
                meta::SCHOOL_ID,
                meta::SCHOOL_NAME,
                meta::CORPORATION_ID,
                meta::CORPORATION_NAME,
                TOTAL_ENROLLMENT,
            ],
            Self::Financial => &[meta::SCHOOL_ID, meta::SCHOOL_NAME, CATEGORY],
            Self::GrowthStudent => &[
                "STN",
                meta::SCHOOL_ID,
                "TestYear",
                "TestedGrade",
                "Subject",
                "ILEARNGrowthLevel",
                "ILEARNGrowthPercentile",
                "Day162",
                "Ethnicity",
                "SocioeconomicStatus",
                "EnglishLearnerStatus",
                "SpecialEducationStatus",
            ],
            Self::IreadStudent => &[
                "STN",
                meta::SCHOOL_ID,
                meta::YEAR,
                "TestPeriod",
                "TestedGrade",
                "CurrentGrade",
                "Status",
                "ExemptionStatus",
            ],
            Self::WidaStudent => &[
                "STN",
                meta::SCHOOL_ID,
                meta::YEAR,
                "TestedGrade",
                "CompositeOverallProficiencyLevel",
            ],
            Self::SchoolStns => &[meta::SCHOOL_ID, meta::YEAR, "STN"],
            Self::Attendance => &[
                meta::YEAR,
                meta::SCHOOL_ID,
                meta::CORPORATION_ID,
                "Scope",
                ATTENDANCE_RATE,
                CHRONIC_ABSENTEEISM,
            ],
        };
        let dynamic = match self {
            Self::K8Academic | Self::HsAcademic | Self::CorpK8 | Self::CorpHs => {
                DynamicColumns::Academic
            }
            Self::Demographics => DynamicColumns::Enrollment,
            Self::Financial => DynamicColumns::YearLabels,
            _ => DynamicColumns::None,
        };
        Contract { fixed, dynamic }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

impl FromStr for TableName {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.file_stem() == s)
            .ok_or_else(|| DashboardError::Conversion(format!("Unknown table '{s}'")))
    }
}

/// Families of columns accepted beyond the fixed set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicColumns {
    None,
    /// `{Category}|{Subject} {Measure}` value columns
    Academic,
    /// Ethnicity and subgroup enrollment counts
    Enrollment,
    /// `YYYY` / `YYYY (Qn)` finance columns
    YearLabels,
}

/// The set of columns a table may carry
#[derive(Debug, Clone, Copy)]
pub struct Contract {
    pub fixed: &'static [&'static str],
    pub dynamic: DynamicColumns,
}

impl Contract {
    /// Whether a column name is part of the contract
    #[must_use]
    pub fn accepts(&self, column: &str) -> bool {
        if self.fixed.contains(&column) {
            return true;
        }
        match self.dynamic {
            DynamicColumns::None => false,
            DynamicColumns::Academic => ColumnKey::parse(column).is_some(),
            DynamicColumns::Enrollment => {
                ETHNICITIES.contains(&column) || SUBGROUPS.contains(&column)
            }
            DynamicColumns::YearLabels => column.parse::<YearLabel>().is_ok(),
        }
    }
}

/// Check every column of a schema against the table contract
///
/// # Errors
/// Returns [`DashboardError::SchemaMismatch`] naming the first unknown column
pub fn validate_schema(table: TableName, schema: &Schema) -> Result<()> {
    let contract = table.contract();
    match schema
        .fields()
        .iter()
        .find(|field| !contract.accepts(field.name()))
    {
        Some(field) => Err(DashboardError::schema_mismatch(
            table.to_string(),
            field.name().clone(),
        )),
        None => Ok(()),
    }
}
