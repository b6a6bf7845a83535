//! School identity, grades and grade spans

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use super::{parse_flag, parse_float, parse_id};
use crate::error::{DashboardError, Result};

/// State-assigned school number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolId(pub u32);

impl fmt::Display for SchoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SchoolId {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        parse_id(s, "SchoolID").map(Self)
    }
}

/// State-assigned corporation (district) number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorporationId(pub u32);

impl fmt::Display for CorporationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// School type as published in the school index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchoolType {
    K8,
    HS,
    K12,
    /// Adult high school
    AHS,
}

impl SchoolType {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::K8 => "K8",
            Self::HS => "HS",
            Self::K12 => "K12",
            Self::AHS => "AHS",
        }
    }

    /// Whether the school reports K8 academic data
    #[must_use]
    pub const fn has_k8(self) -> bool {
        matches!(self, Self::K8 | Self::K12)
    }

    /// Whether the school reports HS academic data
    #[must_use]
    pub const fn has_hs(self) -> bool {
        matches!(self, Self::HS | Self::K12 | Self::AHS)
    }
}

impl fmt::Display for SchoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SchoolType {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "K8" => Ok(Self::K8),
            "HS" => Ok(Self::HS),
            "K12" => Ok(Self::K12),
            "AHS" => Ok(Self::AHS),
            other => Err(DashboardError::Conversion(format!(
                "Unknown school type '{other}'"
            ))),
        }
    }
}

/// Which academic family a view or peer universe draws on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnalysisType {
    K8,
    HS,
}

impl AnalysisType {
    /// School types that belong to the geographic universe of this analysis
    #[must_use]
    pub const fn school_types(self) -> &'static [SchoolType] {
        match self {
            Self::K8 => &[SchoolType::K8, SchoolType::K12],
            Self::HS => &[SchoolType::HS, SchoolType::K12, SchoolType::AHS],
        }
    }

    /// The analysis a school's own type defaults to
    #[must_use]
    pub const fn for_school_type(school_type: SchoolType) -> Self {
        match school_type {
            SchoolType::K8 | SchoolType::K12 => Self::K8,
            SchoolType::HS | SchoolType::AHS => Self::HS,
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::K8 => f.write_str("K8"),
            Self::HS => f.write_str("HS"),
        }
    }
}

/// A grade level; `PK` and `KG` sort below grade 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    PreK,
    Kindergarten,
    Numbered(u8),
}

impl Grade {
    /// Ordinal used by the grade-span overlap gate (`PK→0`, `KG→1`, `n→n`)
    #[must_use]
    pub const fn ordinal(self) -> i32 {
        match self {
            Self::PreK => 0,
            Self::Kindergarten => 1,
            Self::Numbered(n) => n as i32,
        }
    }

    /// The numbered grade, if any
    #[must_use]
    pub const fn number(self) -> Option<u8> {
        match self {
            Self::Numbered(n) => Some(n),
            _ => None,
        }
    }

    /// The next grade up
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::PreK => Self::Kindergarten,
            Self::Kindergarten => Self::Numbered(1),
            Self::Numbered(n) => Self::Numbered(n + 1),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreK => f.write_str("PK"),
            Self::Kindergarten => f.write_str("KG"),
            Self::Numbered(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for Grade {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        match upper.as_str() {
            "PK" | "PRE-K" | "PREK" => return Ok(Self::PreK),
            "KG" | "K" => return Ok(Self::Kindergarten),
            _ => {}
        }
        let digits = upper.strip_prefix("GRADE ").unwrap_or(&upper);
        digits
            .parse::<f64>()
            .ok()
            .filter(|n| n.fract() == 0.0 && (1.0..=12.0).contains(n))
            .map(|n| Self::Numbered(n as u8))
            .ok_or_else(|| DashboardError::Conversion(format!("Unknown grade '{trimmed}'")))
    }
}

/// Inclusive grade range served by a school
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GradeSpan {
    pub low: Grade,
    pub high: Grade,
}

impl GradeSpan {
    /// Create a span, swapping bounds given in the wrong order
    #[must_use]
    pub fn new(low: Grade, high: Grade) -> Self {
        match low.cmp(&high) {
            Ordering::Greater => Self { low: high, high: low },
            _ => Self { low, high },
        }
    }

    #[must_use]
    pub fn contains(&self, grade: Grade) -> bool {
        self.low <= grade && grade <= self.high
    }

    /// Numbered grades inside the span
    pub fn numbered(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=12u8).filter(|n| self.contains(Grade::Numbered(*n)))
    }

    /// Grade-span overlap gate
    ///
    /// A candidate `[L, H]` is retained against the selected span `[Ls, Hs]`
    /// iff `(L ≤ Ls ∧ H − Ls ≥ overlap) ∨ (L ≥ Ls ∧ Hs − L ≥ overlap)`, where
    /// `overlap = grades_required − 1`.
    #[must_use]
    pub fn overlaps(&self, candidate: &Self, grades_required: u8) -> bool {
        let overlap = i32::from(grades_required) - 1;
        let (ls, hs) = (self.low.ordinal(), self.high.ordinal());
        let (l, h) = (candidate.low.ordinal(), candidate.high.ordinal());
        (l <= ls && h - ls >= overlap) || (l >= ls && hs - l >= overlap)
    }
}

impl fmt::Display for GradeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// A row of the school index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub corporation_id: CorporationId,
    pub corporation_name: String,
    pub school_type: SchoolType,
    pub low_grade: Option<Grade>,
    pub high_grade: Option<Grade>,
    pub guest: bool,
    pub network: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl School {
    /// Grade span when both bounds are known
    #[must_use]
    pub fn span(&self) -> Option<GradeSpan> {
        Some(GradeSpan::new(self.low_grade?, self.high_grade?))
    }

    /// Decode the school index table
    pub fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let rows: Vec<RawSchoolRow> = serde_arrow::from_record_batch(batch)?;
        rows.into_iter().map(RawSchoolRow::into_school).collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawSchoolRow {
    #[serde(rename = "SchoolID")]
    school_id: Option<String>,
    #[serde(rename = "SchoolName", default)]
    school_name: Option<String>,
    #[serde(rename = "CorporationID", default)]
    corporation_id: Option<String>,
    #[serde(rename = "CorporationName", default)]
    corporation_name: Option<String>,
    #[serde(rename = "SchoolType", default)]
    school_type: Option<String>,
    #[serde(rename = "LowGrade", default)]
    low_grade: Option<String>,
    #[serde(rename = "HighGrade", default)]
    high_grade: Option<String>,
    #[serde(rename = "Guest", default)]
    guest: Option<String>,
    #[serde(rename = "Network", default)]
    network: Option<String>,
    #[serde(rename = "Lat", default)]
    lat: Option<String>,
    #[serde(rename = "Lon", default)]
    lon: Option<String>,
}

impl RawSchoolRow {
    fn into_school(self) -> Result<School> {
        let id = SchoolId(parse_id(self.school_id.as_deref().unwrap_or_default(), "SchoolID")?);
        let corporation_id = CorporationId(parse_id(
            self.corporation_id.as_deref().unwrap_or_default(),
            "CorporationID",
        )?);
        let school_type = self
            .school_type
            .as_deref()
            .unwrap_or("K8")
            .parse::<SchoolType>()?;
        Ok(School {
            id,
            name: self.school_name.unwrap_or_default(),
            corporation_id,
            corporation_name: self.corporation_name.unwrap_or_default(),
            school_type,
            low_grade: self.low_grade.as_deref().and_then(|g| g.parse().ok()),
            high_grade: self.high_grade.as_deref().and_then(|g| g.parse().ok()),
            guest: parse_flag(self.guest.as_deref()),
            network: self.network.filter(|n| !n.trim().is_empty()),
            lat: parse_float(self.lat.as_deref()),
            lon: parse_float(self.lon.as_deref()),
        })
    }
}
