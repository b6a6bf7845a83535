//! Student-level assessment records (growth, IREAD, WIDA)

use std::fmt;

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use super::school::Grade;
use super::{parse_flag, parse_float, parse_year};
use crate::error::Result;
use crate::schema::columns::Subject;

/// ILEARN growth level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GrowthLevel {
    Adequate,
    NotAdequate,
}

impl GrowthLevel {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "adequate" | "adequate growth" => Some(Self::Adequate),
            "not adequate" | "not adequate growth" => Some(Self::NotAdequate),
            _ => None,
        }
    }
}

/// One ILEARN growth observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRecord {
    pub stn: String,
    pub test_year: u16,
    pub tested_grade: Option<Grade>,
    pub subject: Subject,
    pub level: GrowthLevel,
    pub percentile: Option<f64>,
    pub day_162: bool,
    pub ethnicity: Option<String>,
    pub socioeconomic_status: Option<String>,
    pub english_learner_status: Option<String>,
    pub special_education_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGrowthRow {
    #[serde(rename = "STN", default)]
    stn: Option<String>,
    #[serde(rename = "TestYear", default)]
    test_year: Option<String>,
    #[serde(rename = "TestedGrade", default)]
    tested_grade: Option<String>,
    #[serde(rename = "Subject", default)]
    subject: Option<String>,
    #[serde(rename = "ILEARNGrowthLevel", default)]
    level: Option<String>,
    #[serde(rename = "ILEARNGrowthPercentile", default)]
    percentile: Option<String>,
    #[serde(rename = "Day162", default)]
    day_162: Option<String>,
    #[serde(rename = "Ethnicity", default)]
    ethnicity: Option<String>,
    #[serde(rename = "SocioeconomicStatus", default)]
    socioeconomic_status: Option<String>,
    #[serde(rename = "EnglishLearnerStatus", default)]
    english_learner_status: Option<String>,
    #[serde(rename = "SpecialEducationStatus", default)]
    special_education_status: Option<String>,
}

impl GrowthRecord {
    /// Decode growth rows, skipping rows without a usable subject or level
    pub fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let rows: Vec<RawGrowthRow> = serde_arrow::from_record_batch(batch)?;
        let total = rows.len();
        let mut records = Vec::with_capacity(total);
        for raw in rows {
            let (Some(stn), Some(year)) = (non_empty(raw.stn), raw.test_year) else {
                continue;
            };
            let Some(subject) = raw.subject.as_deref().and_then(|s| s.trim().parse().ok()) else {
                continue;
            };
            let Some(level) = raw.level.as_deref().and_then(GrowthLevel::parse) else {
                continue;
            };
            records.push(Self {
                stn,
                test_year: parse_year(&year)?,
                tested_grade: raw.tested_grade.as_deref().and_then(|g| g.parse().ok()),
                subject,
                level,
                percentile: parse_float(raw.percentile.as_deref())
                    .filter(|p| (1.0..=99.0).contains(p)),
                day_162: parse_flag(raw.day_162.as_deref()),
                ethnicity: non_empty(raw.ethnicity),
                socioeconomic_status: non_empty(raw.socioeconomic_status),
                english_learner_status: non_empty(raw.english_learner_status),
                special_education_status: non_empty(raw.special_education_status),
            });
        }
        if records.len() < total {
            log::debug!("Skipped {} unusable growth rows", total - records.len());
        }
        Ok(records)
    }
}

/// IREAD administration window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TestPeriod {
    Spring,
    Summer,
}

impl TestPeriod {
    pub const ALL: [Self; 2] = [Self::Spring, Self::Summer];

    /// Parse a period; anything that is not Spring is the Summer retest
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("spring") => Self::Spring,
            _ => Self::Summer,
        }
    }
}

impl fmt::Display for TestPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spring => f.write_str("Spring"),
            Self::Summer => f.write_str("Summer"),
        }
    }
}

/// IREAD result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IreadStatus {
    Pass,
    DidNotPass,
    NoResult,
}

impl IreadStatus {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("pass") => Self::Pass,
            Some("did not pass") => Self::DidNotPass,
            _ => Self::NoResult,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::DidNotPass => "Did Not Pass",
            Self::NoResult => "No Result",
        }
    }
}

/// One IREAD administration for one student
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IreadRecord {
    pub stn: String,
    pub year: u16,
    pub period: TestPeriod,
    pub tested_grade: Option<Grade>,
    pub current_grade: Option<Grade>,
    pub status: IreadStatus,
    pub exempt: bool,
}

#[derive(Debug, Deserialize)]
struct RawIreadRow {
    #[serde(rename = "STN", default)]
    stn: Option<String>,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "TestPeriod", default)]
    period: Option<String>,
    #[serde(rename = "TestedGrade", default)]
    tested_grade: Option<String>,
    #[serde(rename = "CurrentGrade", default)]
    current_grade: Option<String>,
    #[serde(rename = "Status", default)]
    status: Option<String>,
    #[serde(rename = "ExemptionStatus", default)]
    exemption: Option<String>,
}

impl IreadRecord {
    pub fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let rows: Vec<RawIreadRow> = serde_arrow::from_record_batch(batch)?;
        let mut records = Vec::with_capacity(rows.len());
        for raw in rows {
            let (Some(stn), Some(year)) = (non_empty(raw.stn), raw.year) else {
                continue;
            };
            records.push(Self {
                stn,
                year: parse_year(&year)?,
                period: TestPeriod::parse(raw.period.as_deref()),
                tested_grade: raw.tested_grade.as_deref().and_then(|g| g.parse().ok()),
                current_grade: raw.current_grade.as_deref().and_then(|g| g.parse().ok()),
                status: IreadStatus::parse(raw.status.as_deref()),
                exempt: raw
                    .exemption
                    .as_deref()
                    .is_some_and(|e| e.trim().eq_ignore_ascii_case("exemption")),
            });
        }
        Ok(records)
    }
}

/// One WIDA composite score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidaRecord {
    pub stn: String,
    pub year: u16,
    /// `None` for grades outside PK..12, including `12+/Adult`
    pub tested_grade: Option<Grade>,
    /// Composite overall proficiency level; negative values are dropped
    pub composite: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawWidaRow {
    #[serde(rename = "STN", default)]
    stn: Option<String>,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "TestedGrade", default)]
    tested_grade: Option<String>,
    #[serde(rename = "CompositeOverallProficiencyLevel", default)]
    composite: Option<String>,
}

impl WidaRecord {
    /// Decode WIDA rows, excluding `12+/Adult`
    pub fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let rows: Vec<RawWidaRow> = serde_arrow::from_record_batch(batch)?;
        let mut records = Vec::with_capacity(rows.len());
        for raw in rows {
            let (Some(stn), Some(year)) = (non_empty(raw.stn), raw.year) else {
                continue;
            };
            if raw
                .tested_grade
                .as_deref()
                .is_some_and(|g| g.trim().starts_with("12+"))
            {
                continue;
            }
            let composite = parse_float(raw.composite.as_deref());
            if composite.is_some_and(|v| v < 0.0) {
                log::debug!("Dropping negative WIDA composite for {stn} in {year}");
            }
            records.push(Self {
                stn,
                year: parse_year(&year)?,
                tested_grade: raw.tested_grade.as_deref().and_then(|g| g.parse().ok()),
                composite: composite.filter(|v| *v >= 0.0),
            });
        }
        Ok(records)
    }
}

/// STNs listed in the `school_stns` table
pub fn stns_from_batch(batch: &RecordBatch) -> Result<Vec<String>> {
    #[derive(Deserialize)]
    struct Row {
        #[serde(rename = "STN", default)]
        stn: Option<String>,
    }
    let rows: Vec<Row> = serde_arrow::from_record_batch(batch)?;
    Ok(rows.into_iter().filter_map(|r| non_empty(r.stn)).collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test::batch_from_columns;

    #[test]
    fn wida_excludes_adult_and_negative_scores() {
        let batch = batch_from_columns(&[
            ("STN", vec![Some("1"), Some("2"), Some("3")]),
            ("Year", vec![Some("2023"), Some("2023"), Some("2023")]),
            ("TestedGrade", vec![Some("3"), Some("12+/Adult"), Some("4")]),
            ("CompositeOverallProficiencyLevel", vec![Some("3.2"), Some("4.0"), Some("-1")]),
        ]);
        let records = WidaRecord::from_batch(&batch).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].composite, Some(3.2));
        assert_eq!(records[1].composite, None);
    }

    #[test]
    fn iread_defaults_missing_period_to_summer() {
        let batch = batch_from_columns(&[
            ("STN", vec![Some("1"), Some("2")]),
            ("Year", vec![Some("2023"), Some("2023")]),
            ("TestPeriod", vec![Some("Spring"), None]),
            ("Status", vec![Some("Pass"), Some("Did Not Pass")]),
            ("ExemptionStatus", vec![None, Some("Exemption")]),
        ]);
        let records = IreadRecord::from_batch(&batch).unwrap();
        assert_eq!(records[0].period, TestPeriod::Spring);
        assert_eq!(records[1].period, TestPeriod::Summer);
        assert_eq!(records[1].status, IreadStatus::DidNotPass);
        assert!(records[1].exempt);
    }

    #[test]
    fn growth_skips_rows_without_level() {
        let batch = batch_from_columns(&[
            ("STN", vec![Some("1"), Some("2")]),
            ("TestYear", vec![Some("2023"), Some("2023")]),
            ("Subject", vec![Some("ELA"), Some("Math")]),
            ("ILEARNGrowthLevel", vec![Some("Adequate Growth"), None]),
            ("ILEARNGrowthPercentile", vec![Some("55"), Some("40")]),
            ("Day162", vec![Some("True"), Some("False")]),
        ]);
        let records = GrowthRecord::from_batch(&batch).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, GrowthLevel::Adequate);
        assert!(records[0].day_162);
        assert_eq!(records[0].percentile, Some(55.0));
    }
}
