//! Typed column index for academic tables.
//!
//! Academic tables name their value columns `"{Category}|{Subject} {Measure}"`
//! (or `"{Category}|{Measure}"` for graduation and CCR families). A
//! [`ColumnKey`] is the parsed form of such a name and is the key every frame,
//! panel and annotation shares, so no code outside this module builds or
//! splits column strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::school::{Grade, GradeSpan};

/// Metadata column names shared by the academic, corporation and geo tables
pub mod meta {
    pub const YEAR: &str = "Year";
    pub const SCHOOL_ID: &str = "SchoolID";
    pub const SCHOOL_NAME: &str = "SchoolName";
    pub const SCHOOL_TYPE: &str = "SchoolType";
    pub const CORPORATION_ID: &str = "CorporationID";
    pub const CORPORATION_NAME: &str = "CorporationName";
    pub const LOW_GRADE: &str = "LowGrade";
    pub const HIGH_GRADE: &str = "HighGrade";
}

/// Category name for whole-school totals
pub const TOTAL: &str = "Total";
/// Category name for the non-waiver graduation cohort
pub const NON_WAIVER: &str = "Non Waiver";
/// Category name for adult high school CCR columns
pub const AHS: &str = "AHS";

/// Ethnicity categories in display order
pub const ETHNICITIES: [&str; 7] = [
    "American Indian",
    "Asian",
    "Black",
    "Hispanic",
    "Multiracial",
    "Native Hawaiian or Other Pacific Islander",
    "White",
];

/// Subgroup categories in display order
pub const SUBGROUPS: [&str; 6] = [
    "Paid Meals",
    "Free or Reduced Price Meals",
    "General Education",
    "Special Education",
    "English Language Learners",
    "Non English Language Learners",
];

/// Grades with state standardized tests (ILEARN)
pub const TESTED_GRADES: [u8; 6] = [3, 4, 5, 6, 7, 8];

/// Category label for a tested grade
#[must_use]
pub fn grade_category(grade: u8) -> String {
    format!("Grade {grade}")
}

/// Parse `"Grade N"` back to its grade number
#[must_use]
pub fn category_grade(category: &str) -> Option<u8> {
    category.strip_prefix("Grade ")?.trim().parse().ok()
}

/// Assessment subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "ELA")]
    Ela,
    Math,
    #[serde(rename = "IREAD")]
    Iread,
    /// SAT Evidence-Based Reading and Writing
    #[serde(rename = "EBRW")]
    Ebrw,
    /// SAT total score
    Total,
    /// SAT benchmark in both EBRW and Math
    Both,
}

impl Subject {
    pub const ALL: [Self; 6] = [
        Self::Ela,
        Self::Math,
        Self::Iread,
        Self::Ebrw,
        Self::Total,
        Self::Both,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ela => "ELA",
            Self::Math => "Math",
            Self::Iread => "IREAD",
            Self::Ebrw => "EBRW",
            Self::Total => "Total",
            Self::Both => "Both",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Subject {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|subject| subject.label() == s)
            .ok_or(())
    }
}

/// Performance band of a band-count column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    Below,
    Approaching,
    At,
    Above,
}

impl Band {
    /// ILEARN proficiency bands, lowest first
    pub const PROFICIENCY: [Self; 4] = [Self::Below, Self::Approaching, Self::At, Self::Above];
    /// SAT benchmark bands, lowest first
    pub const BENCHMARK: [Self; 3] = [Self::Below, Self::Approaching, Self::At];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Below => "Below",
            Self::Approaching => "Approaching",
            Self::At => "At",
            Self::Above => "Above",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::PROFICIENCY.into_iter().find(|band| band.label() == s)
    }
}

/// What a value column measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Measure {
    /// `Proficient %` (fraction of tested students at or above proficiency)
    ProficientPct,
    /// `Total Tested`
    TotalTested,
    /// `Total Proficient`
    TotalProficient,
    /// `{Band} Proficiency` student count
    Proficiency(Band),
    /// `Benchmark %` (SAT)
    BenchmarkPct,
    /// `{Band} Benchmark` student count (SAT)
    Benchmark(Band),
    /// `Graduation Rate`
    GraduationRate,
    /// `Cohort Count`
    CohortCount,
    /// `Graduates`
    Graduates,
    /// `CCR Percent` (adult high school)
    CcrPercent,
    /// `CCR Count` (adult high school)
    CcrCount,
}

const SUBJECTLESS: [(Measure, &str); 5] = [
    (Measure::GraduationRate, "Graduation Rate"),
    (Measure::CohortCount, "Cohort Count"),
    (Measure::Graduates, "Graduates"),
    (Measure::CcrPercent, "CCR Percent"),
    (Measure::CcrCount, "CCR Count"),
];

impl Measure {
    /// Whether the column name carries a subject
    #[must_use]
    pub const fn has_subject(self) -> bool {
        !matches!(
            self,
            Self::GraduationRate
                | Self::CohortCount
                | Self::Graduates
                | Self::CcrPercent
                | Self::CcrCount
        )
    }

    /// Whether the measure is a rate (fraction) rather than a count
    #[must_use]
    pub const fn is_rate(self) -> bool {
        matches!(
            self,
            Self::ProficientPct | Self::BenchmarkPct | Self::GraduationRate | Self::CcrPercent
        )
    }

    /// Column-name text of the measure
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::ProficientPct => "Proficient %".to_string(),
            Self::TotalTested => "Total Tested".to_string(),
            Self::TotalProficient => "Total Proficient".to_string(),
            Self::Proficiency(band) => format!("{} Proficiency", band.label()),
            Self::BenchmarkPct => "Benchmark %".to_string(),
            Self::Benchmark(band) => format!("{} Benchmark", band.label()),
            other => SUBJECTLESS
                .iter()
                .find(|(m, _)| *m == other)
                .map(|(_, label)| (*label).to_string())
                .unwrap_or_default(),
        }
    }

    /// Split `"{Subject} {Measure}"` into its parts
    fn parse_with_subject(rest: &str) -> Option<(Subject, Self)> {
        const FIXED: [(&str, Measure); 4] = [
            (" Proficient %", Measure::ProficientPct),
            (" Total Tested", Measure::TotalTested),
            (" Total Proficient", Measure::TotalProficient),
            (" Benchmark %", Measure::BenchmarkPct),
        ];
        for (suffix, measure) in FIXED {
            if let Some(subject) = rest.strip_suffix(suffix) {
                return Some((subject.parse().ok()?, measure));
            }
        }
        for (suffix, wrap) in [
            (" Proficiency", Measure::Proficiency as fn(Band) -> Measure),
            (" Benchmark", Measure::Benchmark as fn(Band) -> Measure),
        ] {
            if let Some(head) = rest.strip_suffix(suffix) {
                let (subject, band) = head.rsplit_once(' ')?;
                return Some((subject.parse().ok()?, wrap(Band::parse(band)?)));
            }
        }
        None
    }
}

/// Parsed academic column name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnKey {
    pub category: String,
    pub subject: Option<Subject>,
    pub measure: Measure,
}

impl ColumnKey {
    #[must_use]
    pub fn new(category: impl Into<String>, subject: Subject, measure: Measure) -> Self {
        Self {
            category: category.into(),
            subject: Some(subject),
            measure,
        }
    }

    /// A subject-less key (graduation and CCR families)
    #[must_use]
    pub fn subjectless(category: impl Into<String>, measure: Measure) -> Self {
        Self {
            category: category.into(),
            subject: None,
            measure,
        }
    }

    #[must_use]
    pub fn proficient(category: impl Into<String>, subject: Subject) -> Self {
        Self::new(category, subject, Measure::ProficientPct)
    }

    #[must_use]
    pub fn tested(category: impl Into<String>, subject: Subject) -> Self {
        Self::new(category, subject, Measure::TotalTested)
    }

    /// The same category and subject under a different measure
    #[must_use]
    pub fn with_measure(&self, measure: Measure) -> Self {
        Self {
            category: self.category.clone(),
            subject: if measure.has_subject() { self.subject } else { None },
            measure,
        }
    }

    /// Parse a column name; `None` when it is not an academic value column
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let (category, rest) = name.split_once('|')?;
        let category = category.trim();
        if category.is_empty() {
            return None;
        }
        if let Some((measure, _)) = SUBJECTLESS.iter().find(|(_, label)| *label == rest) {
            return Some(Self::subjectless(category, *measure));
        }
        let (subject, measure) = Measure::parse_with_subject(rest)?;
        Some(Self::new(category, subject, measure))
    }

    /// Column name as published
    #[must_use]
    pub fn name(&self) -> String {
        match self.subject {
            Some(subject) => format!("{}|{} {}", self.category, subject, self.measure.label()),
            None => format!("{}|{}", self.category, self.measure.label()),
        }
    }

    /// Short label used in annotations, e.g. `Grade 3|ELA`
    #[must_use]
    pub fn short_label(&self) -> String {
        match self.subject {
            Some(subject) => format!("{}|{}", self.category, subject),
            None => self.category.clone(),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Category grouping used by the chart panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grouping {
    Grade,
    Ethnicity,
    Subgroup,
    Total,
}

impl Grouping {
    pub const ALL: [Self; 4] = [Self::Grade, Self::Ethnicity, Self::Subgroup, Self::Total];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Grade => "Grade",
            Self::Ethnicity => "Ethnicity",
            Self::Subgroup => "Subgroup",
            Self::Total => "Total",
        }
    }

    /// Categories of this grouping, restricted to a grade span for grades
    #[must_use]
    pub fn categories(self, span: Option<GradeSpan>) -> Vec<String> {
        match self {
            Self::Grade => TESTED_GRADES
                .iter()
                .filter(|g| span.is_none_or(|s| s.contains(Grade::Numbered(**g))))
                .map(|g| grade_category(*g))
                .collect(),
            Self::Ethnicity => ETHNICITIES.iter().map(ToString::to_string).collect(),
            Self::Subgroup => SUBGROUPS.iter().map(ToString::to_string).collect(),
            Self::Total => vec![TOTAL.to_string()],
        }
    }

    /// Grouping a category belongs to
    #[must_use]
    pub fn of_category(category: &str) -> Option<Self> {
        if category_grade(category).is_some() {
            Some(Self::Grade)
        } else if ETHNICITIES.contains(&category) {
            Some(Self::Ethnicity)
        } else if SUBGROUPS.contains(&category) {
            Some(Self::Subgroup)
        } else if category == TOTAL {
            Some(Self::Total)
        } else {
            None
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
