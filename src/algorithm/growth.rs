//! ILEARN growth: adequate-growth share and median SGP
//!
//! Both aggregations (all majority-enrolled students, and the `Day162` subset)
//! are computed in one pass over `(TestYear, Category, Subject)` groups, so a
//! group in which nobody made adequate growth still yields a row with a zero
//! share.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;
use crate::models::{Datum, GrowthLevel, GrowthRecord, Panel, PanelKind, Table};
use crate::schema::columns::{ETHNICITIES, Subject, TESTED_GRADES, grade_category};

/// Student attribute growth results are broken down by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GrowthGrouping {
    #[default]
    GradeLevel,
    Ethnicity,
    SocioeconomicStatus,
    EnglishLearnerStatus,
    SpecialEducationStatus,
}

impl GrowthGrouping {
    pub const ALL: [Self; 5] = [
        Self::GradeLevel,
        Self::Ethnicity,
        Self::SocioeconomicStatus,
        Self::EnglishLearnerStatus,
        Self::SpecialEducationStatus,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GradeLevel => "Grade Level",
            Self::Ethnicity => "Ethnicity",
            Self::SocioeconomicStatus => "Socioeconomic Status",
            Self::EnglishLearnerStatus => "English Learner Status",
            Self::SpecialEducationStatus => "Special Education Status",
        }
    }

    /// Recognised categories, in display order
    #[must_use]
    pub fn whitelist(self) -> Vec<String> {
        let fixed: &[&str] = match self {
            Self::GradeLevel => {
                return TESTED_GRADES.iter().map(|g| grade_category(*g)).collect();
            }
            Self::Ethnicity => &ETHNICITIES,
            Self::SocioeconomicStatus => &["Free or Reduced Price Meals", "Paid Meals"],
            Self::EnglishLearnerStatus => &["English Learner", "Non-English Learner"],
            Self::SpecialEducationStatus => &["Special Education", "General Education"],
        };
        fixed.iter().map(ToString::to_string).collect()
    }

    /// Category of one record under this grouping
    #[must_use]
    pub fn category(self, record: &GrowthRecord) -> Option<String> {
        match self {
            Self::GradeLevel => record
                .tested_grade
                .and_then(|g| g.number())
                .map(grade_category),
            Self::Ethnicity => record.ethnicity.clone(),
            Self::SocioeconomicStatus => record.socioeconomic_status.clone(),
            Self::EnglishLearnerStatus => record.english_learner_status.clone(),
            Self::SpecialEducationStatus => record.special_education_status.clone(),
        }
    }
}

impl fmt::Display for GrowthGrouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GrowthGrouping {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|g| g.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| DashboardError::Conversion(format!("Unknown growth grouping '{s}'")))
    }
}

/// Which growth figure a panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GrowthMetric {
    AdequateGrowth,
    MedianSgp,
}

impl GrowthMetric {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AdequateGrowth => "Adequate Growth",
            Self::MedianSgp => "Median SGP",
        }
    }
}

/// Figures of one student population within a group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthFigures {
    pub students: usize,
    pub adequate_share: f64,
    pub not_adequate_share: f64,
    pub median_sgp: Option<f64>,
}

impl GrowthFigures {
    fn metric(&self, metric: GrowthMetric) -> Option<f64> {
        match metric {
            GrowthMetric::AdequateGrowth => Some(self.adequate_share),
            GrowthMetric::MedianSgp => self.median_sgp,
        }
    }
}

/// One `(TestYear, Category, Subject)` group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRow {
    pub year: u16,
    pub category: String,
    pub subject: Subject,
    pub majority_enrolled: GrowthFigures,
    pub day_162: Option<GrowthFigures>,
}

impl GrowthRow {
    /// `162 Days − Majority Enrolled` for a metric
    #[must_use]
    pub fn difference(&self, metric: GrowthMetric) -> Option<f64> {
        let day_162 = self.day_162?.metric(metric)?;
        Some(day_162 - self.majority_enrolled.metric(metric)?)
    }
}

#[derive(Default)]
struct Accumulator {
    adequate: usize,
    total: usize,
    percentiles: Vec<f64>,
}

impl Accumulator {
    fn push(&mut self, record: &GrowthRecord) {
        self.total += 1;
        if record.level == GrowthLevel::Adequate {
            self.adequate += 1;
        }
        if let Some(p) = record.percentile {
            self.percentiles.push(p);
        }
    }

    fn finish(mut self) -> Option<GrowthFigures> {
        if self.total == 0 {
            return None;
        }
        let adequate_share = self.adequate as f64 / self.total as f64;
        Some(GrowthFigures {
            students: self.total,
            adequate_share,
            not_adequate_share: (self.total - self.adequate) as f64 / self.total as f64,
            median_sgp: median(&mut self.percentiles),
        })
    }
}

/// Median of a sample; the mean of the middle pair for even sizes
#[must_use]
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Aggregate growth records by `(TestYear, Category, Subject)`
///
/// Categories outside the grouping's whitelist are dropped. Rows are ordered
/// by year, then whitelist order, then subject.
#[must_use]
pub fn growth_rows(records: &[GrowthRecord], grouping: GrowthGrouping) -> Vec<GrowthRow> {
    let whitelist = grouping.whitelist();
    let mut groups: BTreeMap<(u16, usize, Subject), (Accumulator, Accumulator)> = BTreeMap::new();
    let mut ignored = 0usize;
    for record in records {
        let position = grouping
            .category(record)
            .and_then(|c| whitelist.iter().position(|w| w.eq_ignore_ascii_case(c.trim())));
        let Some(position) = position else {
            ignored += 1;
            continue;
        };
        let (me, d162) = groups
            .entry((record.test_year, position, record.subject))
            .or_default();
        me.push(record);
        if record.day_162 {
            d162.push(record);
        }
    }
    if ignored > 0 {
        log::debug!("Ignored {ignored} growth records outside the {grouping} categories");
    }

    groups
        .into_iter()
        .filter_map(|((year, position, subject), (me, d162))| {
            Some(GrowthRow {
                year,
                category: whitelist[position].clone(),
                subject,
                majority_enrolled: me.finish()?,
                day_162: d162.finish(),
            })
        })
        .collect()
}

/// Series suffixes of a chart category, in column order
const CHART_SERIES: [&str; 3] = ["Majority Enrolled", "162 Days", "Difference"];

/// Chart frame: one row per year; per category, a Majority Enrolled, a
/// 162 Days and a Difference column
#[must_use]
pub fn growth_chart(rows: &[GrowthRow], subject: Subject, metric: GrowthMetric, grouping: GrowthGrouping) -> Panel {
    let title = format!("{subject} {} by {grouping}", metric.label());
    let subject_rows: Vec<&GrowthRow> = rows.iter().filter(|r| r.subject == subject).collect();
    if subject_rows.is_empty() {
        return Panel::empty(title, PanelKind::Line);
    }
    let categories: Vec<String> = grouping
        .whitelist()
        .into_iter()
        .filter(|c| subject_rows.iter().any(|r| &r.category == c))
        .collect();
    let mut years: Vec<u16> = subject_rows.iter().map(|r| r.year).collect();
    years.dedup();

    let headers = categories
        .iter()
        .flat_map(|c| CHART_SERIES.iter().map(move |series| format!("{c} {series}")));
    let mut table = Table::new(std::iter::once("Year".to_string()).chain(headers));
    for year in years {
        let mut row = vec![Datum::from(year)];
        for category in &categories {
            let found = subject_rows
                .iter()
                .find(|r| r.year == year && &r.category == category);
            row.push(found.and_then(|r| r.majority_enrolled.metric(metric)).into());
            row.push(found.and_then(|r| r.day_162?.metric(metric)).into());
            row.push(found.and_then(|r| r.difference(metric)).into());
        }
        table.push_row(row);
    }
    Panel::new(title, PanelKind::Line, table)
}

/// Table frame: one row per category, `{Year}` metric columns newest first
#[must_use]
pub fn growth_table(rows: &[GrowthRow], subject: Subject, metric: GrowthMetric, grouping: GrowthGrouping) -> Panel {
    let title = format!("{subject} {} ({grouping})", metric.label());
    let subject_rows: Vec<&GrowthRow> = rows.iter().filter(|r| r.subject == subject).collect();
    if subject_rows.is_empty() {
        return Panel::empty(title, PanelKind::Table);
    }
    let mut years: Vec<u16> = subject_rows.iter().map(|r| r.year).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();

    let mut headers = vec!["Category".to_string()];
    for year in &years {
        headers.push(format!("{year} Majority Enrolled"));
        headers.push(format!("{year} 162 Days"));
        headers.push(format!("{year} Difference"));
    }
    let mut table = Table::new(headers);
    for category in grouping.whitelist() {
        if !subject_rows.iter().any(|r| r.category == category) {
            continue;
        }
        let mut row = vec![Datum::from(category.as_str())];
        for year in &years {
            let found = subject_rows
                .iter()
                .find(|r| r.year == *year && r.category == category);
            row.push(found.and_then(|r| r.majority_enrolled.metric(metric)).into());
            row.push(found.and_then(|r| r.day_162?.metric(metric)).into());
            row.push(found.and_then(|r| r.difference(metric)).into());
        }
        table.push_row(row);
    }
    Panel::new(title, PanelKind::Table, table)
}

/// Chart and table panels for ELA and Math
#[must_use]
pub fn growth_panels(records: &[GrowthRecord], grouping: GrowthGrouping) -> Vec<Panel> {
    let rows = growth_rows(records, grouping);
    let mut panels = Vec::new();
    for subject in [Subject::Ela, Subject::Math] {
        for metric in [GrowthMetric::AdequateGrowth, GrowthMetric::MedianSgp] {
            panels.push(growth_chart(&rows, subject, metric, grouping));
            panels.push(growth_table(&rows, subject, metric, grouping));
        }
    }
    panels
}
