//! High school panel sets: SAT benchmarks, graduation rates and AHS CCR

use crate::models::{AcademicFrame, SchoolType};
use crate::schema::columns::{AHS, Band, ColumnKey, Grouping, Measure, NON_WAIVER, Subject, TOTAL};

use super::panels::PanelSpec;

/// SAT subjects charted by grouping
pub const SAT_SUBJECTS: [Subject; 3] = [Subject::Ebrw, Subject::Math, Subject::Total];

/// Graduation categories shown as the school-total panel
pub const GRADUATION_CATEGORIES: [&str; 2] = [TOTAL, NON_WAIVER];

/// SAT benchmark bands, used by the breakdown panels
pub const SAT_BANDS: [Band; 3] = Band::BENCHMARK;

/// Comparison specs for a high school view
///
/// `School Total|Both` is only charted when the frame carries it. Adult high
/// schools get a single CCR panel.
#[must_use]
pub fn hs_specs(frame: &AcademicFrame, school_type: SchoolType) -> Vec<PanelSpec> {
    if school_type == SchoolType::AHS {
        return vec![PanelSpec::subjectless(
            "College and Career Readiness",
            Measure::CcrPercent,
            [AHS],
        )];
    }

    let mut specs = vec![PanelSpec::subjectless(
        "Graduation Rate",
        Measure::GraduationRate,
        GRADUATION_CATEGORIES,
    )];
    for grouping in [Grouping::Ethnicity, Grouping::Subgroup] {
        specs.push(PanelSpec::subjectless(
            format!("Graduation Rate by {grouping}"),
            Measure::GraduationRate,
            grouping.categories(None),
        ));
    }

    let columns = frame.columns();
    let mut totals: Vec<(String, ColumnKey)> = SAT_SUBJECTS
        .iter()
        .map(|s| (s.label().to_string(), ColumnKey::new(TOTAL, *s, Measure::BenchmarkPct)))
        .collect();
    let both = ColumnKey::new(TOTAL, Subject::Both, Measure::BenchmarkPct);
    if columns.contains(&both) {
        totals.push((Subject::Both.label().to_string(), both));
    }
    specs.push(PanelSpec::new("SAT Benchmark - School Total", totals));

    for grouping in [Grouping::Ethnicity, Grouping::Subgroup] {
        for subject in SAT_SUBJECTS {
            specs.push(PanelSpec::grouped(subject, Measure::BenchmarkPct, grouping, None));
        }
    }
    specs
}

/// Whether the corporation row belongs in the comparison frame
#[must_use]
pub const fn corporation_comparable(school_type: SchoolType) -> bool {
    !matches!(school_type, SchoolType::AHS)
}
