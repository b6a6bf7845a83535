//! Proficiency aggregation for the K8 and HS academic views
//!
//! The single-year flow is: reweight the corporation row to the selected
//! school's grade span, concatenate `[selected, corporation, peers]`, drop every
//! column the selected school is missing, then project the frame onto each
//! panel. Multi-year information reuses the same records year by year.

pub mod breakdown;
pub mod corporation;
pub mod hs;
pub mod panels;
pub mod trend;

pub use breakdown::{BandOutcome, breakdown_panel, classify, largest_remainder};
pub use corporation::{reweight_corporation, span_proficiency};
pub use panels::{PanelSpec, comparison_panel};
pub use trend::{info_table, multi_year_panel, trend_line, year_window};

use crate::models::{AcademicFrame, AcademicRecord, GradeSpan, Panel, RowKind, SchoolType};
use crate::schema::columns::{Band, ColumnKey, Grouping, Measure, Subject, TOTAL};

/// Subjects of the K8 comparison panels
pub const K8_SUBJECTS: [Subject; 2] = [Subject::Ela, Subject::Math];

/// Groupings of the K8 comparison panels, in display order
pub const K8_GROUPINGS: [Grouping; 3] = [Grouping::Grade, Grouping::Ethnicity, Grouping::Subgroup];

/// Concatenate selected, corporation and peer rows and apply the
/// drop-null-for-selected rule
///
/// When `reweight_span` is given the corporation totals are first restricted
/// to that grade span. Returns the frame and the dropped columns.
#[must_use]
pub fn combine(
    mut selected: AcademicRecord,
    corporation: Option<AcademicRecord>,
    peers: Vec<AcademicRecord>,
    reweight_span: Option<GradeSpan>,
) -> (AcademicFrame, Vec<ColumnKey>) {
    selected.meta.kind = RowKind::Selected;
    let mut rows = Vec::with_capacity(peers.len() + 2);
    rows.push(selected);
    if let Some(mut corp) = corporation {
        corp.meta.kind = RowKind::Corporation;
        if let Some(span) = reweight_span {
            reweight_corporation(&mut corp, span);
        }
        rows.push(corp);
    }
    rows.extend(peers.into_iter().map(|mut peer| {
        peer.meta.kind = RowKind::Peer;
        peer
    }));
    let mut frame = AcademicFrame::new(rows);
    let dropped = frame.drop_null_for_selected();
    (frame, dropped)
}

/// Comparison specs for the K8 view
#[must_use]
pub fn k8_specs(span: Option<GradeSpan>) -> Vec<PanelSpec> {
    let mut specs: Vec<PanelSpec> = K8_GROUPINGS
        .iter()
        .flat_map(|grouping| {
            K8_SUBJECTS
                .iter()
                .map(move |subject| PanelSpec::grouped(*subject, Measure::ProficientPct, *grouping, span))
        })
        .collect();
    specs.push(PanelSpec::new(
        "IREAD Proficiency",
        vec![(TOTAL.to_string(), ColumnKey::proficient(TOTAL, Subject::Iread))],
    ));
    specs
}

/// Comparison panels of a combined K8 frame
#[must_use]
pub fn k8_analysis(frame: &AcademicFrame, span: Option<GradeSpan>) -> Vec<Panel> {
    k8_specs(span)
        .iter()
        .map(|spec| comparison_panel(frame, spec))
        .collect()
}

/// Comparison panels of a combined HS frame
#[must_use]
pub fn hs_analysis(frame: &AcademicFrame, school_type: SchoolType) -> Vec<Panel> {
    hs::hs_specs(frame, school_type)
        .iter()
        .map(|spec| comparison_panel(frame, spec))
        .collect()
}

/// Band breakdown panels of the selected school's K8 row
#[must_use]
pub fn k8_breakdowns(selected: &AcademicRecord, span: Option<GradeSpan>) -> Vec<Panel> {
    let mut panels = Vec::new();
    for grouping in K8_GROUPINGS {
        for subject in K8_SUBJECTS {
            panels.push(breakdown_panel(
                selected,
                subject,
                &grouping.categories(span),
                &Band::PROFICIENCY,
                Measure::Proficiency,
                breakdown::breakdown_title(subject, grouping),
            ));
        }
    }
    panels
}

/// Benchmark breakdown panels of the selected school's HS row
#[must_use]
pub fn hs_breakdowns(selected: &AcademicRecord, school_type: SchoolType) -> Vec<Panel> {
    if school_type == SchoolType::AHS {
        return Vec::new();
    }
    let mut panels = Vec::new();
    for grouping in [Grouping::Total, Grouping::Ethnicity, Grouping::Subgroup] {
        for subject in hs::SAT_SUBJECTS {
            panels.push(breakdown_panel(
                selected,
                subject,
                &grouping.categories(None),
                &hs::SAT_BANDS,
                Measure::Benchmark,
                format!("{subject} Benchmark Breakdown by {grouping}"),
            ));
        }
    }
    panels
}

/// Multi-year K8 information: per-grouping tables and Total trend lines
///
/// Each corporation year is reweighted to the school's span for that year.
#[must_use]
pub fn k8_info(school: &[AcademicRecord], corporation: &[AcademicRecord], years: &[u16]) -> Vec<Panel> {
    let corporation: Vec<AcademicRecord> = corporation
        .iter()
        .map(|corp| {
            let mut corp = corp.clone();
            let span = school
                .iter()
                .find(|r| r.meta.year == corp.meta.year)
                .and_then(|r| r.meta.span());
            if let Some(span) = span {
                reweight_corporation(&mut corp, span);
            }
            corp
        })
        .collect();
    let span = school.iter().max_by_key(|r| r.meta.year).and_then(|r| r.meta.span());

    let mut panels: Vec<Panel> = k8_specs(span)
        .iter()
        .map(|spec| info_table(&spec.title, school, &corporation, &spec.columns, years))
        .collect();
    for subject in K8_SUBJECTS {
        panels.push(trend_line(
            &format!("{subject} Proficiency Trend"),
            school,
            &corporation,
            &ColumnKey::proficient(TOTAL, subject),
            years,
        ));
    }
    panels
}

/// Multi-year HS information: graduation and SAT tables plus trend lines
#[must_use]
pub fn hs_info(
    school: &[AcademicRecord],
    corporation: &[AcademicRecord],
    school_type: SchoolType,
    years: &[u16],
) -> Vec<Panel> {
    let corporation: &[AcademicRecord] = if hs::corporation_comparable(school_type) {
        corporation
    } else {
        &[]
    };
    let all_years = AcademicFrame::new(school.to_vec());
    let mut panels: Vec<Panel> = hs::hs_specs(&all_years, school_type)
        .iter()
        .map(|spec| info_table(&spec.title, school, corporation, &spec.columns, years))
        .collect();

    let (title, key) = match school_type {
        SchoolType::AHS => (
            "CCR Trend",
            ColumnKey::subjectless(crate::schema::columns::AHS, Measure::CcrPercent),
        ),
        _ => (
            "Graduation Rate Trend",
            ColumnKey::subjectless(TOTAL, Measure::GraduationRate),
        ),
    };
    panels.push(trend_line(title, school, corporation, &key, years));
    panels
}
