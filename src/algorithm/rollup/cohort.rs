//! Joining IREAD results to WIDA composites by student

use std::collections::BTreeMap;

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::models::{Datum, IreadRecord, IreadStatus, Panel, PanelKind, Table, WidaRecord};

/// An IREAD result paired with a WIDA score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortMatch {
    pub stn: String,
    pub iread_year: u16,
    pub status: IreadStatus,
    pub wida_year: u16,
    pub composite: Option<f64>,
}

/// Aggregate of one `(IREAD Year, IREAD Status)` group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSummary {
    pub year: u16,
    pub status: IreadStatus,
    pub mean_composite: Option<f64>,
    pub matched: usize,
    pub pass_rate: f64,
}

/// Pair each IREAD record with a WIDA record of the same student
///
/// A same-year WIDA record wins. When the student's latest WIDA year precedes
/// the IREAD year, that latest record is attached instead. Students with WIDA
/// records only after the IREAD year stay unmatched.
#[must_use]
pub fn match_cohort(iread: &[IreadRecord], wida: &[WidaRecord]) -> Vec<CohortMatch> {
    let mut by_student: FxHashMap<&str, Vec<&WidaRecord>> = FxHashMap::default();
    for record in wida {
        by_student.entry(record.stn.as_str()).or_default().push(record);
    }

    iread
        .iter()
        .filter_map(|record| {
            let scores = by_student.get(record.stn.as_str())?;
            let same_year = scores.iter().find(|w| w.year == record.year);
            let latest = scores.iter().max_by_key(|w| w.year)?;
            let chosen = match same_year {
                Some(w) => *w,
                None if latest.year < record.year => *latest,
                None => return None,
            };
            Some(CohortMatch {
                stn: record.stn.clone(),
                iread_year: record.year,
                status: record.status,
                wida_year: chosen.year,
                composite: chosen.composite,
            })
        })
        .collect()
}

/// Aggregate matches by `(IREAD Year, IREAD Status)`
#[must_use]
pub fn summarize_cohort(matches: &[CohortMatch]) -> Vec<CohortSummary> {
    let mut groups: BTreeMap<(u16, &str), Vec<&CohortMatch>> = BTreeMap::new();
    for m in matches {
        groups.entry((m.iread_year, m.status.label())).or_default().push(m);
    }
    groups
        .into_values()
        .filter_map(|group| {
            let first = group.first()?;
            let scores: Vec<f64> = group.iter().filter_map(|m| m.composite).collect();
            let passed = group.iter().filter(|m| m.status == IreadStatus::Pass).count();
            Some(CohortSummary {
                year: first.iread_year,
                status: first.status,
                mean_composite: (!scores.is_empty())
                    .then(|| scores.iter().sum::<f64>() / scores.len() as f64),
                matched: group.len(),
                pass_rate: passed as f64 / group.len() as f64,
            })
        })
        .collect()
}

/// Table of cohort summaries, newest year first
#[must_use]
pub fn cohort_panel(summaries: &[CohortSummary]) -> Panel {
    let mut table = Table::new(["Year", "IREAD Status", "Avg WIDA Composite", "Matched Students", "Pass Rate"]);
    for s in summaries.iter().sorted_by(|a, b| b.year.cmp(&a.year)) {
        table.push_row(vec![
            Datum::from(s.year),
            Datum::from(s.status.label()),
            Datum::from(s.mean_composite),
            Datum::from(s.matched),
            Datum::from(s.pass_rate),
        ]);
    }
    Panel::new("IREAD Results by WIDA Composite", PanelKind::Table, table)
}
