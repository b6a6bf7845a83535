//! WIDA composite averages over a school's student universe

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

use crate::models::{Datum, Grade, IreadRecord, Panel, PanelKind, Table, WidaRecord};

/// Average composite per `(Year, TestedGrade)` and per `Year`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidaSummary {
    pub by_grade: BTreeMap<(u16, Grade), f64>,
    pub by_year: BTreeMap<u16, f64>,
}

/// STNs seen in the school's IREAD records or ILEARN enrollment
#[must_use]
pub fn stn_universe(iread: &[IreadRecord], ilearn_stns: &[String]) -> FxHashSet<String> {
    iread
        .iter()
        .map(|r| r.stn.clone())
        .chain(ilearn_stns.iter().cloned())
        .collect()
}

#[derive(Default)]
struct Mean {
    sum: f64,
    n: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.n += 1;
    }

    fn get(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

/// Average composites of the records whose STN is in `universe`
///
/// Records without a grade or without a usable composite are skipped.
#[must_use]
pub fn summarize(records: &[WidaRecord], universe: &FxHashSet<String>) -> WidaSummary {
    let mut by_grade: BTreeMap<(u16, Grade), Mean> = BTreeMap::new();
    let mut by_year: BTreeMap<u16, Mean> = BTreeMap::new();
    for record in records.iter().filter(|r| universe.contains(&r.stn)) {
        let Some(score) = record.composite else {
            continue;
        };
        by_year.entry(record.year).or_default().push(score);
        if let Some(grade) = record.tested_grade {
            by_grade.entry((record.year, grade)).or_default().push(score);
        }
    }
    WidaSummary {
        by_grade: by_grade
            .into_iter()
            .filter_map(|(k, m)| Some((k, m.get()?)))
            .collect(),
        by_year: by_year
            .into_iter()
            .filter_map(|(k, m)| Some((k, m.get()?)))
            .collect(),
    }
}

/// Table of grade rows plus a `School Average` row, one column per year
#[must_use]
pub fn wida_panel(summary: &WidaSummary, years: &[u16]) -> Panel {
    let title = "WIDA Composite Proficiency";
    if summary.by_year.is_empty() {
        return Panel::empty(title, PanelKind::Table);
    }
    let mut grades: Vec<Grade> = summary.by_grade.keys().map(|(_, g)| *g).collect();
    grades.sort_unstable();
    grades.dedup();

    let mut table = Table::new(std::iter::once("Grade".to_string()).chain(years.iter().map(u16::to_string)));
    for grade in grades {
        let mut row = vec![Datum::from(format!("Grade {grade}"))];
        row.extend(
            years
                .iter()
                .map(|y| Datum::from(summary.by_grade.get(&(*y, grade)).copied())),
        );
        table.push_row(row);
    }
    let mut total = vec![Datum::from("School Average")];
    total.extend(years.iter().map(|y| Datum::from(summary.by_year.get(y).copied())));
    table.push_row(total);
    Panel::new(title, PanelKind::Table, table)
}
