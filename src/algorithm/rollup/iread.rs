//! Per-school multi-year IREAD breakdown

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::models::{AcademicRecord, Datum, Grade, IreadRecord, IreadStatus, Panel, PanelKind, Table, TestPeriod};
use crate::schema::cell::Cell;
use crate::schema::columns::{ColumnKey, Subject, TOTAL};

/// Status shares of one `(Year, TestPeriod)` cell of the grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub year: u16,
    pub period: TestPeriod,
    pub tested: usize,
    /// Share of students with `Pass`
    pub pass: f64,
    /// Share of students who passed or were exempted
    pub pass_with_exemption: f64,
}

/// Auxiliary yearly counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: u16,
    pub grade_2_tested: usize,
    pub grade_2_pass: Option<f64>,
    /// Non-passing students with an exemption
    pub exemptions: usize,
    /// Non-passing students found in grade 4 the next year
    pub advanced_without_passing: usize,
    /// Non-passing students found in grade 3 again the next year
    pub retained: usize,
    /// School-level `Total|IREAD Proficient %`
    pub school_proficiency: Cell,
}

/// Complete `(Year × TestPeriod)` grid of pass shares
///
/// Every year gets a Spring and a Summer cell; a period nobody sat is zero.
#[must_use]
pub fn period_grid(records: &[IreadRecord]) -> Vec<PeriodSummary> {
    let mut counts: BTreeMap<(u16, TestPeriod), (usize, usize, usize)> = BTreeMap::new();
    let years: FxHashSet<u16> = records.iter().map(|r| r.year).collect();
    for year in &years {
        for period in TestPeriod::ALL {
            counts.insert((*year, period), (0, 0, 0));
        }
    }
    for record in records {
        let entry = counts.entry((record.year, record.period)).or_default();
        entry.0 += 1;
        if record.status == IreadStatus::Pass {
            entry.1 += 1;
            entry.2 += 1;
        } else if record.exempt {
            entry.2 += 1;
        }
    }
    counts
        .into_iter()
        .map(|((year, period), (tested, pass, with_exemption))| {
            let share = |n: usize| if tested == 0 { 0.0 } else { n as f64 / tested as f64 };
            PeriodSummary {
                year,
                period,
                tested,
                pass: share(pass),
                pass_with_exemption: share(with_exemption),
            }
        })
        .collect()
}

/// Students without a `Pass` in any period of a year
fn non_passing(records: &[IreadRecord]) -> FxHashMap<u16, FxHashSet<&str>> {
    let mut passed: FxHashSet<(u16, &str)> = FxHashSet::default();
    for record in records.iter().filter(|r| r.status == IreadStatus::Pass) {
        passed.insert((record.year, record.stn.as_str()));
    }
    let mut result: FxHashMap<u16, FxHashSet<&str>> = FxHashMap::default();
    for record in records {
        if !passed.contains(&(record.year, record.stn.as_str())) {
            result.entry(record.year).or_default().insert(record.stn.as_str());
        }
    }
    result
}

fn grade_of(record: &IreadRecord) -> Option<Grade> {
    record.current_grade.or(record.tested_grade)
}

/// Auxiliary yearly rows, joined with the school-level IREAD proficiency
#[must_use]
pub fn year_summaries(records: &[IreadRecord], school_rows: &[AcademicRecord]) -> Vec<YearSummary> {
    let failing = non_passing(records);
    let mut years: Vec<u16> = records.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();

    years
        .into_iter()
        .map(|year| {
            let in_year = || records.iter().filter(move |r| r.year == year);
            let grade_2: Vec<&IreadRecord> = in_year()
                .filter(|r| r.tested_grade == Some(Grade::Numbered(2)))
                .collect();
            let grade_2_pass = (!grade_2.is_empty()).then(|| {
                grade_2.iter().filter(|r| r.status == IreadStatus::Pass).count() as f64
                    / grade_2.len() as f64
            });

            let empty = FxHashSet::default();
            let failed = failing.get(&year).unwrap_or(&empty);
            let exempted: FxHashSet<&str> = in_year()
                .filter(|r| r.exempt && failed.contains(r.stn.as_str()))
                .map(|r| r.stn.as_str())
                .collect();
            let next_year_grade = |grade: Grade| -> FxHashSet<&str> {
                records
                    .iter()
                    .filter(|r| r.year == year + 1 && grade_of(r) == Some(grade))
                    .map(|r| r.stn.as_str())
                    .filter(|stn| failed.contains(stn))
                    .collect()
            };
            let in_grade_3_now: FxHashSet<&str> = in_year()
                .filter(|r| grade_of(r) == Some(Grade::Numbered(3)))
                .map(|r| r.stn.as_str())
                .collect();
            let retained = next_year_grade(Grade::Numbered(3))
                .intersection(&in_grade_3_now)
                .count();

            let school_proficiency = school_rows
                .iter()
                .find(|r| r.meta.year == year)
                .map(|r| r.get(&ColumnKey::proficient(TOTAL, Subject::Iread)))
                .unwrap_or_default();

            YearSummary {
                year,
                grade_2_tested: grade_2.len(),
                grade_2_pass,
                exemptions: exempted.len(),
                advanced_without_passing: next_year_grade(Grade::Numbered(4)).len(),
                retained,
                school_proficiency,
            }
        })
        .collect()
}

/// IREAD breakdown table: one row per measure, one column per year (newest first)
#[must_use]
pub fn iread_panel(records: &[IreadRecord], school_rows: &[AcademicRecord], years: &[u16]) -> Panel {
    let title = "IREAD Breakdown";
    if records.is_empty() {
        return Panel::empty(title, PanelKind::Table);
    }
    let grid = period_grid(records);
    let yearly = year_summaries(records, school_rows);

    let mut table = Table::new(std::iter::once("Category".to_string()).chain(years.iter().map(u16::to_string)));
    for period in TestPeriod::ALL {
        let cell = |year: u16, f: fn(&PeriodSummary) -> f64| -> Datum {
            grid.iter()
                .find(|g| g.year == year && g.period == period)
                .map(f)
                .into()
        };
        let mut pass = vec![Datum::from(format!("{period} Pass %"))];
        let mut exempt = vec![Datum::from(format!("{period} Pass + Exemption %"))];
        let mut tested = vec![Datum::from(format!("{period} Tested"))];
        for year in years {
            pass.push(cell(*year, |g| g.pass));
            exempt.push(cell(*year, |g| g.pass_with_exemption));
            tested.push(cell(*year, |g| g.tested as f64));
        }
        table.push_row(pass);
        table.push_row(exempt);
        table.push_row(tested);
    }

    type Extract = fn(&YearSummary) -> Datum;
    let aux: [(&str, Extract); 6] = [
        ("School IREAD Proficiency", |y| y.school_proficiency.into()),
        ("Grade 2 Tested", |y| y.grade_2_tested.into()),
        ("Grade 2 Pass %", |y| y.grade_2_pass.into()),
        ("Exemptions", |y| y.exemptions.into()),
        ("Advanced Without Passing", |y| y.advanced_without_passing.into()),
        ("Retained", |y| y.retained.into()),
    ];
    for (label, extract) in aux {
        let mut row = vec![Datum::from(label)];
        row.extend(years.iter().map(|year| {
            yearly
                .iter()
                .find(|y| y.year == *year)
                .map(extract)
                .unwrap_or_default()
        }));
        table.push_row(row);
    }
    Panel::new(title, PanelKind::Table, table)
}
