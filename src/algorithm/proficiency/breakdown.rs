//! Proficiency-band breakdown of the selected school
//!
//! Each `(Category, Subject)` is classified from its tested count and band
//! counts. Chartable rows become integer percentages that sum to exactly 100
//! via the largest-remainder method.

use serde::Serialize;

use crate::models::{AcademicRecord, Datum, Panel, PanelKind, Table};
use crate::schema::cell::Cell;
use crate::schema::columns::{Band, ColumnKey, Grouping, Measure, Subject, category_grade};

/// Guard against floating error when flooring exact shares such as `25.0`
const FLOOR_EPSILON: f64 = 1e-9;

/// Apportion `target` units across `values` by the largest-remainder method
///
/// Each value gets the floor of its proportional share; the leftover units go
/// to the largest fractional parts, ties broken by position. A non-positive
/// total yields all zeros.
#[must_use]
pub fn largest_remainder(values: &[f64], target: u32) -> Vec<u32> {
    let total: f64 = values.iter().filter(|v| v.is_finite() && **v > 0.0).sum();
    if total <= 0.0 {
        return vec![0; values.len()];
    }
    let shares: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() && *v > 0.0 { v * f64::from(target) / total } else { 0.0 })
        .collect();
    let mut allocated: Vec<u32> = shares
        .iter()
        .map(|s| (s + FLOOR_EPSILON).floor() as u32)
        .collect();
    let assigned: u32 = allocated.iter().sum();
    let mut remaining = target.saturating_sub(assigned);

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = shares[a] - f64::from(allocated[a]);
        let fb = shares[b] - f64::from(allocated[b]);
        fb.total_cmp(&fa).then(a.cmp(&b))
    });
    for idx in order.into_iter().cycle() {
        if remaining == 0 {
            break;
        }
        allocated[idx] += 1;
        remaining -= 1;
    }
    allocated
}

/// Classification of one `(Category, Subject)` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BandOutcome {
    /// Integer band percentages summing to 100
    Chartable(Vec<u32>),
    /// Some band is suppressed on a row that tested students
    InsufficientNSize { tested: Cell },
    /// Every band is a real zero
    NoData,
    /// Nothing published for the row
    Absent,
}

/// Classify a row from its tested count and band counts
#[must_use]
pub fn classify(tested: Cell, bands: &[Cell]) -> BandOutcome {
    if tested.is_missing() && bands.iter().all(Cell::is_missing) {
        return BandOutcome::Absent;
    }
    if bands.iter().any(Cell::is_suppressed) {
        // A suppressed tested count still means students sat the test
        return match tested {
            Cell::Value(t) if t <= 0.0 => BandOutcome::NoData,
            Cell::Missing => BandOutcome::NoData,
            _ => BandOutcome::InsufficientNSize { tested },
        };
    }
    if bands.iter().all(Cell::is_missing) {
        return match tested.value() {
            Some(t) if t > 0.0 => BandOutcome::Absent,
            _ => BandOutcome::NoData,
        };
    }
    let counts: Vec<f64> = bands.iter().map(|b| b.value().unwrap_or(0.0)).collect();
    let sum: f64 = counts.iter().sum();
    if sum <= 0.0 {
        return BandOutcome::NoData;
    }
    if let Some(t) = tested.value() {
        if (t - sum).abs() > 0.5 {
            log::warn!("Band counts sum to {sum} but {t} students were tested");
        }
    }
    BandOutcome::Chartable(largest_remainder(&counts, 100))
}

/// Stacked-bar breakdown of one subject over a list of categories
#[must_use]
pub fn breakdown_panel(
    record: &AcademicRecord,
    subject: Subject,
    categories: &[String],
    bands: &[Band],
    band_measure: fn(Band) -> Measure,
    title: impl Into<String>,
) -> Panel {
    let mut table = Table::new(
        std::iter::once("Category".to_string()).chain(bands.iter().map(|b| b.label().to_string())),
    );
    let mut annotations = Vec::new();
    let mut missing = Vec::new();

    for category in categories {
        let tested = record.get(&ColumnKey::tested(category.as_str(), subject));
        let band_cells: Vec<Cell> = bands
            .iter()
            .map(|b| record.get(&ColumnKey::new(category.as_str(), subject, band_measure(*b))))
            .collect();
        match classify(tested, &band_cells) {
            BandOutcome::Chartable(percents) => {
                let mut row = vec![Datum::from(category.as_str())];
                row.extend(percents.into_iter().map(|p| Datum::Number(f64::from(p))));
                table.push_row(row);
            }
            BandOutcome::InsufficientNSize { tested } => {
                annotations.push(format!("{category} (Tested: {tested})"));
                missing.push(category.clone());
            }
            BandOutcome::NoData => {
                if category_grade(category).is_none() {
                    annotations.push(format!("{category} (No Data)"));
                    missing.push(category.clone());
                }
            }
            BandOutcome::Absent => {}
        }
    }

    let mut panel = Panel::new(title, PanelKind::StackedBar, table).with_annotations(annotations);
    panel.missing_categories = missing;
    panel
}

/// Title of a breakdown panel
#[must_use]
pub fn breakdown_title(subject: Subject, grouping: Grouping) -> String {
    format!("{subject} Proficiency Breakdown by {grouping}")
}
