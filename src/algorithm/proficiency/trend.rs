//! Multi-year academic tables and line panels

use indexmap::IndexMap;

use crate::models::{AcademicFrame, AcademicRecord, Datum, Panel, PanelKind, RowKind, Table};
use crate::schema::cell::Cell;
use crate::schema::columns::ColumnKey;

/// Most recent `window` years present in `records`, newest first
#[must_use]
pub fn year_window(records: &[AcademicRecord], up_to: u16, window: usize) -> Vec<u16> {
    let mut years: Vec<u16> = records
        .iter()
        .map(|r| r.meta.year)
        .filter(|y| *y <= up_to)
        .collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years.truncate(window);
    years
}

fn for_year(records: &[AcademicRecord], year: u16) -> Option<&AcademicRecord> {
    records.iter().find(|r| r.meta.year == year)
}

/// School against corporation, one row per category
///
/// Columns are `"{Year} School"`, `"{Year} Corp Avg"` and `"{Year} Diff"` for
/// each year in `years` (given newest first). Categories the school has no
/// value for in any year are left out and listed as missing.
#[must_use]
pub fn info_table(
    title: &str,
    school: &[AcademicRecord],
    corp: &[AcademicRecord],
    columns: &[(String, ColumnKey)],
    years: &[u16],
) -> Panel {
    let mut headers = vec!["Category".to_string()];
    for year in years {
        headers.push(format!("{year} School"));
        headers.push(format!("{year} Corp Avg"));
        headers.push(format!("{year} Diff"));
    }
    let mut table = Table::new(headers);
    let mut missing = Vec::new();

    for (label, key) in columns {
        let mut row = vec![Datum::from(label.as_str())];
        let mut any_school = false;
        for year in years {
            let school_cell = for_year(school, *year).map(|r| r.get(key)).unwrap_or_default();
            let corp_cell = for_year(corp, *year).map(|r| r.get(key)).unwrap_or_default();
            any_school |= !school_cell.is_missing();
            row.push(school_cell.into());
            row.push(corp_cell.into());
            row.push(school_cell.zip_with(corp_cell, |s, c| s - c).into());
        }
        if any_school {
            table.push_row(row);
        } else {
            missing.push(label.clone());
        }
    }

    let mut panel = Panel::new(title, PanelKind::Table, table);
    panel.missing_categories = missing;
    panel
}

/// Line of one column for school and corporation, oldest year first
#[must_use]
pub fn trend_line(
    title: &str,
    school: &[AcademicRecord],
    corp: &[AcademicRecord],
    key: &ColumnKey,
    years: &[u16],
) -> Panel {
    let mut table = Table::new(["Year", "School", "Corp Avg"]);
    let mut missing_years = Vec::new();
    for year in years.iter().rev() {
        let school_cell = for_year(school, *year).map(|r| r.get(key)).unwrap_or_default();
        if !school_cell.is_value() {
            missing_years.push(year.to_string());
            continue;
        }
        let corp_cell = for_year(corp, *year).map(|r| r.get(key)).unwrap_or_default();
        table.push_row(vec![Datum::from(*year), school_cell.into(), corp_cell.into()]);
    }
    let mut panel = Panel::new(title, PanelKind::Line, table);
    panel.missing_categories = missing_years;
    panel
}

struct Series {
    kind: RowKind,
    id: u32,
    name: String,
    cells: Vec<Cell>,
}

/// Year-over-year comparison of one column
///
/// `frames` holds one combined frame per year. Series follow each row's role
/// and id. When names collide the selected school keeps its name, the
/// corporation gets "(Corp)" and peers get their id appended. Years where
/// the selected school has no numeric value are skipped; comparison rows with
/// no numeric value in any kept year are dropped and reported in
/// `missing_schools`.
#[must_use]
pub fn multi_year_panel(frames: &[AcademicFrame], key: &ColumnKey) -> Panel {
    let title = format!("{} Year over Year", key.short_label());
    let mut series: IndexMap<(RowKind, u32), Series> = IndexMap::new();
    let mut years = Vec::new();
    let mut skipped = Vec::new();

    let mut ordered: Vec<&AcademicFrame> = frames.iter().collect();
    ordered.sort_by_key(|f| f.selected().map(|r| r.meta.year));

    for frame in ordered {
        let Some(selected) = frame.selected() else {
            continue;
        };
        let year = selected.meta.year;
        if !selected.get(key).is_value() {
            skipped.push(year.to_string());
            continue;
        }
        let slot = years.len();
        years.push(year);
        for row in &frame.rows {
            let entry = series.entry((row.meta.kind, row.meta.id)).or_insert_with(|| Series {
                kind: row.meta.kind,
                id: row.meta.id,
                name: row.meta.name.clone(),
                cells: Vec::new(),
            });
            entry.cells.resize(slot, Cell::Missing);
            entry.cells.push(row.get(key));
        }
    }

    if years.is_empty() {
        let mut panel = Panel::empty(title, PanelKind::Line);
        panel.missing_categories = skipped;
        return panel;
    }

    let mut missing_schools = Vec::new();
    series.retain(|_, s| {
        s.cells.resize(years.len(), Cell::Missing);
        let keep = s.kind == RowKind::Selected || s.cells.iter().any(Cell::is_value);
        if !keep {
            missing_schools.push(s.name.clone());
        }
        keep
    });

    let mut name_counts: IndexMap<&str, usize> = IndexMap::new();
    for s in series.values() {
        *name_counts.entry(s.name.as_str()).or_default() += 1;
    }
    let labels: Vec<String> = series
        .values()
        .map(|s| {
            let shared = name_counts.get(s.name.as_str()).is_some_and(|n| *n > 1);
            match s.kind {
                RowKind::Corporation if shared => format!("{} (Corp)", s.name),
                RowKind::Peer if shared => format!("{} ({})", s.name, s.id),
                _ => s.name.clone(),
            }
        })
        .collect();

    let mut table = Table::new(std::iter::once("Year".to_string()).chain(labels));
    for (idx, year) in years.iter().enumerate() {
        let mut row = vec![Datum::from(*year)];
        row.extend(series.values().map(|s| Datum::from(s.cells[idx])));
        table.push_row(row);
    }

    let mut panel = Panel::new(title, PanelKind::Line, table);
    panel.missing_categories = skipped;
    panel.missing_schools = missing_schools;
    panel
}
