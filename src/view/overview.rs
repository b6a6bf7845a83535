//! Demographic overview and attendance panels

use indexmap::IndexMap;

use crate::models::{AttendanceRecord, DemographicRecord, Datum, Panel, PanelKind, Table};
use crate::schema::cell::Cell;
use crate::schema::columns::{ETHNICITIES, SUBGROUPS};

pub const ENROLLMENT_TITLE: &str = "Enrollment";
pub const ETHNICITY_TITLE: &str = "Enrollment by Ethnicity";
pub const SUBGROUP_TITLE: &str = "Enrollment by Subgroup";
pub const ATTENDANCE_TITLE: &str = "Attendance";

/// Years present in `records` up to `up_to`, newest first, at most `window`
#[must_use]
pub fn demographic_years(records: &[DemographicRecord], up_to: u16, window: usize) -> Vec<u16> {
    let mut years: Vec<u16> = records.iter().map(|r| r.year).filter(|y| *y <= up_to).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years.truncate(window);
    years
}

/// Enrollment counts by year, newest first
///
/// Years where `Total Enrollment` and the ethnicity sum disagree by more than
/// `tolerance` are annotated and logged; counts are shown as published.
#[must_use]
pub fn enrollment_panel(records: &[DemographicRecord], years: &[u16], tolerance: f64) -> Panel {
    let mut columns = vec!["Category".to_string()];
    columns.extend(years.iter().map(u16::to_string));
    let mut table = Table::new(columns);
    let by_year: IndexMap<u16, &DemographicRecord> = records.iter().map(|r| (r.year, r)).collect();

    let mut push = |label: &str, pick: &dyn Fn(&DemographicRecord) -> Cell| {
        let mut row = vec![Datum::from(label)];
        row.extend(years.iter().map(|y| by_year.get(y).map_or(Datum::Missing, |r| pick(r).into())));
        table.push_row(row);
    };
    push("Total Enrollment", &|r| r.total_enrollment);
    for category in ETHNICITIES.iter().chain(SUBGROUPS.iter()) {
        push(category, &|r| {
            r.ethnicity
                .get(*category)
                .or_else(|| r.subgroups.get(*category))
                .copied()
                .unwrap_or_default()
        });
    }

    let mut annotations = Vec::new();
    for year in years {
        let Some(record) = by_year.get(year) else {
            continue;
        };
        if let Some(diff) = record.enrollment_mismatch(tolerance) {
            log::warn!(
                "{} ({year}): Total Enrollment differs from the ethnicity sum by {diff}",
                record.name
            );
            annotations.push(format!(
                "{year}: Total Enrollment differs from the sum of ethnicity counts by {diff}"
            ));
        }
    }
    Panel::new(ENROLLMENT_TITLE, PanelKind::Table, table).with_annotations(annotations)
}

fn share(count: Cell, total: Cell) -> Cell {
    count.zip_with(total, |c, t| c / t)
}

/// School vs corporation percentage of enrollment for one year
#[must_use]
pub fn composition_panel(
    title: &str,
    categories: &[&str],
    school: &DemographicRecord,
    corporation: Option<&DemographicRecord>,
    pick: fn(&DemographicRecord) -> &IndexMap<String, Cell>,
) -> Panel {
    let shares = |r: &DemographicRecord| -> Vec<Cell> {
        categories
            .iter()
            .map(|c| share(pick(r).get(*c).copied().unwrap_or_default(), r.total_enrollment))
            .collect()
    };
    let school_shares = shares(school);
    let shown: Vec<usize> = (0..categories.len()).filter(|&i| school_shares[i].is_value()).collect();
    let missing_categories: Vec<String> = (0..categories.len())
        .filter(|i| !shown.contains(i))
        .map(|i| categories[i].to_string())
        .collect();

    if shown.is_empty() {
        let mut panel = Panel::empty(title, PanelKind::GroupedBar).with_annotations(vec!["No Data".into()]);
        panel.missing_categories = missing_categories;
        return panel;
    }

    let mut columns = vec!["School Name".to_string()];
    columns.extend(shown.iter().map(|&i| categories[i].to_string()));
    let mut table = Table::new(columns);
    let mut missing_schools = Vec::new();
    let rows = std::iter::once((school, school_shares.clone()))
        .chain(corporation.map(|c| (c, shares(c))));
    for (record, values) in rows {
        if shown.iter().all(|&i| !values[i].is_value()) && record.id != school.id {
            missing_schools.push(record.name.clone());
            continue;
        }
        let mut row = vec![Datum::from(record.name.as_str())];
        row.extend(shown.iter().map(|&i| Datum::from(values[i])));
        table.push_row(row);
    }

    let mut panel = Panel::new(title, PanelKind::GroupedBar, table);
    panel.missing_categories = missing_categories;
    panel.missing_schools = missing_schools;
    panel
}

/// Ethnicity and subgroup composition panels for `year`
#[must_use]
pub fn composition_panels(
    school: &[DemographicRecord],
    corporation: &[DemographicRecord],
    year: u16,
) -> Vec<Panel> {
    let Some(selected) = school.iter().find(|r| r.year == year) else {
        return vec![
            Panel::empty(ETHNICITY_TITLE, PanelKind::GroupedBar),
            Panel::empty(SUBGROUP_TITLE, PanelKind::GroupedBar),
        ];
    };
    let corp = corporation.iter().find(|r| r.year == year);
    vec![
        composition_panel(ETHNICITY_TITLE, &ETHNICITIES, selected, corp, |r| &r.ethnicity),
        composition_panel(SUBGROUP_TITLE, &SUBGROUPS, selected, corp, |r| &r.subgroups),
    ]
}

/// Attendance rate and chronic absenteeism with the corporation difference
#[must_use]
pub fn attendance_panel(school: &[AttendanceRecord], corporation: &[AttendanceRecord], years: &[u16]) -> Panel {
    let mut columns = vec!["Category".to_string()];
    for year in years {
        columns.push(format!("{year} School"));
        columns.push(format!("{year} Corp Avg"));
        columns.push(format!("{year} Diff"));
    }
    let mut table = Table::new(columns);
    let find = |records: &[AttendanceRecord], year: u16, pick: fn(&AttendanceRecord) -> Cell| {
        records.iter().find(|r| r.year == year).map_or(Cell::Missing, pick)
    };

    type Pick = fn(&AttendanceRecord) -> Cell;
    let measures: [(&str, Pick); 2] = [
        ("Attendance Rate", |r| r.attendance_rate),
        ("Chronic Absenteeism %", |r| r.chronic_absenteeism),
    ];
    let mut missing = Vec::new();
    for (label, pick) in measures {
        let mut row = vec![Datum::from(label)];
        let mut any = false;
        for year in years {
            let s = find(school, *year, pick);
            let c = find(corporation, *year, pick);
            any |= s.is_value();
            row.push(s.into());
            row.push(c.into());
            row.push(s.zip_with(c, |a, b| a - b).into());
        }
        if !any {
            missing.push(label.to_string());
        }
        table.push_row(row);
    }
    let mut panel = Panel::new(ATTENDANCE_TITLE, PanelKind::Table, table);
    panel.empty = school.iter().all(|r| !years.contains(&r.year));
    panel.missing_categories = missing;
    panel
}
