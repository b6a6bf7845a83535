//! Comparison panels over a combined academic frame

use crate::models::{AcademicFrame, Datum, GradeSpan, Panel, PanelKind, RowKind, Table};
use crate::schema::columns::{ColumnKey, Grouping, Measure, Subject};

/// Which columns a comparison panel shows, with their display labels
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSpec {
    pub title: String,
    pub columns: Vec<(String, ColumnKey)>,
}

impl PanelSpec {
    #[must_use]
    pub fn new(title: impl Into<String>, columns: Vec<(String, ColumnKey)>) -> Self {
        Self {
            title: title.into(),
            columns,
        }
    }

    /// One subject's measure across the categories of a grouping
    #[must_use]
    pub fn grouped(subject: Subject, measure: Measure, grouping: Grouping, span: Option<GradeSpan>) -> Self {
        let columns = grouping
            .categories(span)
            .into_iter()
            .map(|category| {
                let key = ColumnKey::new(category.as_str(), subject, measure);
                (category, key)
            })
            .collect();
        let what = if matches!(measure, Measure::BenchmarkPct) {
            "Benchmark"
        } else {
            "Proficiency"
        };
        Self::new(format!("{subject} {what} by {grouping}"), columns)
    }

    /// A subject-less measure (graduation, CCR) across fixed categories
    #[must_use]
    pub fn subjectless<S: AsRef<str>>(
        title: impl Into<String>,
        measure: Measure,
        categories: impl IntoIterator<Item = S>,
    ) -> Self {
        let columns = categories
            .into_iter()
            .map(|c| (c.as_ref().to_string(), ColumnKey::subjectless(c.as_ref(), measure)))
            .collect();
        Self::new(title, columns)
    }
}

/// Project a frame onto a panel's columns
///
/// Columns the selected school has no numeric value for are reported in
/// `missing_categories` and left out of the chart. Comparison rows without a
/// numeric value in any charted column are dropped and reported in
/// `missing_schools`. A panel with nothing left to chart is empty.
#[must_use]
pub fn comparison_panel(frame: &AcademicFrame, spec: &PanelSpec) -> Panel {
    let Some(selected) = frame.selected() else {
        return Panel::empty(&spec.title, PanelKind::GroupedBar);
    };

    let (charted, missing_categories): (Vec<_>, Vec<_>) = spec
        .columns
        .iter()
        .partition(|(_, key)| selected.get(key).is_value());
    let missing_categories: Vec<String> =
        missing_categories.into_iter().map(|(label, _)| label.clone()).collect();

    let kind = if charted.len() == 1 {
        PanelKind::Bar
    } else {
        PanelKind::GroupedBar
    };

    if charted.is_empty() {
        let mut panel = Panel::empty(&spec.title, kind).with_annotations(vec!["No Data".to_string()]);
        panel.missing_categories = missing_categories;
        return panel;
    }

    let mut table = Table::new(
        std::iter::once("School Name".to_string()).chain(charted.iter().map(|(label, _)| label.clone())),
    );
    let mut missing_schools = Vec::new();
    for row in &frame.rows {
        let has_value = charted.iter().any(|(_, key)| row.get(key).is_value());
        if row.meta.kind != RowKind::Selected && !has_value {
            missing_schools.push(row.meta.name.clone());
            continue;
        }
        let mut values = vec![Datum::from(row.meta.name.as_str())];
        values.extend(charted.iter().map(|(_, key)| Datum::from(row.get(key))));
        table.push_row(values);
    }

    let mut panel = Panel::new(&spec.title, kind, table);
    if !missing_categories.is_empty() {
        log::debug!(
            "{}: selected school lacks {}",
            spec.title,
            missing_categories.join(", ")
        );
    }
    panel.missing_categories = missing_categories;
    panel.missing_schools = missing_schools;
    panel
}
