//! Financial information and the accountability scorecard
//!
//! Both views start from the same prepared table: columns after the display
//! year are dropped, derived rows are materialised and sparse columns are
//! removed. Metrics are evaluated over every valid column so trends and
//! multi-year windows see the full history; only the display window is
//! emitted.

pub mod derived;
pub mod metrics;
pub mod rating;

pub use derived::{drop_sparse_columns, materialize_derived, percent_change, prepare, select_years};
pub use metrics::{
    Condition, Formula, MetricDefinition, MetricResult, MetricSet, Quantity, RatingRule,
    YearQuantities, compute,
};
pub use rating::{IndicatorRating, Rating};

use indexmap::IndexMap;

use self::derived::category::{NET_ASSET_POSITION, OPERATING_EXPENSES, OPERATING_REVENUES};
use crate::config::DashboardConfig;
use crate::models::{Datum, FinanceTable, Panel, PanelKind, Table};

pub const FINANCIAL_INFO_TITLE: &str = "Financial Information";
pub const FINANCIAL_TREND_TITLE: &str = "Revenues, Expenses and Net Assets";
pub const INDICATORS_TITLE: &str = "Financial Indicators";
pub const RATINGS_TITLE: &str = "Financial Metric Ratings";
pub const METRIC_VALUES_TITLE: &str = "Financial Metric Values";

/// Column positions of the display window, newest first
fn display_window(table: &FinanceTable, max_years: usize) -> Vec<usize> {
    (0..table.years.len()).rev().take(max_years).collect()
}

/// Parsed `2.1.*` indicator ratings per column
#[must_use]
pub fn indicator_ratings(table: &FinanceTable) -> IndexMap<String, Vec<IndicatorRating>> {
    table
        .indicators
        .iter()
        .map(|(name, raw)| {
            let ratings = raw.iter().map(|r| IndicatorRating::from_raw(r.as_deref())).collect();
            (name.clone(), ratings)
        })
        .collect()
}

fn no_data(title: &str, kind: PanelKind) -> Panel {
    Panel::empty(title, kind).with_annotations(vec!["No Data".to_string()])
}

/// Raw and derived rows with a `% Change` column
fn info_table(table: &FinanceTable, window: &[usize]) -> Panel {
    let mut columns = vec!["Category".to_string()];
    columns.extend(window.iter().map(|&i| table.years[i].to_string()));
    columns.push("% Change".to_string());
    let mut data = Table::new(columns);

    for (category, cells) in &table.rows {
        let mut row: Vec<Datum> = vec![category.as_str().into()];
        row.extend(window.iter().map(|&i| Datum::from(cells[i])));
        let change = match window {
            [current, prior, ..] => percent_change(cells[*current], cells[*prior]),
            _ => None,
        };
        row.push(change.into());
        data.push_row(row);
    }
    Panel::new(FINANCIAL_INFO_TITLE, PanelKind::Table, data)
}

/// Operating revenues, expenses and net asset position, oldest first
fn trend_panel(table: &FinanceTable, window: &[usize]) -> Panel {
    let series = [OPERATING_REVENUES, OPERATING_EXPENSES, NET_ASSET_POSITION];
    let mut columns = vec!["Year"];
    columns.extend(series);
    let mut data = Table::new(columns);
    let mut panel_missing = Vec::new();
    for &i in window.iter().rev() {
        let values: Vec<Datum> = series.iter().map(|s| table.value(s, i).into()).collect();
        if values.iter().all(Datum::is_missing) {
            panel_missing.push(table.years[i].to_string());
            continue;
        }
        let mut row = vec![Datum::from(table.years[i].to_string())];
        row.extend(values);
        data.push_row(row);
    }
    let mut panel = Panel::new(FINANCIAL_TREND_TITLE, PanelKind::Line, data);
    panel.missing_categories = panel_missing;
    panel
}

fn indicators_panel(table: &FinanceTable, window: &[usize]) -> Panel {
    let mut columns = vec!["Indicator".to_string()];
    columns.extend(window.iter().map(|&i| table.years[i].to_string()));
    let mut data = Table::new(columns);
    let mut annotations = Vec::new();

    for (name, ratings) in indicator_ratings(table) {
        let mut row: Vec<Datum> = vec![name.as_str().into()];
        for &i in window {
            let indicator = &ratings[i];
            if indicator.rating == Rating::NoRating {
                if let Some(raw) = indicator.raw.as_deref().filter(|r| Rating::parse(r).is_none()) {
                    annotations.push(format!("{name} ({}): '{raw}'", table.years[i]));
                }
            }
            row.push(indicator.rating.label().into());
        }
        data.push_row(row);
    }
    Panel::new(INDICATORS_TITLE, PanelKind::Table, data).with_annotations(annotations)
}

/// Panels of the financial-information view
#[must_use]
pub fn financial_info_panels(
    table: &FinanceTable,
    display_year: u16,
    config: &DashboardConfig,
) -> Vec<Panel> {
    let prepared = prepare(table, display_year, config.min_valid_finance_cells);
    if prepared.years.is_empty() {
        log::info!("No valid finance columns up to {display_year}");
        return vec![
            no_data(FINANCIAL_INFO_TITLE, PanelKind::Table),
            no_data(FINANCIAL_TREND_TITLE, PanelKind::Line),
        ];
    }
    let window = display_window(&prepared, config.max_display_years);
    let mut panels = vec![info_table(&prepared, &window), trend_panel(&prepared, &window)];
    if !prepared.indicators.is_empty() {
        panels.push(indicators_panel(&prepared, &window));
    }
    panels
}

/// Panels of the financial-metrics view
///
/// Returns the rendered panels and the metric results they were built from.
#[must_use]
pub fn financial_metrics_panels(
    table: &FinanceTable,
    display_year: u16,
    metric_set: &MetricSet,
    config: &DashboardConfig,
) -> (Vec<Panel>, Vec<MetricResult>) {
    let prepared = prepare(table, display_year, config.min_valid_finance_cells);
    if prepared.years.is_empty() {
        return (
            vec![
                no_data(RATINGS_TITLE, PanelKind::Table),
                no_data(METRIC_VALUES_TITLE, PanelKind::Table),
            ],
            Vec::new(),
        );
    }
    let results = metric_set.evaluate(&prepared);
    let window = display_window(&prepared, config.max_display_years);

    let mut columns = vec!["Metric".to_string()];
    columns.extend(window.iter().map(|&i| prepared.years[i].to_string()));
    let mut ratings = Table::new(columns.clone());
    let mut values = Table::new(columns);
    for result in &results {
        let mut rating_row: Vec<Datum> = vec![result.name.as_str().into()];
        let mut value_row: Vec<Datum> = vec![result.name.as_str().into()];
        for &i in &window {
            rating_row.push(result.ratings[i].label().into());
            value_row.push(result.values[i].into());
        }
        ratings.push_row(rating_row);
        values.push_row(value_row);
    }
    log::debug!(
        "Rated {} metrics over {} finance columns",
        results.len(),
        prepared.years.len()
    );
    (
        vec![
            Panel::new(RATINGS_TITLE, PanelKind::Table, ratings),
            Panel::new(METRIC_VALUES_TITLE, PanelKind::Table, values),
        ],
        results,
    )
}
