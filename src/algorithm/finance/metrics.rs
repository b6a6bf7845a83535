//! Declarative financial metric definitions and their evaluator
//!
//! A [`MetricSet`] is read from TOML. Each metric names a formula and an
//! ordered list of rating rules; the first rule whose condition holds gives
//! the year's rating. A year whose required quantities are missing is rated
//! `No Rating`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::derived::category::*;
use super::rating::Rating;
use crate::error::util::safe_read_to_string;
use crate::error::{DashboardError, Result};
use crate::models::{FinanceTable, YearLabel};
use crate::schema::cell::Cell;

/// Metric set shipped with the crate
const DEFAULT_METRICS: &str = include_str!("default_metrics.toml");

/// How a metric's yearly value is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// `Current Assets / Current Liabilities`
    CurrentRatio,
    /// `Unrestricted Cash / ((Operating Expenses − Depreciation) / 365)`
    DaysCashOnHand,
    /// `(ADMₜ − ADMₜ₋₁) / ADMₜ₋₁`
    EnrollmentChange,
    /// `Unrestricted Net Assets / Operating Expenses`
    PrimaryReserveRatio,
    /// `(Revenues − Expenses) / Revenues`, with 3-year and cumulative margins
    NetAssetsMargin,
    /// `Total Liabilities / Total Assets`
    DebtToAsset,
    /// One-year change in unrestricted cash (year-0 cash is zero)
    CashFlow,
    /// `(ΔNA + Depreciation + Interest + Lease) / (Principal + Interest + Lease)`
    DebtServiceCoverage,
}

/// A quantity a rule condition can test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// The metric's value for the year
    Value,
    /// `valueₜ − valueₜ₋₁`
    Trend,
    /// Consecutive year-over-year increases ending at this year
    ConsecutiveIncreases,
    /// Audited years up to and including this column, starting at 1
    YearsOfOperation,
    /// Three-year aggregated margin (margin metrics)
    Aggregated,
    /// Margin over every year so far (margin metrics)
    Cumulative,
    /// `Cashₜ − Cashₜ₋₂` (cash flow)
    MultiYear,
    /// Positive one-year values among the last three years (cash flow)
    PositiveYears,
    /// Non-positive one-year values among the last three years (cash flow)
    ShortfallYears,
}

/// Rule condition tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Above { quantity: Quantity, threshold: f64 },
    AtLeast { quantity: Quantity, threshold: f64 },
    Below { quantity: Quantity, threshold: f64 },
    AtMost { quantity: Quantity, threshold: f64 },
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
    Always,
}

impl Condition {
    /// Evaluate against one year; a missing quantity never satisfies a comparison
    #[must_use]
    pub fn holds(&self, year: &YearQuantities) -> bool {
        let compare = |quantity: &Quantity, f: &dyn Fn(f64) -> bool| year.get(*quantity).is_some_and(f);
        match self {
            Self::Above { quantity, threshold } => compare(quantity, &|v| v > *threshold),
            Self::AtLeast { quantity, threshold } => compare(quantity, &|v| v >= *threshold),
            Self::Below { quantity, threshold } => compare(quantity, &|v| v < *threshold),
            Self::AtMost { quantity, threshold } => compare(quantity, &|v| v <= *threshold),
            Self::All { conditions } => conditions.iter().all(|c| c.holds(year)),
            Self::Any { conditions } => conditions.iter().any(|c| c.holds(year)),
            Self::Always => true,
        }
    }
}

/// One ordered rating rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRule {
    pub rating: Rating,
    pub condition: Condition,
}

fn default_requires() -> Vec<Quantity> {
    vec![Quantity::Value]
}

/// A metric: formula plus ordered rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub id: String,
    pub name: String,
    pub formula: Formula,
    /// Quantities that must be present for a rating other than `No Rating`
    #[serde(default = "default_requires")]
    pub requires: Vec<Quantity>,
    /// Rate audited columns only; interim columns get `No Rating`
    #[serde(default)]
    pub audited_only: bool,
    pub rules: Vec<RatingRule>,
}

impl MetricDefinition {
    /// Rating of one year's quantities
    #[must_use]
    pub fn rate(&self, year: &YearQuantities) -> Rating {
        if self.audited_only && year.interim {
            return Rating::NoRating;
        }
        if self.requires.iter().any(|q| year.get(*q).is_none()) {
            return Rating::NoRating;
        }
        self.rules
            .iter()
            .find(|rule| rule.condition.holds(year))
            .map_or(Rating::NoRating, |rule| rule.rating)
    }
}

/// The full set of financial metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub metrics: Vec<MetricDefinition>,
}

impl Default for MetricSet {
    fn default() -> Self {
        match Self::from_toml_str(DEFAULT_METRICS) {
            Ok(set) => set,
            Err(e) => {
                log::error!("Built-in metric set is invalid: {e}");
                Self { metrics: Vec::new() }
            }
        }
    }
}

impl MetricSet {
    /// Parse a metric set from TOML
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let set: Self = toml::from_str(text)?;
        set.validate()?;
        Ok(set)
    }

    /// Load a metric set file
    pub fn load(path: &Path) -> Result<Self> {
        let text = safe_read_to_string(path, "financial metric definitions")?;
        Self::from_toml_str(&text)
    }

    /// The configured file, or the built-in set
    pub fn from_config(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::from_toml_str(DEFAULT_METRICS),
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = rustc_hash::FxHashSet::default();
        for metric in &self.metrics {
            if !seen.insert(metric.id.as_str()) {
                return Err(DashboardError::ConfigInvalid(format!(
                    "duplicate metric id '{}'",
                    metric.id
                )));
            }
            if metric.rules.is_empty() {
                return Err(DashboardError::ConfigInvalid(format!(
                    "metric '{}' has no rating rules",
                    metric.id
                )));
            }
        }
        Ok(())
    }

    /// Rate every metric for every column of a prepared table
    #[must_use]
    pub fn evaluate(&self, table: &FinanceTable) -> Vec<MetricResult> {
        self.metrics
            .iter()
            .map(|metric| {
                let quantities = compute(metric.formula, table);
                let ratings = quantities.iter().map(|q| metric.rate(q)).collect();
                MetricResult {
                    id: metric.id.clone(),
                    name: metric.name.clone(),
                    years: table.years.clone(),
                    values: quantities.iter().map(|q| q.value).collect(),
                    ratings,
                }
            })
            .collect()
    }
}

/// Ratings of one metric across columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    pub id: String,
    pub name: String,
    pub years: Vec<YearLabel>,
    pub values: Vec<Option<f64>>,
    pub ratings: Vec<Rating>,
}

/// Every quantity of one metric in one column
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YearQuantities {
    pub value: Option<f64>,
    pub trend: Option<f64>,
    pub consecutive_increases: Option<f64>,
    pub years_of_operation: Option<f64>,
    pub aggregated: Option<f64>,
    pub cumulative: Option<f64>,
    pub multi_year: Option<f64>,
    pub positive_years: Option<f64>,
    pub shortfall_years: Option<f64>,
    /// Column is an interim `YYYY (Qn)` figure
    pub interim: bool,
}

impl YearQuantities {
    #[must_use]
    pub const fn get(&self, quantity: Quantity) -> Option<f64> {
        match quantity {
            Quantity::Value => self.value,
            Quantity::Trend => self.trend,
            Quantity::ConsecutiveIncreases => self.consecutive_increases,
            Quantity::YearsOfOperation => self.years_of_operation,
            Quantity::Aggregated => self.aggregated,
            Quantity::Cumulative => self.cumulative,
            Quantity::MultiYear => self.multi_year,
            Quantity::PositiveYears => self.positive_years,
            Quantity::ShortfallYears => self.shortfall_years,
        }
    }
}

fn row(table: &FinanceTable, name: &str) -> Vec<Cell> {
    (0..table.years.len()).map(|i| table.value(name, i)).collect()
}

fn ratio(numerator: &[Cell], denominator: &[Cell]) -> Vec<Option<f64>> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| n.zip_with(*d, |a, b| a / b).value())
        .collect()
}

/// Audited column before column `i`
fn prior_audited(years: &[YearLabel], i: usize) -> Option<usize> {
    (0..i).rev().find(|&j| !years[j].is_interim())
}

/// Up to `len` audited columns ending at `i`, oldest first; empty for an
/// interim column
fn audited_tail(years: &[YearLabel], i: usize, len: usize) -> Vec<usize> {
    if years[i].is_interim() {
        return Vec::new();
    }
    let audited: Vec<usize> = (0..=i).filter(|&j| !years[j].is_interim()).collect();
    audited[audited.len().saturating_sub(len)..].to_vec()
}

fn sum_at(cells: &[Cell], columns: &[usize]) -> Option<f64> {
    columns.iter().map(|&j| cells[j].value()).sum()
}

/// Per-column quantities of one formula
///
/// Interim columns carry point-in-time values and a trend against the last
/// audited year. Year counts and multi-year windows step over audited
/// columns only.
#[must_use]
pub fn compute(formula: Formula, table: &FinanceTable) -> Vec<YearQuantities> {
    let years = &table.years;
    let n = years.len();
    let values: Vec<Option<f64>> = match formula {
        Formula::CurrentRatio => ratio(&row(table, CURRENT_ASSETS), &row(table, CURRENT_LIABILITIES)),
        Formula::DaysCashOnHand => {
            let daily: Vec<Cell> = row(table, OPERATING_EXPENSES)
                .into_iter()
                .zip(row(table, DEPRECIATION))
                .map(|(e, d)| {
                    let d = if d.is_missing() { Cell::Value(0.0) } else { d };
                    e.zip_with(d, |e, d| (e - d) / 365.0)
                })
                .collect();
            ratio(&row(table, UNRESTRICTED_CASH), &daily)
        }
        Formula::EnrollmentChange => {
            let adm = row(table, ADM_AVERAGE);
            (0..n)
                .map(|i| {
                    let prior = adm[prior_audited(years, i)?];
                    adm[i].zip_with(prior, |c, p| (c - p) / p).value()
                })
                .collect()
        }
        Formula::PrimaryReserveRatio => {
            ratio(&row(table, UNRESTRICTED_NET_ASSETS), &row(table, OPERATING_EXPENSES))
        }
        Formula::NetAssetsMargin => {
            let change = row(table, CHANGE_IN_NET_ASSETS);
            ratio(&change, &row(table, OPERATING_REVENUES))
        }
        Formula::DebtToAsset => ratio(&row(table, TOTAL_LIABILITIES), &row(table, TOTAL_ASSETS)),
        Formula::CashFlow => {
            let cash = row(table, UNRESTRICTED_CASH);
            (0..n)
                .map(|i| {
                    let prior = prior_audited(years, i).map_or(Cell::Value(0.0), |p| cash[p]);
                    cash[i].zip_with(prior, |c, p| c - p).value()
                })
                .collect()
        }
        Formula::DebtServiceCoverage => {
            let zero_if_missing = |c: Cell| if c.is_missing() { Cell::Value(0.0) } else { c };
            let depreciation = row(table, DEPRECIATION);
            let interest = row(table, INTEREST_EXPENSE);
            let lease = row(table, LEASE_PAYMENTS);
            let principal = row(table, PRINCIPAL_PAYMENTS);
            let change = row(table, CHANGE_IN_NET_ASSETS);
            (0..n)
                .map(|i| {
                    let (dep, int, lease, principal) = (
                        zero_if_missing(depreciation[i]),
                        zero_if_missing(interest[i]),
                        zero_if_missing(lease[i]),
                        zero_if_missing(principal[i]),
                    );
                    let numerator = change[i]
                        .zip_with(dep, |a, b| a + b)
                        .zip_with(int, |a, b| a + b)
                        .zip_with(lease, |a, b| a + b);
                    let denominator = principal.zip_with(int, |a, b| a + b).zip_with(lease, |a, b| a + b);
                    numerator.zip_with(denominator, |a, b| a / b).value()
                })
                .collect()
        }
    };

    let mut out: Vec<YearQuantities> = (0..n)
        .map(|i| {
            let trend = prior_audited(years, i).and_then(|p| Some(values[i]? - values[p]?));
            let mut increases = 0usize;
            let mut current = i;
            while let Some(prior) = prior_audited(years, current) {
                match (values[current], values[prior]) {
                    (Some(c), Some(p)) if c > p => increases += 1,
                    _ => break,
                }
                current = prior;
            }
            let audited_before = (0..i).filter(|&j| !years[j].is_interim()).count();
            YearQuantities {
                value: values[i],
                trend,
                consecutive_increases: values[i].map(|_| increases as f64),
                years_of_operation: Some((audited_before + 1) as f64),
                interim: years[i].is_interim(),
                ..YearQuantities::default()
            }
        })
        .collect();

    match formula {
        Formula::NetAssetsMargin => {
            let change = row(table, CHANGE_IN_NET_ASSETS);
            let revenue = row(table, OPERATING_REVENUES);
            let margin = |columns: &[usize]| {
                sum_at(&change, columns)
                    .zip(sum_at(&revenue, columns))
                    .and_then(|(c, r)| (r != 0.0).then(|| c / r))
            };
            for (i, q) in out.iter_mut().enumerate() {
                let window = audited_tail(years, i, 3);
                if window.len() == 3 {
                    q.aggregated = margin(&window);
                }
                let so_far = audited_tail(years, i, n);
                if !so_far.is_empty() {
                    q.cumulative = margin(&so_far);
                }
            }
        }
        Formula::CashFlow => {
            let cash = row(table, UNRESTRICTED_CASH);
            for (i, q) in out.iter_mut().enumerate() {
                let window = audited_tail(years, i, 3);
                if window.len() == 3 {
                    q.multi_year = cash[i].zip_with(cash[window[0]], |c, p| c - p).value();
                }
                if !window.is_empty() && window.iter().all(|&j| values[j].is_some()) {
                    let positive = window.iter().filter_map(|&j| values[j]).filter(|v| *v > 0.0).count();
                    q.positive_years = Some(positive as f64);
                    q.shortfall_years = Some((window.len() - positive) as f64);
                }
            }
        }
        _ => {}
    }
    out
}
