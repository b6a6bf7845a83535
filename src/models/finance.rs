//! Audited and interim financial tables

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use arrow::record_batch::RecordBatch;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::error::{DashboardError, Result};
use crate::schema::cell::Cell;
use crate::schema::tables::CATEGORY;
use crate::utils::arrow::extractors::column_strings;

/// Prefix of qualitative indicator rows
pub const INDICATOR_PREFIX: &str = "2.1.";

/// A finance column label: `YYYY` (audited) or `YYYY (Qn)` (interim)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearLabel {
    pub year: u16,
    pub quarter: Option<u8>,
}

impl YearLabel {
    #[must_use]
    pub const fn audited(year: u16) -> Self {
        Self { year, quarter: None }
    }

    #[must_use]
    pub const fn is_interim(&self) -> bool {
        self.quarter.is_some()
    }

    /// Audited figures sort after every quarter of the same year
    const fn sort_key(&self) -> (u16, u8) {
        match self.quarter {
            Some(q) => (self.year, q),
            None => (self.year, 5),
        }
    }
}

impl Ord for YearLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for YearLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for YearLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quarter {
            Some(q) => write!(f, "{} (Q{q})", self.year),
            None => write!(f, "{}", self.year),
        }
    }
}

impl Serialize for YearLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for YearLabel {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DashboardError::Conversion(format!("'{s}' is not a finance year label"));
        let trimmed = s.trim();
        let (year, quarter) = match trimmed.split_once(' ') {
            Some((year, rest)) => {
                let q = rest
                    .strip_prefix("(Q")
                    .and_then(|r| r.strip_suffix(')'))
                    .and_then(|q| q.parse::<u8>().ok())
                    .filter(|q| (1..=4).contains(q))
                    .ok_or_else(invalid)?;
                (year, Some(q))
            }
            None => (trimmed, None),
        };
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year = year.parse::<u16>().map_err(|_| invalid())?;
        Ok(Self { year, quarter })
    }
}

/// Wide finance table: one row per category, one column per year label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinanceTable {
    pub years: Vec<YearLabel>,
    /// Numeric categories
    pub rows: IndexMap<String, Vec<Cell>>,
    /// Qualitative `2.1.*` indicators, raw text per year
    pub indicators: IndexMap<String, Vec<Option<String>>>,
}

impl FinanceTable {
    /// Decode the `financial` table of one school
    pub fn from_batch(batch: &RecordBatch) -> Result<Self> {
        let categories = column_strings(batch, CATEGORY)?;
        let mut year_columns = Vec::new();
        for field in batch.schema().fields() {
            if let Ok(label) = field.name().parse::<YearLabel>() {
                year_columns.push((label, column_strings(batch, field.name())?));
            }
        }

        let mut table = Self {
            years: year_columns.iter().map(|(label, _)| *label).collect(),
            ..Self::default()
        };
        for (row, category) in categories.iter().enumerate() {
            let Some(category) = category.as_deref().map(str::trim).filter(|c| !c.is_empty())
            else {
                continue;
            };
            if category.starts_with(INDICATOR_PREFIX) {
                let raw = year_columns
                    .iter()
                    .map(|(_, values)| values[row].clone().filter(|v| !v.trim().is_empty()))
                    .collect();
                table.indicators.insert(category.to_string(), raw);
            } else {
                let cells = year_columns
                    .iter()
                    .map(|(_, values)| Cell::parse(values[row].as_deref()))
                    .collect();
                table.rows.insert(category.to_string(), cells);
            }
        }
        Ok(table)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty() || (self.rows.is_empty() && self.indicators.is_empty())
    }

    #[must_use]
    pub fn year_index(&self, label: YearLabel) -> Option<usize> {
        self.years.iter().position(|y| *y == label)
    }

    /// Value of a category in a column; absent categories are missing
    #[must_use]
    pub fn value(&self, category: &str, column: usize) -> Cell {
        self.rows
            .get(category)
            .and_then(|cells| cells.get(column))
            .copied()
            .unwrap_or_default()
    }

    /// Overwrite (or add) a numeric row
    pub fn set_row(&mut self, category: &str, cells: Vec<Cell>) {
        self.rows.insert(category.to_string(), cells);
    }

    /// Keep only the given column positions, in the given order
    #[must_use]
    pub fn select_columns(&self, positions: &[usize]) -> Self {
        Self {
            years: positions.iter().map(|&i| self.years[i]).collect(),
            rows: self
                .rows
                .iter()
                .map(|(k, cells)| (k.clone(), positions.iter().map(|&i| cells[i]).collect()))
                .collect(),
            indicators: self
                .indicators
                .iter()
                .map(|(k, raw)| {
                    (k.clone(), positions.iter().map(|&i| raw[i].clone()).collect())
                })
                .collect(),
        }
    }
}
