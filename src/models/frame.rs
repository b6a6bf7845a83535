//! Rendering-agnostic tables and the panels that carry them

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::schema::cell::{Cell, SUPPRESSED_TOKEN};

/// A single table value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Datum {
    Number(f64),
    Text(String),
    Suppressed,
    #[default]
    Missing,
}

impl Datum {
    #[must_use]
    pub const fn number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Render as the string a Utf8 column would carry
    fn to_cell_string(&self) -> Option<String> {
        match self {
            Self::Number(v) => Some(v.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Suppressed => Some(SUPPRESSED_TOKEN.to_string()),
            Self::Missing => None,
        }
    }
}

impl From<Cell> for Datum {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Value(v) => Self::Number(v),
            Cell::Suppressed => Self::Suppressed,
            Cell::Missing => Self::Missing,
        }
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Cell::from(value).into()
    }
}

impl From<Option<f64>> for Datum {
    fn from(value: Option<f64>) -> Self {
        Cell::from(value).into()
    }
}

impl From<usize> for Datum {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u16> for Datum {
    fn from(value: u16) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Serialize for Datum {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Number(v) => serializer.serialize_f64(*v),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Suppressed => serializer.serialize_str(SUPPRESSED_TOKEN),
            Self::Missing => serializer.serialize_none(),
        }
    }
}

/// Column-labelled rows of [`Datum`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Datum>>,
}

impl Table {
    #[must_use]
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count
    pub fn push_row(&mut self, mut row: Vec<Datum>) {
        if row.len() != self.columns.len() {
            log::warn!(
                "Row with {} values pushed into table with {} columns",
                row.len(),
                self.columns.len()
            );
            row.resize(self.columns.len(), Datum::Missing);
        }
        self.rows.push(row);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&Datum>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Value at a row for a named column
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Datum> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// First row whose first column is the given text
    #[must_use]
    pub fn find_row(&self, label: &str) -> Option<&[Datum]> {
        self.rows
            .iter()
            .find(|row| row.first().and_then(Datum::text) == Some(label))
            .map(Vec::as_slice)
    }

    /// Export as a Utf8 record batch using the provider sentinel encoding
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect();
        let arrays: Vec<ArrayRef> = (0..self.columns.len())
            .map(|idx| {
                let values: StringArray = self
                    .rows
                    .iter()
                    .map(|row| row[idx].to_cell_string())
                    .collect();
                Arc::new(values) as ArrayRef
            })
            .collect();
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}

/// Chart or table family a panel should be rendered as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelKind {
    Table,
    Bar,
    GroupedBar,
    Line,
    StackedBar,
}

/// One panel of a view: data plus what could not be shown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: String,
    pub kind: PanelKind,
    pub data: Table,
    /// Human-readable notes (suppressed cells, no-data categories, invariant violations)
    pub annotations: Vec<String>,
    /// Categories the selected school has no value for
    pub missing_categories: Vec<String>,
    /// Comparison schools dropped because they lack every shown category
    pub missing_schools: Vec<String>,
    pub empty: bool,
}

impl Panel {
    /// A panel over `data`; empty when the table has no rows
    #[must_use]
    pub fn new(title: impl Into<String>, kind: PanelKind, data: Table) -> Self {
        let empty = data.is_empty();
        Self {
            title: title.into(),
            kind,
            data,
            annotations: Vec::new(),
            missing_categories: Vec::new(),
            missing_schools: Vec::new(),
            empty,
        }
    }

    /// A panel with nothing to show
    #[must_use]
    pub fn empty(title: impl Into<String>, kind: PanelKind) -> Self {
        Self::new(title, kind, Table::default())
    }

    #[must_use]
    pub fn with_annotations(mut self, annotations: Vec<String>) -> Self {
        self.annotations.extend(annotations);
        self
    }

    /// Missing categories joined for display
    #[must_use]
    pub fn category_string(&self) -> String {
        self.missing_categories.join(", ")
    }

    /// Missing schools joined for display
    #[must_use]
    pub fn school_string(&self) -> String {
        self.missing_schools.join(", ")
    }
}
