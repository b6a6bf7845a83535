//! Academic rows and the combined school/corporation/peer frame

use arrow::record_batch::RecordBatch;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use super::school::{Grade, GradeSpan};
use super::{parse_id, parse_year};
use crate::error::{DashboardError, Result};
use crate::models::frame::{Datum, Table};
use crate::schema::cell::Cell;
use crate::schema::columns::{meta, ColumnKey};
use crate::utils::arrow::extractors::column_strings;

/// Role of a row inside an [`AcademicFrame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RowKind {
    Selected,
    Corporation,
    Peer,
}

/// Identifying columns of an academic row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowMeta {
    pub kind: RowKind,
    /// School id, or corporation id for corporation rows
    pub id: u32,
    pub name: String,
    pub year: u16,
    pub low_grade: Option<Grade>,
    pub high_grade: Option<Grade>,
}

impl RowMeta {
    #[must_use]
    pub fn span(&self) -> Option<GradeSpan> {
        Some(GradeSpan::new(self.low_grade?, self.high_grade?))
    }
}

/// One academic row: metadata plus coerced value columns in source order
#[derive(Debug, Clone, PartialEq)]
pub struct AcademicRecord {
    pub meta: RowMeta,
    pub values: IndexMap<ColumnKey, Cell>,
}

impl AcademicRecord {
    /// Cell for a column; absent columns are missing
    #[must_use]
    pub fn get(&self, key: &ColumnKey) -> Cell {
        self.values.get(key).copied().unwrap_or_default()
    }

    pub fn set(&mut self, key: ColumnKey, cell: Cell) {
        self.values.insert(key, cell);
    }

    /// Decode an academic or corporation table
    ///
    /// Corporation tables identify rows by `CorporationID`; the name falls back
    /// to `CorporationName` when `SchoolName` is empty.
    pub fn from_batch(batch: &RecordBatch, kind: RowKind) -> Result<Vec<Self>> {
        let schema = batch.schema();
        let n = batch.num_rows();
        let text = |name: &str| -> Result<Vec<Option<String>>> {
            if schema.index_of(name).is_ok() {
                column_strings(batch, name)
            } else {
                Ok(vec![None; n])
            }
        };
        let years = text(meta::YEAR)?;
        let school_ids = text(meta::SCHOOL_ID)?;
        let corp_ids = text(meta::CORPORATION_ID)?;
        let school_names = text(meta::SCHOOL_NAME)?;
        let corp_names = text(meta::CORPORATION_NAME)?;
        let lows = text(meta::LOW_GRADE)?;
        let highs = text(meta::HIGH_GRADE)?;

        let mut value_columns = Vec::new();
        for field in schema.fields() {
            let name = field.name();
            if let Some(key) = ColumnKey::parse(name) {
                let cells: Vec<Cell> = column_strings(batch, name)?
                    .iter()
                    .map(|v| Cell::parse(v.as_deref()))
                    .collect();
                value_columns.push((key, cells));
            } else if !is_meta_column(name) {
                return Err(DashboardError::schema_mismatch("academic", name.clone()));
            }
        }

        let mut records = Vec::with_capacity(n);
        for row in 0..n {
            let id_source = match kind {
                RowKind::Corporation => corp_ids[row].as_deref().or(school_ids[row].as_deref()),
                _ => school_ids[row].as_deref(),
            };
            let Some(id_raw) = id_source else {
                log::warn!("Skipping academic row {row} without an identifier");
                continue;
            };
            let id = parse_id(id_raw, meta::SCHOOL_ID)?;
            let year = parse_year(years[row].as_deref().unwrap_or_default())?;
            let name = match kind {
                RowKind::Corporation => corp_names[row].clone().or_else(|| school_names[row].clone()),
                _ => school_names[row].clone(),
            }
            .unwrap_or_default();
            let values = value_columns
                .iter()
                .map(|(key, cells)| (key.clone(), cells[row]))
                .collect();
            records.push(Self {
                meta: RowMeta {
                    kind,
                    id,
                    name,
                    year,
                    low_grade: lows[row].as_deref().and_then(|g| g.parse().ok()),
                    high_grade: highs[row].as_deref().and_then(|g| g.parse().ok()),
                },
                values,
            });
        }
        Ok(records)
    }
}

fn is_meta_column(name: &str) -> bool {
    [
        meta::YEAR,
        meta::SCHOOL_ID,
        meta::SCHOOL_NAME,
        meta::SCHOOL_TYPE,
        meta::CORPORATION_ID,
        meta::CORPORATION_NAME,
        meta::LOW_GRADE,
        meta::HIGH_GRADE,
    ]
    .contains(&name)
}

/// Rows of one view in display order: selected school, corporation, peers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcademicFrame {
    pub rows: Vec<AcademicRecord>,
}

impl AcademicFrame {
    #[must_use]
    pub fn new(rows: Vec<AcademicRecord>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The selected school's row, if present
    #[must_use]
    pub fn selected(&self) -> Option<&AcademicRecord> {
        self.rows.iter().find(|r| r.meta.kind == RowKind::Selected)
    }

    /// Union of value columns across rows, in first-seen order
    #[must_use]
    pub fn columns(&self) -> IndexSet<ColumnKey> {
        self.rows
            .iter()
            .flat_map(|r| r.values.keys().cloned())
            .collect()
    }

    /// Remove every column for which the selected school is missing
    ///
    /// Suppressed selected values are kept so they can still be annotated.
    /// Returns the dropped columns.
    pub fn drop_null_for_selected(&mut self) -> Vec<ColumnKey> {
        let Some(selected) = self.selected() else {
            return Vec::new();
        };
        let dropped: Vec<ColumnKey> = self
            .columns()
            .into_iter()
            .filter(|key| selected.get(key).is_missing())
            .collect();
        for row in &mut self.rows {
            for key in &dropped {
                row.values.shift_remove(key);
            }
        }
        dropped
    }

    /// Wide table: `School Name` followed by the requested columns
    #[must_use]
    pub fn to_table(&self, keys: &[ColumnKey]) -> Table {
        let mut table = Table::new(
            std::iter::once("School Name".to_string()).chain(keys.iter().map(ColumnKey::name)),
        );
        for row in &self.rows {
            let mut values = vec![Datum::from(row.meta.name.as_str())];
            values.extend(keys.iter().map(|k| Datum::from(row.get(k))));
            table.push_row(values);
        }
        table
    }
}
