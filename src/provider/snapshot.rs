//! In-memory snapshot provider

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use arrow::record_batch::RecordBatch;
use rustc_hash::{FxHashMap, FxHashSet};

use super::loader::{load_tables, load_tables_async};
use super::{DataProvider, GEO_TESTED_COLUMN};
use crate::error::{DashboardError, Result};
use crate::models::{AnalysisType, AttendanceScope, CorporationId, School, SchoolId};
use crate::schema::columns::meta;
use crate::schema::tables::{validate_schema, TableName};
use crate::utils::arrow::array_utils::{filter_batch_by_keys, filter_batch_by_values};
use crate::utils::arrow::conversion::{concat_normalized, utf8_batch};
use crate::utils::arrow::extractors::column_strings;

static NEXT_SNAPSHOT_ID: AtomicU64 = AtomicU64::new(1);

/// Immutable set of provider tables
#[derive(Debug, Clone)]
pub struct DataSnapshot {
    id: u64,
    tables: FxHashMap<TableName, RecordBatch>,
}

impl DataSnapshot {
    /// Build a snapshot from in-memory batches
    ///
    /// Batches are normalised to Utf8 and checked against their table
    /// contract. Several batches for the same table are concatenated.
    ///
    /// # Errors
    /// Returns [`DashboardError::SchemaMismatch`] for columns outside a contract
    pub fn from_batches(batches: impl IntoIterator<Item = (TableName, RecordBatch)>) -> Result<Self> {
        let mut grouped: FxHashMap<TableName, Vec<RecordBatch>> = FxHashMap::default();
        for (table, batch) in batches {
            validate_schema(table, &batch.schema())?;
            grouped.entry(table).or_default().push(batch);
        }
        let tables = grouped
            .into_iter()
            .map(|(table, parts)| Ok((table, concat_normalized(&parts)?)))
            .collect::<Result<FxHashMap<_, _>>>()?;
        let id = NEXT_SNAPSHOT_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("Created snapshot {id} with {} tables", tables.len());
        Ok(Self { id, tables })
    }

    /// Load a snapshot from a directory of Parquet tables
    pub fn load_dir(dir: &Path) -> Result<Self> {
        Self::from_batches(load_tables(dir)?)
    }

    /// Load a snapshot from a directory of Parquet tables off the async runtime
    pub async fn load_dir_async(dir: &Path) -> Result<Self> {
        Self::from_batches(load_tables_async(dir).await?)
    }

    /// Tables carried by the snapshot
    pub fn table_names(&self) -> impl Iterator<Item = TableName> + '_ {
        self.tables.keys().copied()
    }

    fn table(&self, table: TableName) -> Result<&RecordBatch> {
        self.tables
            .get(&table)
            .ok_or_else(|| DashboardError::unavailable(format!("table {table} is not loaded")))
    }

    fn rows_for(&self, table: TableName, key: u32) -> Result<RecordBatch> {
        let keys: FxHashSet<String> = std::iter::once(key.to_string()).collect();
        filter_batch_by_keys(self.table(table)?, table.key_column(), &keys)
    }

    fn academic_table(analysis: AnalysisType) -> TableName {
        match analysis {
            AnalysisType::K8 => TableName::K8Academic,
            AnalysisType::HS => TableName::HsAcademic,
        }
    }
}

impl DataProvider for DataSnapshot {
    fn snapshot_id(&self) -> u64 {
        self.id
    }

    fn school_index(&self, id: SchoolId) -> Result<RecordBatch> {
        self.rows_for(TableName::SchoolIndex, id.0)
    }

    fn all_schools(&self) -> Result<RecordBatch> {
        self.table(TableName::SchoolIndex).cloned()
    }

    fn k8_academic(&self, id: SchoolId) -> Result<RecordBatch> {
        self.rows_for(TableName::K8Academic, id.0)
    }

    fn hs_academic(&self, id: SchoolId) -> Result<RecordBatch> {
        self.rows_for(TableName::HsAcademic, id.0)
    }

    fn corp_k8(&self, id: CorporationId) -> Result<RecordBatch> {
        self.rows_for(TableName::CorpK8, id.0)
    }

    fn corp_hs(&self, id: CorporationId) -> Result<RecordBatch> {
        self.rows_for(TableName::CorpHs, id.0)
    }

    fn demographics(&self, id: u32) -> Result<RecordBatch> {
        self.rows_for(TableName::Demographics, id)
    }

    fn financial(&self, id: SchoolId) -> Result<RecordBatch> {
        self.rows_for(TableName::Financial, id.0)
    }

    fn growth_student(&self, id: SchoolId) -> Result<RecordBatch> {
        self.rows_for(TableName::GrowthStudent, id.0)
    }

    fn iread_student(&self, id: SchoolId) -> Result<RecordBatch> {
        self.rows_for(TableName::IreadStudent, id.0)
    }

    fn wida_student(&self, stns: &FxHashSet<String>) -> Result<RecordBatch> {
        filter_batch_by_keys(self.table(TableName::WidaStudent)?, "STN", stns)
    }

    fn school_stns(&self, id: SchoolId) -> Result<RecordBatch> {
        self.rows_for(TableName::SchoolStns, id.0)
    }

    fn all_schools_geo(&self, year: u16, analysis: AnalysisType) -> Result<RecordBatch> {
        let schools = School::from_batch(self.table(TableName::SchoolIndex)?)?;
        let year_text = year.to_string();
        let academic = filter_batch_by_values(
            self.table(Self::academic_table(analysis))?,
            &[(meta::YEAR, year_text.as_str())],
        )?;

        let ids = column_strings(&academic, meta::SCHOOL_ID)?;
        let tested = if academic.schema().index_of(GEO_TESTED_COLUMN).is_ok() {
            column_strings(&academic, GEO_TESTED_COLUMN)?
        } else {
            vec![None; academic.num_rows()]
        };
        let mut tested_by_school: FxHashMap<u32, Option<String>> = FxHashMap::default();
        for (id, tested) in ids.into_iter().zip(tested) {
            if let Some(id) = id.and_then(|raw| raw.parse::<SchoolId>().ok()) {
                tested_by_school.insert(id.0, tested);
            }
        }

        let types = analysis.school_types();
        let universe: Vec<(&School, Option<String>)> = schools
            .iter()
            .filter(|s| types.contains(&s.school_type))
            .filter_map(|s| tested_by_school.get(&s.id.0).map(|t| (s, t.clone())))
            .collect();

        let owned: Vec<[Option<String>; 9]> = universe
            .iter()
            .map(|(s, tested)| {
                [
                    Some(s.id.to_string()),
                    Some(s.name.clone()),
                    Some(s.school_type.to_string()),
                    s.low_grade.map(|g| g.to_string()),
                    s.high_grade.map(|g| g.to_string()),
                    s.lat.map(|v| v.to_string()),
                    s.lon.map(|v| v.to_string()),
                    Some(year_text.clone()),
                    tested.clone(),
                ]
            })
            .collect();
        let names = [
            meta::SCHOOL_ID,
            meta::SCHOOL_NAME,
            meta::SCHOOL_TYPE,
            meta::LOW_GRADE,
            meta::HIGH_GRADE,
            "Lat",
            "Lon",
            meta::YEAR,
            GEO_TESTED_COLUMN,
        ];
        let columns: Vec<(&str, Vec<Option<&str>>)> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, owned.iter().map(|row| row[i].as_deref()).collect()))
            .collect();
        utf8_batch(&columns)
    }

    fn attendance(&self, id: u32, scope: AttendanceScope, year: u16) -> Result<RecordBatch> {
        let id_text = id.to_string();
        let key_column = match scope {
            AttendanceScope::School => meta::SCHOOL_ID,
            AttendanceScope::Corporation => meta::CORPORATION_ID,
        };
        let rows = filter_batch_by_values(
            self.table(TableName::Attendance)?,
            &[(key_column, id_text.as_str()), ("Scope", scope.label())],
        )?;
        let years = column_strings(&rows, meta::YEAR)?;
        let mask: arrow::array::BooleanArray = years
            .iter()
            .map(|y| {
                Some(
                    y.as_deref()
                        .and_then(|y| y.trim().parse::<u16>().ok())
                        .is_some_and(|y| y <= year),
                )
            })
            .collect();
        Ok(arrow::compute::filter_record_batch(&rows, &mask)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test::batch_from_columns;

    fn snapshot() -> DataSnapshot {
        let index = batch_from_columns(&[
            ("SchoolID", vec![Some("1"), Some("2"), Some("3")]),
            ("SchoolName", vec![Some("A"), Some("B"), Some("C")]),
            ("CorporationID", vec![Some("9"), Some("9"), Some("9")]),
            ("SchoolType", vec![Some("K8"), Some("HS"), Some("K12")]),
            ("LowGrade", vec![Some("KG"), Some("9"), Some("KG")]),
            ("HighGrade", vec![Some("8"), Some("12"), Some("12")]),
            ("Lat", vec![Some("39.7"), Some("39.8"), Some("39.9")]),
            ("Lon", vec![Some("-86.1"), Some("-86.2"), Some("-86.3")]),
        ]);
        let k8 = batch_from_columns(&[
            ("Year", vec![Some("2023"), Some("2023"), Some("2022")]),
            ("SchoolID", vec![Some("1"), Some("3"), Some("1")]),
            ("Total|ELA Total Tested", vec![Some("120"), Some("15"), Some("100")]),
        ]);
        let attendance = batch_from_columns(&[
            ("Year", vec![Some("2022"), Some("2023"), Some("2024"), Some("2023")]),
            ("SchoolID", vec![Some("1"), Some("1"), Some("1"), None]),
            ("CorporationID", vec![Some("9"), Some("9"), Some("9"), Some("9")]),
            ("Scope", vec![Some("School"), Some("School"), Some("School"), Some("Corporation")]),
            ("Attendance Rate", vec![Some("0.95"), Some("0.94"), Some("0.93"), Some("0.92")]),
        ]);
        DataSnapshot::from_batches([
            (TableName::SchoolIndex, index),
            (TableName::K8Academic, k8),
            (TableName::Attendance, attendance),
        ])
        .unwrap()
    }

    #[test]
    fn geo_universe_joins_index_and_year() {
        let snapshot = snapshot();
        let geo = snapshot.all_schools_geo(2023, AnalysisType::K8).unwrap();
        assert_eq!(geo.num_rows(), 2);
        let tested = column_strings(&geo, GEO_TESTED_COLUMN).unwrap();
        assert_eq!(tested, vec![Some("120".to_string()), Some("15".to_string())]);
        assert_eq!(snapshot.all_schools_geo(2021, AnalysisType::K8).unwrap().num_rows(), 0);
    }

    #[test]
    fn unloaded_table_is_unavailable() {
        let err = snapshot().financial(SchoolId(1)).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn attendance_is_scoped_and_capped_by_year() {
        let snapshot = snapshot();
        let school = snapshot.attendance(1, AttendanceScope::School, 2023).unwrap();
        assert_eq!(school.num_rows(), 2);
        let corp = snapshot.attendance(9, AttendanceScope::Corporation, 2023).unwrap();
        assert_eq!(corp.num_rows(), 1);
    }

    #[test]
    fn snapshot_ids_are_unique() {
        assert_ne!(snapshot().snapshot_id(), snapshot().snapshot_id());
    }
}
