use std::path::Path;

use charter_dash::models::AttendanceScope;
use charter_dash::utils::arrow::extractors::column_strings;
use charter_dash::{DashboardError, DataProvider, DataSnapshot, SchoolId, TableName};
use tempfile::tempdir;

use crate::utils::{CORPORATION, PEER_A, SELECTED, sample_tables, table, write_parquet};

fn write_sample(dir: &Path) {
    for (name, batch) in sample_tables() {
        write_parquet(&dir.join(format!("{}.parquet", name.file_stem())), &batch);
    }
}

#[test]
fn parquet_directory_round_trip() {
    let dir = tempdir().unwrap();
    write_sample(dir.path());

    let snapshot = DataSnapshot::load_dir(dir.path()).unwrap();
    assert_eq!(snapshot.table_names().count(), TableName::ALL.len());
    assert_eq!(snapshot.all_schools().unwrap().num_rows(), 7);
    assert_eq!(snapshot.k8_academic(SELECTED).unwrap().num_rows(), 2);
    assert_eq!(snapshot.k8_academic(PEER_A).unwrap().num_rows(), 2);
}

#[test]
fn part_directories_are_concatenated() {
    let dir = tempdir().unwrap();
    let parts = dir.path().join(TableName::SchoolStns.file_stem());
    std::fs::create_dir(&parts).unwrap();
    let header = ["SchoolID", "Year", "STN"];
    write_parquet(&parts.join("part-0.parquet"), &table(&header, &[&["100", "2023", "42"]]));
    write_parquet(&parts.join("part-1.parquet"), &table(&header, &[&["100", "2023", "44"]]));

    let snapshot = DataSnapshot::load_dir(dir.path()).unwrap();
    let stns = column_strings(&snapshot.school_stns(SELECTED).unwrap(), "STN").unwrap();
    let mut stns: Vec<String> = stns.into_iter().flatten().collect();
    stns.sort();
    assert_eq!(stns, vec!["42", "44"]);

    // tables that were never written are unavailable, not empty
    let err = snapshot.financial(SELECTED).unwrap_err();
    assert!(matches!(err, DashboardError::DataUnavailable { .. }));
}

#[tokio::test]
async fn async_loading_matches_blocking_loading() {
    let dir = tempdir().unwrap();
    write_sample(dir.path());

    let blocking = DataSnapshot::load_dir(dir.path()).unwrap();
    let concurrent = DataSnapshot::load_dir_async(dir.path()).await.unwrap();
    let mut a: Vec<TableName> = blocking.table_names().collect();
    let mut b: Vec<TableName> = concurrent.table_names().collect();
    a.sort_by_key(|t| t.file_stem());
    b.sort_by_key(|t| t.file_stem());
    assert_eq!(a, b);
    assert_eq!(
        concurrent.demographics(SELECTED.0).unwrap().num_rows(),
        blocking.demographics(SELECTED.0).unwrap().num_rows()
    );
}

#[tokio::test]
async fn async_loading_rejects_missing_directory() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nowhere");
    let err = DataSnapshot::load_dir_async(&missing).await.unwrap_err();
    assert!(matches!(err, DashboardError::Io(_)));
}

#[test]
fn unknown_column_is_a_schema_mismatch() {
    let financial = table(&["SchoolID", "Category", "2023", "Auditor"], &[&["100", "Total Assets", "1", "x"]]);
    let err = DataSnapshot::from_batches([(TableName::Financial, financial)]).unwrap_err();
    match err {
        DashboardError::SchemaMismatch { table, column } => {
            assert_eq!(table, "financial");
            assert_eq!(column, "Auditor");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn queries_are_scoped_to_one_entity() {
    let snapshot = DataSnapshot::from_batches(sample_tables()).unwrap();
    assert_eq!(snapshot.school_index(SchoolId(999)).unwrap().num_rows(), 0);
    assert_eq!(snapshot.demographics(CORPORATION).unwrap().num_rows(), 1);

    let school = snapshot.attendance(SELECTED.0, AttendanceScope::School, 2022).unwrap();
    assert_eq!(school.num_rows(), 1);
    let corp = snapshot.attendance(CORPORATION, AttendanceScope::Corporation, 2023).unwrap();
    assert_eq!(corp.num_rows(), 1);

    let geo = snapshot.all_schools_geo(2023, charter_dash::AnalysisType::HS).unwrap();
    let ids: Vec<String> = column_strings(&geo, "SchoolID").unwrap().into_iter().flatten().collect();
    assert_eq!(ids, vec!["200", "300"]);
}
