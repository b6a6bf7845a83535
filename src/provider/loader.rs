//! Loading provider tables from a directory of Parquet files
//!
//! A table is either a single `<table>.parquet` file or a `<table>/`
//! directory of part files. Tables are read in parallel with rayon; the
//! async entry point moves each table onto the blocking pool.

use std::path::{Path, PathBuf};
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use futures::future::try_join_all;
use rayon::prelude::*;

use crate::error::util::validate_directory;
use crate::error::{DashboardError, Result};
use crate::schema::tables::TableName;
use crate::utils::arrow::conversion::concat_normalized;
use crate::utils::{
    load_parquet_files_parallel, log_operation_complete, log_operation_start, read_parquet,
};

/// Where a table lives on disk, if anywhere
#[must_use]
pub fn table_location(dir: &Path, table: TableName) -> Option<PathBuf> {
    let file = dir.join(format!("{}.parquet", table.file_stem()));
    if file.is_file() {
        return Some(file);
    }
    let part_dir = dir.join(table.file_stem());
    part_dir.is_dir().then_some(part_dir)
}

/// Read one table, normalised to Utf8; `None` when the table is absent
pub fn load_table(dir: &Path, table: TableName) -> Result<Option<RecordBatch>> {
    let Some(location) = table_location(dir, table) else {
        log::warn!("Table {table} not found under {}", dir.display());
        return Ok(None);
    };
    let batches = if location.is_dir() {
        load_parquet_files_parallel(&location)?
    } else {
        read_parquet(&location)?
    };
    if batches.is_empty() {
        return Ok(None);
    }
    concat_normalized(&batches).map(Some)
}

/// Read every known table from a directory in parallel
pub fn load_tables(dir: &Path) -> Result<Vec<(TableName, RecordBatch)>> {
    let start = Instant::now();
    log_operation_start("Loading snapshot tables from", &dir.display());
    validate_directory(dir, "data snapshot")?;

    let loaded = TableName::ALL
        .par_iter()
        .map(|table| Ok(load_table(dir, *table)?.map(|batch| (*table, batch))))
        .collect::<Result<Vec<_>>>()?;
    let tables: Vec<_> = loaded.into_iter().flatten().collect();

    log_operation_complete("loaded", &dir.display(), tables.len(), "tables", Some(start.elapsed()));
    Ok(tables)
}

/// Read every known table without blocking the async runtime
pub async fn load_tables_async(dir: &Path) -> Result<Vec<(TableName, RecordBatch)>> {
    let start = Instant::now();
    log_operation_start("Loading snapshot tables asynchronously from", &dir.display());
    let metadata = tokio::fs::metadata(dir).await.map_err(|e| {
        DashboardError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to access data directory {}: {e}", dir.display()),
        ))
    })?;
    if !metadata.is_dir() {
        return Err(DashboardError::Io(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            format!("Not a directory: {}", dir.display()),
        )));
    }

    let tasks = TableName::ALL.into_iter().map(|table| {
        let dir = dir.to_path_buf();
        async move {
            tokio::task::spawn_blocking(move || load_table(&dir, table))
                .await
                .map_err(|e| DashboardError::Io(std::io::Error::other(format!(
                    "Task join error while loading {table}: {e}"
                ))))?
                .map(|batch| batch.map(|b| (table, b)))
        }
    });
    let tables: Vec<_> = try_join_all(tasks).await?.into_iter().flatten().collect();

    log_operation_complete("loaded", &dir.display(), tables.len(), "tables", Some(start.elapsed()));
    Ok(tables)
}
