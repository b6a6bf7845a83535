//! Parquet access for snapshot tables, plus Arrow and logging helpers

use std::path::{Path, PathBuf};
use std::time::Instant;

use ::arrow::record_batch::RecordBatch;
use itertools::Itertools;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rayon::prelude::*;

use crate::error::util::{safe_open_file, validate_directory};
use crate::error::{DashboardError, Result};

pub mod arrow;
pub mod logging;
#[cfg(test)]
pub mod test;

pub use logging::{log_operation_complete, log_operation_start, log_warning};

/// Rows per decoded batch unless `CHARTER_DASH_BATCH_SIZE` overrides it
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Batch size override from the environment, ignoring zero and garbage
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var("CHARTER_DASH_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// Decode one Parquet file into record batches
///
/// # Errors
/// Io when the file cannot be opened, Parquet or Arrow when it does not decode
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let start = Instant::now();
    log_operation_start("Reading parquet file", &path.display());

    let file = safe_open_file(path, "parquet table")?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE))
        .build()?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    log_operation_complete("read", &path.display(), batches.len(), "batches", Some(start.elapsed()));
    Ok(batches)
}

/// `*.parquet` files directly inside `dir`, in file-name order
///
/// # Errors
/// Io when `dir` is missing or unreadable
pub fn find_parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    validate_directory(dir, "parquet table directory")?;

    let parquet_files = std::fs::read_dir(dir)?
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(entry) => {
                let path = entry.path();
                (path.is_file() && path.extension().is_some_and(|ext| ext == "parquet"))
                    .then_some(Ok(path))
            }
            Err(e) => Some(Err(DashboardError::Io(e))),
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .sorted()
        .collect_vec();

    if parquet_files.is_empty() {
        log_warning("No Parquet files found in directory", Some(&dir.display()));
    }
    Ok(parquet_files)
}

/// Read every part file of a table directory on the rayon pool
///
/// # Errors
/// The first failure among the directory listing and the part reads
pub fn load_parquet_files_parallel(dir: &Path) -> Result<Vec<RecordBatch>> {
    let parquet_files = find_parquet_files(dir)?;
    if parquet_files.is_empty() {
        return Ok(Vec::new());
    }

    let all_batches: Vec<Result<Vec<RecordBatch>>> =
        parquet_files.par_iter().map(|path| read_parquet(path)).collect();

    let mut combined = Vec::new();
    for result in all_batches {
        combined.extend(result?);
    }

    log::info!(
        "{}: {} batches from {} part files",
        dir.display(),
        combined.len(),
        parquet_files.len()
    );
    Ok(combined)
}
