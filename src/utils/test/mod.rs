//! Test helpers shared by the unit tests

use std::fs::File;
use std::path::Path;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::utils::arrow::conversion::utf8_batch;

/// Build a Utf8 batch from named text columns
pub fn batch_from_columns(columns: &[(&str, Vec<Option<&str>>)]) -> RecordBatch {
    utf8_batch(columns).unwrap()
}

/// Write a batch to a Parquet file
pub fn write_parquet(path: &Path, batch: &RecordBatch) {
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}
