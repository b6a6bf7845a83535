//! Utilities for selecting columns and rows from record batches.

use arrow::array::{ArrayRef, BooleanArray};
use arrow::compute;
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashSet;

use crate::error::{DashboardError, Result};
use crate::utils::arrow::extractors::string_values;

/// Get a column from a record batch by name
///
/// # Returns
///
/// * `Ok(Some(ArrayRef))` - The column if found
/// * `Ok(None)` - If the column is not found and `required` is false
/// * `Err` - If the column is not found and `required` is true
pub fn get_column(batch: &RecordBatch, column_name: &str, required: bool) -> Result<Option<ArrayRef>> {
    match batch.schema().index_of(column_name) {
        Ok(idx) => Ok(Some(batch.column(idx).clone())),
        Err(_) if required => Err(DashboardError::Conversion(format!(
            "Column '{column_name}' not found in record batch"
        ))),
        Err(_) => Ok(None),
    }
}

/// Apply a boolean mask to every column of a batch
pub fn filter_record_batch(batch: &RecordBatch, mask: &BooleanArray) -> Result<RecordBatch> {
    Ok(compute::filter_record_batch(batch, mask)?)
}

/// Keep rows whose `column` value (as text) is one of `keys`
///
/// Numeric identifiers that went through a float column (`"1234.0"`) match
/// their integer key.
pub fn filter_batch_by_keys(
    batch: &RecordBatch,
    column: &str,
    keys: &FxHashSet<String>,
) -> Result<RecordBatch> {
    let Some(array) = get_column(batch, column, false)? else {
        log::warn!("Key column '{column}' not present; returning no rows");
        return Ok(batch.slice(0, 0));
    };
    let values = string_values(&array)?;
    let mask: BooleanArray = values
        .iter()
        .map(|value| {
            Some(value.as_deref().is_some_and(|v| {
                let v = v.trim();
                keys.contains(v) || v.strip_suffix(".0").is_some_and(|s| keys.contains(s))
            }))
        })
        .collect();
    filter_record_batch(batch, &mask)
}

/// Keep rows where every `(column, value)` predicate matches
pub fn filter_batch_by_values(batch: &RecordBatch, predicates: &[(&str, &str)]) -> Result<RecordBatch> {
    let mut keep = vec![true; batch.num_rows()];
    for (column, expected) in predicates {
        let Some(array) = get_column(batch, column, false)? else {
            return Ok(batch.slice(0, 0));
        };
        for (flag, value) in keep.iter_mut().zip(string_values(&array)?) {
            let matches = value.as_deref().is_some_and(|v| {
                let v = v.trim();
                v == *expected || v.strip_suffix(".0") == Some(expected)
            });
            *flag &= matches;
        }
    }
    let mask = BooleanArray::from(keep);
    filter_record_batch(batch, &mask)
}
