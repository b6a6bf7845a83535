//! Field extraction utilities for Arrow record batches
//!
//! Provider tables are Utf8 after normalisation, but callers embedding their
//! own batches may hand over numeric columns; extraction casts those to text
//! first so every value goes through the same sentinel coercion.

use arrow::array::{Array, ArrayRef, LargeStringArray, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::{DashboardError, Result};
use crate::schema::cell::Cell;
use crate::utils::arrow::array_utils::get_column;

/// Text values of an array, casting non-string arrays to Utf8
pub fn string_values(array: &ArrayRef) -> Result<Vec<Option<String>>> {
    match array.data_type() {
        DataType::Utf8 => {
            let strings = array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| DashboardError::Conversion("Utf8 column is not a StringArray".into()))?;
            Ok(strings.iter().map(|v| v.map(str::to_string)).collect())
        }
        DataType::LargeUtf8 => {
            let strings = array
                .as_any()
                .downcast_ref::<LargeStringArray>()
                .ok_or_else(|| {
                    DashboardError::Conversion("LargeUtf8 column is not a LargeStringArray".into())
                })?;
            Ok(strings.iter().map(|v| v.map(str::to_string)).collect())
        }
        DataType::Null => Ok(vec![None; array.len()]),
        _ => {
            let casted = cast(array, &DataType::Utf8)?;
            string_values(&casted)
        }
    }
}

/// Text values of a named column
pub fn column_strings(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<String>>> {
    let array = get_column(batch, column_name, true)?
        .ok_or_else(|| DashboardError::Conversion(format!("Column '{column_name}' not found")))?;
    string_values(&array)
}

/// Coerced cells of a named column
pub fn column_cells(batch: &RecordBatch, column_name: &str) -> Result<Vec<Cell>> {
    Ok(column_strings(batch, column_name)?
        .iter()
        .map(|v| Cell::parse(v.as_deref()))
        .collect())
}

/// Coerced cells of a column that may be absent; absent columns are all missing
pub fn optional_column_cells(batch: &RecordBatch, column_name: &str) -> Result<Vec<Cell>> {
    match get_column(batch, column_name, false)? {
        Some(array) => Ok(string_values(&array)?
            .iter()
            .map(|v| Cell::parse(v.as_deref()))
            .collect()),
        None => Ok(vec![Cell::Missing; batch.num_rows()]),
    }
}

/// Extract a string value from a record batch
///
/// # Returns
///
/// * `Ok(Some(String))` - The extracted, non-empty string value
/// * `Ok(None)` - If the value is null, empty or the column is absent
pub fn extract_string(batch: &RecordBatch, row: usize, column_name: &str) -> Result<Option<String>> {
    let Some(array) = get_column(batch, column_name, false)? else {
        return Ok(None);
    };
    if row >= array.len() || array.is_null(row) {
        return Ok(None);
    }
    let value = string_values(&array.slice(row, 1))?.pop().flatten();
    Ok(value.filter(|v| !v.trim().is_empty()))
}
