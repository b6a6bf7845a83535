//! Whole-batch conversions used when a snapshot is loaded

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::Result;

/// Cast every column of a batch to nullable Utf8
///
/// Provider contracts are stringly typed; normalising on load means every
/// value reaches [`Cell::parse`](crate::schema::cell::Cell::parse) the same
/// way whether the source file stored it as text or as a number.
pub fn normalize_to_utf8(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    if schema
        .fields()
        .iter()
        .all(|f| f.data_type() == &DataType::Utf8 && f.is_nullable())
    {
        return Ok(batch.clone());
    }
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let casted = if field.data_type() == &DataType::Utf8 {
            column.clone()
        } else {
            if matches!(field.data_type(), DataType::Float32 | DataType::Float64) {
                log::debug!("Casting float column '{}' to Utf8", field.name());
            }
            cast(column, &DataType::Utf8)?
        };
        fields.push(Field::new(field.name(), DataType::Utf8, true));
        columns.push(casted);
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Build a nullable Utf8 batch from named text columns
///
/// Used to embed provider tables without going through Parquet.
pub fn utf8_batch(columns: &[(&str, Vec<Option<&str>>)]) -> Result<RecordBatch> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, _)| Field::new(*name, DataType::Utf8, true))
        .collect();
    let arrays: Vec<ArrayRef> = columns
        .iter()
        .map(|(_, values)| Arc::new(StringArray::from(values.clone())) as ArrayRef)
        .collect();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Union of column names across batches, in first-seen order
#[must_use]
pub fn unified_utf8_schema(batches: &[RecordBatch]) -> SchemaRef {
    let mut names: Vec<String> = Vec::new();
    for batch in batches {
        for field in batch.schema().fields() {
            if !names.iter().any(|n| n == field.name()) {
                names.push(field.name().clone());
            }
        }
    }
    Arc::new(Schema::new(
        names
            .into_iter()
            .map(|n| Field::new(n, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ))
}

/// Project a Utf8 batch onto a wider Utf8 schema, filling absent columns with nulls
pub fn align_to_schema(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = schema
        .fields()
        .iter()
        .map(|field| match batch.schema().index_of(field.name()) {
            Ok(idx) => batch.column(idx).clone(),
            Err(_) => arrow::array::new_null_array(&DataType::Utf8, batch.num_rows()),
        })
        .collect();
    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

/// Normalise and concatenate batches that may disagree on column sets
pub fn concat_normalized(batches: &[RecordBatch]) -> Result<RecordBatch> {
    let normalized = batches
        .iter()
        .map(normalize_to_utf8)
        .collect::<Result<Vec<_>>>()?;
    let schema = unified_utf8_schema(&normalized);
    let aligned = normalized
        .iter()
        .map(|b| align_to_schema(b, &schema))
        .collect::<Result<Vec<_>>>()?;
    Ok(concat_batches(&schema, &aligned)?)
}
