//! Arrow data handling utilities
//!
//! Helpers for reading stringly-typed provider columns, filtering record
//! batches by key columns and normalising batches on load.

pub mod array_utils;
pub mod conversion;
pub mod extractors;

pub use array_utils::{filter_batch_by_keys, filter_batch_by_values, get_column};
pub use conversion::{concat_normalized, normalize_to_utf8, utf8_batch};
pub use extractors::{column_cells, column_strings, extract_string, optional_column_cells};
