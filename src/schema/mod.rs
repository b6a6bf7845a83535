//! Column-level contracts shared by the provider, the models and the views
//!
//! * [`cell`] coerces stringly-typed values into sentinel-preserving cells
//! * [`columns`] is the typed index of academic column names
//! * [`tables`] declares the column contract of every provider table

pub mod cell;
pub mod columns;
pub mod tables;

pub use cell::{Cell, SUPPRESSED_TOKEN, sum_cells};
pub use columns::{Band, ColumnKey, Grouping, Measure, Subject};
pub use tables::{Contract, TableName, validate_schema};
