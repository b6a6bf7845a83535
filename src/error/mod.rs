//! Error handling for the dashboard core.
//!
//! Cell-level conditions (suppressed or missing values) are never errors; they
//! travel through the [`Cell`](crate::schema::cell::Cell) type and end up in
//! panel annotations. Only request-level and contract failures surface here.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

pub mod util;

/// Specialized error type for the dashboard core
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error from an Arrow compute kernel
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error turning record batch rows into typed records
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_arrow::Error),

    /// Error parsing a TOML document
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The requested school/year tuple has no rows
    #[error("Data unavailable: {what}")]
    DataUnavailable {
        /// Human-readable description of what was requested
        what: String,
    },

    /// A table carried a column outside its declared contract
    #[error("Schema mismatch in {table}: unexpected column '{column}'")]
    SchemaMismatch {
        /// Name of the table being decoded
        table: String,
        /// The offending column
        column: String,
    },

    /// A required configuration key is absent
    #[error("Missing configuration key: {0}")]
    ConfigMissing(String),

    /// Configuration values are present but inconsistent
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A value could not be converted to the expected type
    #[error("Type conversion error: {0}")]
    Conversion(String),
}

impl DashboardError {
    /// Shorthand for a [`DashboardError::DataUnavailable`]
    pub fn unavailable(what: impl Into<String>) -> Self {
        Self::DataUnavailable { what: what.into() }
    }

    /// Shorthand for a [`DashboardError::SchemaMismatch`]
    pub fn schema_mismatch(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Whether the error should collapse a view into an empty page rather than fail the call
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable { .. } | Self::Io(_) | Self::Parquet(_)
        )
    }
}

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
