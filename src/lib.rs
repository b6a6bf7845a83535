//! Computational core of a charter school accountability dashboard.
//!
//! Tables come from a read-only [`DataProvider`], are decoded into typed
//! records with suppressed and missing cells kept apart, and feed the peer
//! selection, proficiency, growth, roll-up and finance algorithms. The
//! [`Dashboard`] assembles their panels into serialisable view models.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod schema;
pub mod utils;
pub mod view;

// Core types
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use models::{
    AcademicFrame, AcademicRecord, AnalysisType, CorporationId, Datum, FinanceTable, Grade,
    GradeSpan, Panel, PanelKind, School, SchoolId, SchoolType, Table, YearLabel,
};
pub use schema::cell::Cell;
pub use schema::columns::{ColumnKey, Measure, Subject};

// Data access
pub use provider::{DataProvider, DataSnapshot};
pub use schema::tables::TableName;

// Algorithms
pub use algorithm::finance::{MetricSet, Rating};
pub use algorithm::growth::GrowthGrouping;
pub use algorithm::peers::{PeerEngine, PeerSelection};

// Views
pub use view::{Dashboard, ViewId, ViewModel, ViewRequest};

// Arrow types
pub use arrow::record_batch::RecordBatch;
