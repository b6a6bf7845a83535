//! Read-only data access layer
//!
//! Every query returns a Utf8 [`RecordBatch`] whose columns follow the table
//! contracts in [`crate::schema::tables`]. An empty batch means "no rows";
//! [`DashboardError::DataUnavailable`](crate::error::DashboardError) is
//! reserved for tables the provider does not carry at all.

use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::models::{AnalysisType, AttendanceScope, CorporationId, SchoolId};

pub mod loader;
pub mod snapshot;

pub use snapshot::DataSnapshot;

/// Column carrying the K8 peer cohort size in geo rows
pub const GEO_TESTED_COLUMN: &str = "Total|ELA Total Tested";

/// Named tabular queries over one immutable snapshot of state data
pub trait DataProvider: Send + Sync {
    /// Identity of the underlying snapshot; changes whenever data is reloaded
    fn snapshot_id(&self) -> u64;

    /// Index rows of one school
    fn school_index(&self, id: SchoolId) -> Result<RecordBatch>;

    /// Every school in the index
    fn all_schools(&self) -> Result<RecordBatch>;

    /// All years of K8 academic data for a school
    fn k8_academic(&self, id: SchoolId) -> Result<RecordBatch>;

    /// All years of HS academic data for a school
    fn hs_academic(&self, id: SchoolId) -> Result<RecordBatch>;

    /// All years of K8 aggregates for a corporation
    fn corp_k8(&self, id: CorporationId) -> Result<RecordBatch>;

    /// All years of HS aggregates for a corporation
    fn corp_hs(&self, id: CorporationId) -> Result<RecordBatch>;

    /// Enrollment demographics for a school or corporation id
    fn demographics(&self, id: u32) -> Result<RecordBatch>;

    /// Wide audited-finance table of a school
    fn financial(&self, id: SchoolId) -> Result<RecordBatch>;

    /// Student growth records attributed to a school
    fn growth_student(&self, id: SchoolId) -> Result<RecordBatch>;

    /// Student IREAD records attributed to a school
    fn iread_student(&self, id: SchoolId) -> Result<RecordBatch>;

    /// WIDA records for a set of students
    fn wida_student(&self, stns: &FxHashSet<String>) -> Result<RecordBatch>;

    /// STNs enrolled at a school
    fn school_stns(&self, id: SchoolId) -> Result<RecordBatch>;

    /// Geographic universe of one year: schools of the analysis' types with
    /// academic rows that year, carrying grade span, coordinates and (K8) the
    /// `Total|ELA Total Tested` cohort size
    fn all_schools_geo(&self, year: u16, analysis: AnalysisType) -> Result<RecordBatch>;

    /// Attendance figures of a school or corporation for every year up to `year`
    fn attendance(&self, id: u32, scope: AttendanceScope, year: u16) -> Result<RecordBatch>;
}
