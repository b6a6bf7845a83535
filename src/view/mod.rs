//! View assembly
//!
//! A view is identified by a [`ViewId`] and requested through a
//! [`ViewRequest`]. The [`Dashboard`] resolves the request against the data
//! provider and returns a [`ViewModel`]: an ordered list of panels plus the
//! reconciled peer state for analysis views. Presentation consumes the model
//! without further computation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithm::growth::GrowthGrouping;
use crate::algorithm::peers::PeerSelection;
use crate::error::{DashboardError, Result};
use crate::models::{AnalysisType, Panel, SchoolId};

pub mod assemble;
pub mod overview;

pub use assemble::Dashboard;

/// Views the dashboard can assemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewId {
    Overview,
    AcademicInfoK8,
    AcademicInfoHs,
    AcademicAnalysisK8,
    AcademicAnalysisHs,
    AcademicAnalysisMultiYear,
    Growth,
    EnglishLearner,
    FinancialInfo,
    FinancialMetrics,
}

impl ViewId {
    pub const ALL: [Self; 10] = [
        Self::Overview,
        Self::AcademicInfoK8,
        Self::AcademicInfoHs,
        Self::AcademicAnalysisK8,
        Self::AcademicAnalysisHs,
        Self::AcademicAnalysisMultiYear,
        Self::Growth,
        Self::EnglishLearner,
        Self::FinancialInfo,
        Self::FinancialMetrics,
    ];

    /// Identifier used on the command line and in JSON
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::AcademicInfoK8 => "academic_info_k8",
            Self::AcademicInfoHs => "academic_info_hs",
            Self::AcademicAnalysisK8 => "academic_analysis_k8",
            Self::AcademicAnalysisHs => "academic_analysis_hs",
            Self::AcademicAnalysisMultiYear => "academic_analysis_multi_year",
            Self::Growth => "growth",
            Self::EnglishLearner => "english_learner",
            Self::FinancialInfo => "financial_info",
            Self::FinancialMetrics => "financial_metrics",
        }
    }

    /// Page heading
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overview => "About",
            Self::AcademicInfoK8 => "Academic Information (K-8)",
            Self::AcademicInfoHs => "Academic Information (High School)",
            Self::AcademicAnalysisK8 => "Academic Analysis (K-8)",
            Self::AcademicAnalysisHs => "Academic Analysis (High School)",
            Self::AcademicAnalysisMultiYear => "Academic Analysis (Year over Year)",
            Self::Growth => "Academic Growth",
            Self::EnglishLearner => "English Learners and Early Literacy",
            Self::FinancialInfo => "Financial Information",
            Self::FinancialMetrics => "Financial Metrics",
        }
    }

    /// Whether the view compares the school with peers
    #[must_use]
    pub const fn uses_peers(self) -> bool {
        matches!(
            self,
            Self::AcademicAnalysisK8 | Self::AcademicAnalysisHs | Self::AcademicAnalysisMultiYear
        )
    }

    /// Academic family a view is tied to, if any
    #[must_use]
    pub const fn analysis(self) -> Option<AnalysisType> {
        match self {
            Self::AcademicInfoK8 | Self::AcademicAnalysisK8 => Some(AnalysisType::K8),
            Self::AcademicInfoHs | Self::AcademicAnalysisHs => Some(AnalysisType::HS),
            _ => None,
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ViewId {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|v| v.slug() == wanted)
            .ok_or_else(|| DashboardError::Conversion(format!("Unknown view '{s}'")))
    }
}

/// Parameters of one view assembly
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub school_id: SchoolId,
    /// Display year; resolved by the dashboard when absent
    pub year: Option<u16>,
    pub view: ViewId,
    /// Peers held from a previous request
    pub peers: Vec<SchoolId>,
    pub growth_grouping: GrowthGrouping,
    /// Academic column name for the year-over-year view
    pub column: Option<String>,
}

impl ViewRequest {
    #[must_use]
    pub fn new(school_id: SchoolId, view: ViewId) -> Self {
        Self {
            school_id,
            year: None,
            view,
            peers: Vec::new(),
            growth_grouping: GrowthGrouping::default(),
            column: None,
        }
    }

    #[must_use]
    pub const fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn with_peers(mut self, peers: impl IntoIterator<Item = SchoolId>) -> Self {
        self.peers = peers.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn with_growth_grouping(mut self, grouping: GrowthGrouping) -> Self {
        self.growth_grouping = grouping;
        self
    }

    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

/// Everything a presenter needs to render one view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub school_id: SchoolId,
    pub year: Option<u16>,
    pub view: ViewId,
    pub label: String,
    /// No data for the request; `diagnostic` says why
    pub empty: bool,
    pub diagnostic: Option<String>,
    pub panels: Vec<Panel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_selection: Option<PeerSelection>,
}

impl ViewModel {
    /// A populated view
    #[must_use]
    pub fn new(request: &ViewRequest, year: u16, panels: Vec<Panel>) -> Self {
        let empty = panels.is_empty() || panels.iter().all(|p| p.empty);
        Self {
            school_id: request.school_id,
            year: Some(year),
            view: request.view,
            label: request.view.label().to_string(),
            empty,
            diagnostic: None,
            panels,
            peer_selection: None,
        }
    }

    /// An empty page carrying the reason nothing could be shown
    #[must_use]
    pub fn unavailable(request: &ViewRequest, year: Option<u16>, diagnostic: impl Into<String>) -> Self {
        Self {
            school_id: request.school_id,
            year,
            view: request.view,
            label: request.view.label().to_string(),
            empty: true,
            diagnostic: Some(diagnostic.into()),
            panels: Vec::new(),
            peer_selection: None,
        }
    }

    #[must_use]
    pub fn with_peer_selection(mut self, selection: PeerSelection) -> Self {
        self.peer_selection = Some(selection);
        self
    }

    /// First panel with the given title
    #[must_use]
    pub fn panel(&self, title: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.title == title)
    }

    /// JSON document for the presenter
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DashboardError::Conversion(e.to_string()))
    }
}
