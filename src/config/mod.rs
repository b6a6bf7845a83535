//! Configuration for the dashboard core.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::util::safe_read_to_string;
use crate::error::{DashboardError, Result};

/// Environment variable overriding `data_dir`
pub const DATA_DIR_ENV: &str = "CHARTER_DASH_DATA_DIR";

/// Configuration for the dashboard core
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Directory holding the provider's Parquet tables
    pub data_dir: Option<PathBuf>,
    /// Number of years shown by multi-year views
    pub max_display_years: usize,
    /// Peers pre-selected when the held selection is reset
    pub peer_default_count: usize,
    /// Maximum peers a user may select, not counting the selected school
    pub peer_max_selectable: usize,
    /// Size of the comparable universe for the year-over-year view
    pub peer_universe_size: usize,
    /// Size of the comparable universe for the single-year views
    pub peer_universe_size_single_year: usize,
    /// Minimum `Total|ELA Total Tested` for a K8 peer
    pub min_tested_for_peer: f64,
    /// Grades two spans must share for a candidate to be comparable
    pub overlap_grades_required: u8,
    /// Non-zero numeric cells a finance year needs to be kept
    pub min_valid_finance_cells: usize,
    /// Students `Total Enrollment` may differ from the ethnicity sum
    pub enrollment_tolerance: f64,
    /// Fixed academic year; derived from the provider when absent
    pub current_academic_year: Option<u16>,
    /// TOML metric-definition set replacing the built-in one
    pub metrics_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_display_years: 5,
            peer_default_count: 4,
            peer_max_selectable: 7,
            peer_universe_size: 20,
            peer_universe_size_single_year: 20,
            min_tested_for_peer: 20.0,
            overlap_grades_required: 2,
            min_valid_finance_cells: 12,
            enrollment_tolerance: 0.0,
            current_academic_year: None,
            metrics_file: None,
        }
    }
}

impl DashboardConfig {
    /// Create a new instance with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let text = safe_read_to_string(path, "dashboard configuration")?;
        let mut config: Self = toml::from_str(&text)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            log::debug!("Using data directory from {DATA_DIR_ENV}");
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Reject inconsistent values
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(DashboardError::ConfigInvalid(msg));
        if self.max_display_years == 0 {
            return invalid("max_display_years must be at least 1".into());
        }
        if self.peer_max_selectable == 0 {
            return invalid("peer_max_selectable must be at least 1".into());
        }
        if self.peer_default_count > self.peer_max_selectable {
            return invalid(format!(
                "peer_default_count ({}) exceeds peer_max_selectable ({})",
                self.peer_default_count, self.peer_max_selectable
            ));
        }
        if self.peer_universe_size < self.peer_default_count
            || self.peer_universe_size_single_year < self.peer_default_count
        {
            return invalid("peer universe sizes must cover peer_default_count".into());
        }
        if self.overlap_grades_required == 0 {
            return invalid("overlap_grades_required must be at least 1".into());
        }
        if self.min_tested_for_peer < 0.0 || self.enrollment_tolerance < 0.0 {
            return invalid("thresholds must be non-negative".into());
        }
        Ok(())
    }

    /// The configured data directory
    ///
    /// # Errors
    /// Returns [`DashboardError::ConfigMissing`] when no directory is configured
    pub fn require_data_dir(&self) -> Result<&Path> {
        self.data_dir
            .as_deref()
            .ok_or_else(|| DashboardError::ConfigMissing("data_dir".into()))
    }

    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn with_current_year(mut self, year: u16) -> Self {
        self.current_academic_year = Some(year);
        self
    }

    #[must_use]
    pub const fn with_max_display_years(mut self, years: usize) -> Self {
        self.max_display_years = years;
        self
    }

    #[must_use]
    pub const fn with_peer_counts(mut self, default_count: usize, max_selectable: usize) -> Self {
        self.peer_default_count = default_count;
        self.peer_max_selectable = max_selectable;
        self
    }

    #[must_use]
    pub const fn with_overlap_grades_required(mut self, grades: u8) -> Self {
        self.overlap_grades_required = grades;
        self
    }
}

impl fmt::Display for DashboardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dashboard Configuration:")?;
        match &self.data_dir {
            Some(dir) => writeln!(f, "  Data directory: {}", dir.display())?,
            None => writeln!(f, "  Data directory: <unset>")?,
        }
        writeln!(f, "  Display years: {}", self.max_display_years)?;
        writeln!(
            f,
            "  Peers: default {}, max {}, universe {} (single-year {})",
            self.peer_default_count,
            self.peer_max_selectable,
            self.peer_universe_size,
            self.peer_universe_size_single_year
        )?;
        writeln!(f, "  Minimum tested for peer: {}", self.min_tested_for_peer)?;
        writeln!(f, "  Overlap grades required: {}", self.overlap_grades_required)?;
        writeln!(f, "  Minimum valid finance cells: {}", self.min_valid_finance_cells)?;
        if let Some(year) = self.current_academic_year {
            writeln!(f, "  Academic year: {year}")?;
        }
        if let Some(file) = &self.metrics_file {
            writeln!(f, "  Metrics file: {}", file.display())?;
        }
        Ok(())
    }
}
