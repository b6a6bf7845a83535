//! The dashboard: resolves view requests against a data provider
//!
//! Within one assembly components run in a fixed order: provider queries,
//! record decoding, peer selection where the view needs it, the view's
//! algorithm, and finally the view model. A provider miss collapses the view
//! into an empty page with a diagnostic; contract and configuration failures
//! are returned as errors.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use super::overview::{attendance_panel, composition_panels, demographic_years, enrollment_panel};
use super::{ViewId, ViewModel, ViewRequest};
use crate::algorithm::finance::{MetricSet, financial_info_panels, financial_metrics_panels};
use crate::algorithm::growth::growth_panels;
use crate::algorithm::peers::{PeerEngine, PeerQuery, PeerSelection, reconcile};
use crate::algorithm::proficiency::{
    self, combine, hs::corporation_comparable, multi_year_panel, year_window,
};
use crate::algorithm::rollup::{
    cohort_panel, iread_panel, match_cohort, stn_universe, summarize, summarize_cohort, wida_panel,
};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::models::records::stns_from_batch;
use crate::models::{
    AcademicRecord, AnalysisType, AttendanceRecord, AttendanceScope, DemographicRecord,
    FinanceTable, GrowthRecord, IreadRecord, Panel, RowKind, School, SchoolId, SchoolType,
    WidaRecord,
};
use crate::provider::{DataProvider, DataSnapshot};
use crate::schema::columns::{AHS, ColumnKey, Measure, Subject, TOTAL};
use crate::utils::{log_operation_complete, log_operation_start};

type Assembled = (Vec<Panel>, Option<PeerSelection>);

/// Entry point of the dashboard core
pub struct Dashboard {
    provider: Arc<dyn DataProvider>,
    config: DashboardConfig,
    metrics: MetricSet,
    peers: PeerEngine,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("snapshot", &self.provider.snapshot_id())
            .field("config", &self.config)
            .field("metrics", &self.metrics.metrics.len())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// A dashboard over an existing provider
    ///
    /// # Errors
    /// Returns a configuration error when the config is inconsistent or the
    /// metric definition file cannot be read
    pub fn new(provider: Arc<dyn DataProvider>, config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let metrics = MetricSet::from_config(config.metrics_file.as_deref())?;
        log::debug!("Loaded {} financial metric definitions", metrics.metrics.len());
        Ok(Self {
            provider,
            config,
            metrics,
            peers: PeerEngine::new(),
        })
    }

    /// Load the configured Parquet directory into a snapshot
    pub fn open(config: DashboardConfig) -> Result<Self> {
        let snapshot = DataSnapshot::load_dir(config.require_data_dir()?)?;
        Self::new(Arc::new(snapshot), config)
    }

    /// Load the configured Parquet directory without blocking the runtime
    pub async fn open_async(config: DashboardConfig) -> Result<Self> {
        let dir = config.require_data_dir()?.to_path_buf();
        let snapshot = DataSnapshot::load_dir_async(&dir).await?;
        Self::new(Arc::new(snapshot), config)
    }

    /// Replace the financial metric definitions
    #[must_use]
    pub fn with_metric_set(mut self, metrics: MetricSet) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    #[must_use]
    pub fn provider(&self) -> &dyn DataProvider {
        self.provider.as_ref()
    }

    #[must_use]
    pub const fn peer_engine(&self) -> &PeerEngine {
        &self.peers
    }

    /// Index entry of one school
    pub fn school(&self, id: SchoolId) -> Result<School> {
        School::from_batch(&self.provider.school_index(id)?)?
            .into_iter()
            .next()
            .ok_or_else(|| DashboardError::unavailable(format!("school {id} is not in the index")))
    }

    /// Display year when the request does not name one
    ///
    /// The configured academic year wins; otherwise the most recent year the
    /// provider has academic or demographic rows for.
    pub fn resolve_year(&self, school: &School) -> Result<u16> {
        if let Some(year) = self.config.current_academic_year {
            return Ok(year);
        }
        let mut latest = None;
        if school.school_type.has_k8() {
            latest = latest.max(self.academic(school.id, AnalysisType::K8)?.iter().map(|r| r.meta.year).max());
        }
        if school.school_type.has_hs() {
            latest = latest.max(self.academic(school.id, AnalysisType::HS)?.iter().map(|r| r.meta.year).max());
        }
        if latest.is_none() {
            latest = DemographicRecord::from_batch(&self.provider.demographics(school.id.0)?)?
                .iter()
                .map(|r| r.year)
                .max();
        }
        latest.ok_or_else(|| DashboardError::unavailable(format!("no yearly data for school {}", school.id)))
    }

    /// Assemble one view
    ///
    /// # Errors
    /// Provider misses produce an empty [`ViewModel`]; schema mismatches,
    /// conversion failures and invalid requests are returned as errors.
    pub fn build(&self, request: &ViewRequest) -> Result<ViewModel> {
        let start = Instant::now();
        let target = format!("{} for school {}", request.view, request.school_id);
        log_operation_start("Assembling", &target);

        let school = match self.school(request.school_id) {
            Ok(school) => school,
            Err(e) if e.is_recoverable() => return Ok(ViewModel::unavailable(request, request.year, e.to_string())),
            Err(e) => return Err(e),
        };
        let year = match request.year.map_or_else(|| self.resolve_year(&school), Ok) {
            Ok(year) => year,
            Err(e) if e.is_recoverable() => return Ok(ViewModel::unavailable(request, None, e.to_string())),
            Err(e) => return Err(e),
        };

        let assembled = match request.view {
            ViewId::Overview => self.overview(&school, year),
            ViewId::AcademicInfoK8 => self.academic_info(&school, year, AnalysisType::K8),
            ViewId::AcademicInfoHs => self.academic_info(&school, year, AnalysisType::HS),
            ViewId::AcademicAnalysisK8 => self.academic_analysis(request, &school, year, AnalysisType::K8),
            ViewId::AcademicAnalysisHs => self.academic_analysis(request, &school, year, AnalysisType::HS),
            ViewId::AcademicAnalysisMultiYear => self.multi_year_analysis(request, &school, year),
            ViewId::Growth => self.growth(request, &school, year),
            ViewId::EnglishLearner => self.english_learner(&school, year),
            ViewId::FinancialInfo => self.financial(&school, year, false),
            ViewId::FinancialMetrics => self.financial(&school, year, true),
        };

        let model = match assembled {
            Ok((panels, selection)) => {
                let model = ViewModel::new(request, year, panels);
                match selection {
                    Some(selection) => model.with_peer_selection(selection),
                    None => model,
                }
            }
            Err(e) if e.is_recoverable() => {
                log::info!("{target} has no data: {e}");
                ViewModel::unavailable(request, Some(year), e.to_string())
            }
            Err(e) => return Err(e),
        };
        log_operation_complete("assembled", &target, model.panels.len(), "panels", Some(start.elapsed()));
        Ok(model)
    }

    fn academic_batch(&self, id: SchoolId, analysis: AnalysisType) -> Result<arrow::record_batch::RecordBatch> {
        match analysis {
            AnalysisType::K8 => self.provider.k8_academic(id),
            AnalysisType::HS => self.provider.hs_academic(id),
        }
    }

    fn academic(&self, id: SchoolId, analysis: AnalysisType) -> Result<Vec<AcademicRecord>> {
        AcademicRecord::from_batch(&self.academic_batch(id, analysis)?, RowKind::Selected)
    }

    fn corporation(&self, school: &School, analysis: AnalysisType) -> Result<Vec<AcademicRecord>> {
        let batch = match analysis {
            AnalysisType::K8 => self.provider.corp_k8(school.corporation_id)?,
            AnalysisType::HS => self.provider.corp_hs(school.corporation_id)?,
        };
        AcademicRecord::from_batch(&batch, RowKind::Corporation)
    }

    fn require_family(school: &School, analysis: AnalysisType) -> Result<()> {
        let reports = match analysis {
            AnalysisType::K8 => school.school_type.has_k8(),
            AnalysisType::HS => school.school_type.has_hs(),
        };
        if reports {
            Ok(())
        } else {
            Err(DashboardError::unavailable(format!(
                "{} school {} has no {analysis} academic data",
                school.school_type, school.id
            )))
        }
    }

    fn overview(&self, school: &School, year: u16) -> Result<Assembled> {
        let records = DemographicRecord::from_batch(&self.provider.demographics(school.id.0)?)?;
        let corporation = DemographicRecord::from_batch(&self.provider.demographics(school.corporation_id.0)?)?;
        let years = demographic_years(&records, year, self.config.max_display_years);
        if years.is_empty() {
            return Err(DashboardError::unavailable(format!(
                "demographics for school {} up to {year}",
                school.id
            )));
        }
        let mut panels = vec![enrollment_panel(&records, &years, self.config.enrollment_tolerance)];
        panels.extend(composition_panels(&records, &corporation, year));
        Ok((panels, None))
    }

    fn attendance(&self, school: &School, year: u16, years: &[u16]) -> Result<Panel> {
        let own = AttendanceRecord::from_batch(&self.provider.attendance(school.id.0, AttendanceScope::School, year)?)?;
        let corp = AttendanceRecord::from_batch(&self.provider.attendance(
            school.corporation_id.0,
            AttendanceScope::Corporation,
            year,
        )?)?;
        Ok(attendance_panel(&own, &corp, years))
    }

    fn academic_info(&self, school: &School, year: u16, analysis: AnalysisType) -> Result<Assembled> {
        Self::require_family(school, analysis)?;
        let records: Vec<AcademicRecord> = self
            .academic(school.id, analysis)?
            .into_iter()
            .filter(|r| r.meta.year <= year)
            .collect();
        let years = year_window(&records, year, self.config.max_display_years);
        if years.is_empty() {
            return Err(DashboardError::unavailable(format!(
                "{analysis} academic data for school {} up to {year}",
                school.id
            )));
        }
        let corporation = self.corporation(school, analysis)?;
        let mut panels = match analysis {
            AnalysisType::K8 => proficiency::k8_info(&records, &corporation, &years),
            AnalysisType::HS => proficiency::hs_info(&records, &corporation, school.school_type, &years),
        };
        match self.attendance(school, year, &years) {
            Ok(panel) => panels.push(panel),
            Err(e) if e.is_recoverable() => log::debug!("No attendance for school {}: {e}", school.id),
            Err(e) => return Err(e),
        }
        Ok((panels, None))
    }

    fn peer_selection(
        &self,
        request: &ViewRequest,
        school: &School,
        year: u16,
        analysis: AnalysisType,
        universe_size: usize,
    ) -> Result<PeerSelection> {
        let query = PeerQuery {
            school_id: school.id,
            year,
            analysis,
            universe_size,
            min_tested: self.config.min_tested_for_peer,
            overlap_grades_required: self.config.overlap_grades_required,
        };
        let computed = self.peers.comparable_schools(self.provider.as_ref(), &query)?;
        let selection = reconcile(
            &request.peers,
            &computed,
            self.config.peer_default_count,
            self.config.peer_max_selectable,
        );
        if let Some(warning) = &selection.warning {
            log::info!("Peer selection for school {}: {warning}", school.id);
        }
        Ok(selection)
    }

    /// Every academic year of each selected peer
    fn peer_records(&self, peers: &[SchoolId], analysis: AnalysisType) -> Result<Vec<Vec<AcademicRecord>>> {
        peers
            .par_iter()
            .map(|id| AcademicRecord::from_batch(&self.academic_batch(*id, analysis)?, RowKind::Peer))
            .collect()
    }

    fn academic_analysis(
        &self,
        request: &ViewRequest,
        school: &School,
        year: u16,
        analysis: AnalysisType,
    ) -> Result<Assembled> {
        Self::require_family(school, analysis)?;
        let selected = self
            .academic(school.id, analysis)?
            .into_iter()
            .find(|r| r.meta.year == year)
            .ok_or_else(|| {
                DashboardError::unavailable(format!("{analysis} academic data for school {} in {year}", school.id))
            })?;

        let selection = self.peer_selection(request, school, year, analysis, self.config.peer_universe_size_single_year)?;
        let peers: Vec<AcademicRecord> = self
            .peer_records(&selection.peers, analysis)?
            .into_iter()
            .filter_map(|records| records.into_iter().find(|r| r.meta.year == year))
            .collect();
        let include_corp = analysis == AnalysisType::K8 || corporation_comparable(school.school_type);
        let corporation = if include_corp {
            self.corporation(school, analysis)?.into_iter().find(|r| r.meta.year == year)
        } else {
            None
        };

        let span = selected.meta.span().or_else(|| school.span());
        let breakdown_source = selected.clone();
        let reweight = (analysis == AnalysisType::K8).then_some(span).flatten();
        let (frame, dropped) = combine(selected, corporation, peers, reweight);
        if !dropped.is_empty() {
            log::debug!("Dropped {} columns the school has no value for", dropped.len());
        }

        let mut panels = match analysis {
            AnalysisType::K8 => proficiency::k8_analysis(&frame, span),
            AnalysisType::HS => proficiency::hs_analysis(&frame, school.school_type),
        };
        panels.extend(match analysis {
            AnalysisType::K8 => proficiency::k8_breakdowns(&breakdown_source, span),
            AnalysisType::HS => proficiency::hs_breakdowns(&breakdown_source, school.school_type),
        });
        Ok((panels, Some(selection)))
    }

    fn default_column(school_type: SchoolType) -> ColumnKey {
        match school_type {
            SchoolType::K8 | SchoolType::K12 => ColumnKey::proficient(TOTAL, Subject::Ela),
            SchoolType::HS => ColumnKey::subjectless(TOTAL, Measure::GraduationRate),
            SchoolType::AHS => ColumnKey::subjectless(AHS, Measure::CcrPercent),
        }
    }

    fn multi_year_analysis(&self, request: &ViewRequest, school: &School, year: u16) -> Result<Assembled> {
        let key = match request.column.as_deref() {
            Some(name) => ColumnKey::parse(name)
                .ok_or_else(|| DashboardError::Conversion(format!("'{name}' is not an academic column")))?,
            None => Self::default_column(school.school_type),
        };
        let analysis = match key.measure {
            Measure::GraduationRate
            | Measure::CohortCount
            | Measure::Graduates
            | Measure::CcrPercent
            | Measure::CcrCount
            | Measure::BenchmarkPct
            | Measure::Benchmark(_) => AnalysisType::HS,
            _ => AnalysisType::K8,
        };
        Self::require_family(school, analysis)?;

        let records = self.academic(school.id, analysis)?;
        let years = year_window(&records, year, self.config.max_display_years);
        if years.is_empty() {
            return Err(DashboardError::unavailable(format!(
                "{analysis} academic data for school {} up to {year}",
                school.id
            )));
        }
        let selection = self.peer_selection(request, school, year, analysis, self.config.peer_universe_size)?;
        let peer_records = self.peer_records(&selection.peers, analysis)?;
        let corporation = if analysis == AnalysisType::K8 || corporation_comparable(school.school_type) {
            self.corporation(school, analysis)?
        } else {
            Vec::new()
        };

        let frames: Vec<_> = years
            .iter()
            .filter_map(|y| {
                let selected = records.iter().find(|r| r.meta.year == *y)?.clone();
                let span = selected.meta.span().or_else(|| school.span());
                let reweight = (analysis == AnalysisType::K8).then_some(span).flatten();
                let corp = corporation.iter().find(|r| r.meta.year == *y).cloned();
                let peers = peer_records
                    .iter()
                    .filter_map(|p| p.iter().find(|r| r.meta.year == *y).cloned())
                    .collect();
                Some(combine(selected, corp, peers, reweight).0)
            })
            .collect();
        Ok((vec![multi_year_panel(&frames, &key)], Some(selection)))
    }

    fn growth(&self, request: &ViewRequest, school: &School, year: u16) -> Result<Assembled> {
        let records: Vec<GrowthRecord> = GrowthRecord::from_batch(&self.provider.growth_student(school.id)?)?
            .into_iter()
            .filter(|r| r.test_year <= year)
            .collect();
        if records.is_empty() {
            return Err(DashboardError::unavailable(format!("growth data for school {} up to {year}", school.id)));
        }
        Ok((growth_panels(&records, request.growth_grouping), None))
    }

    fn english_learner(&self, school: &School, year: u16) -> Result<Assembled> {
        let iread: Vec<IreadRecord> = IreadRecord::from_batch(&self.provider.iread_student(school.id)?)?
            .into_iter()
            .filter(|r| r.year <= year)
            .collect();
        let enrolled = stns_from_batch(&self.provider.school_stns(school.id)?)?;
        let universe = stn_universe(&iread, &enrolled);
        let wida: Vec<WidaRecord> = WidaRecord::from_batch(&self.provider.wida_student(&universe)?)?
            .into_iter()
            .filter(|r| r.year <= year)
            .collect();
        if iread.is_empty() && wida.is_empty() {
            return Err(DashboardError::unavailable(format!(
                "IREAD and WIDA data for school {} up to {year}",
                school.id
            )));
        }

        let mut years: Vec<u16> = iread.iter().map(|r| r.year).chain(wida.iter().map(|r| r.year)).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        years.truncate(self.config.max_display_years);

        let school_rows = if school.school_type.has_k8() {
            self.academic(school.id, AnalysisType::K8)?
        } else {
            Vec::new()
        };
        let summary = summarize(&wida, &universe);
        let cohort = summarize_cohort(&match_cohort(&iread, &wida));
        Ok((
            vec![
                iread_panel(&iread, &school_rows, &years),
                wida_panel(&summary, &years),
                cohort_panel(&cohort),
            ],
            None,
        ))
    }

    fn financial(&self, school: &School, year: u16, metrics: bool) -> Result<Assembled> {
        let table = FinanceTable::from_batch(&self.provider.financial(school.id)?)?;
        if table.is_empty() {
            return Err(DashboardError::unavailable(format!("financial data for school {}", school.id)));
        }
        let panels = if metrics {
            let (panels, results) = financial_metrics_panels(&table, year, &self.metrics, &self.config);
            log::debug!("Evaluated {} metrics for school {}", results.len(), school.id);
            panels
        } else {
            financial_info_panels(&table, year, &self.config)
        };
        Ok((panels, None))
    }
}
