use charter_dash::algorithm::finance::{FINANCIAL_INFO_TITLE, RATINGS_TITLE};
use charter_dash::view::overview::{ENROLLMENT_TITLE, ETHNICITY_TITLE};
use charter_dash::{DashboardError, Datum, GrowthGrouping, ViewId, ViewModel, ViewRequest};

use crate::utils::{ADULT_HIGH_SCHOOL, HIGH_SCHOOL, PEER_A, PEER_C, SELECTED, sample_dashboard};

fn build(request: ViewRequest) -> ViewModel {
    sample_dashboard().build(&request).unwrap()
}

#[test]
fn every_view_assembles_for_the_sample_school() {
    let dashboard = sample_dashboard();
    for view in ViewId::ALL {
        let model = dashboard.build(&ViewRequest::new(SELECTED, view)).unwrap();
        assert_eq!(model.view, view);
        assert_eq!(model.label, view.label());
        assert_eq!(model.peer_selection.is_some(), view.uses_peers() && !model.empty, "{view}");
    }
}

#[test]
fn display_year_defaults_to_the_latest_academic_year() {
    let model = build(ViewRequest::new(SELECTED, ViewId::Overview));
    assert_eq!(model.year, Some(2023));
}

#[test]
fn k8_analysis_selects_overlapping_neighbours() {
    let model = build(ViewRequest::new(SELECTED, ViewId::AcademicAnalysisK8).with_year(2023));
    let selection = model.peer_selection.as_ref().unwrap();
    assert_eq!(selection.peers, vec![PEER_A, PEER_C]);
    assert!(selection.warning.is_none());

    let by_grade = model.panel("ELA Proficiency by Grade").unwrap();
    let names: Vec<&str> = by_grade.data.rows.iter().filter_map(|r| r[0].text()).collect();
    assert_eq!(names, vec!["Selected Academy", "Metro Schools", "Peer A", "Peer C"]);
    assert_eq!(by_grade.data.get(1, "Grade 5"), Some(&Datum::Number(0.4)));
}

#[test]
fn held_peers_survive_when_still_comparable() {
    let model = build(
        ViewRequest::new(SELECTED, ViewId::AcademicAnalysisK8)
            .with_year(2023)
            .with_peers([PEER_C]),
    );
    assert_eq!(model.peer_selection.unwrap().peers, vec![PEER_C]);
}

#[test]
fn suppressed_breakdown_is_annotated() {
    let model = build(ViewRequest::new(SELECTED, ViewId::AcademicAnalysisK8).with_year(2022));
    let breakdown = model.panel("ELA Proficiency Breakdown by Grade").unwrap();
    assert!(breakdown.annotations.contains(&"Grade 5 (Tested: 28)".to_string()));
}

#[test]
fn k8_information_trend_uses_reweighted_corporation() {
    let model = build(ViewRequest::new(SELECTED, ViewId::AcademicInfoK8));
    let trend = model.panel("ELA Proficiency Trend").unwrap();
    assert_eq!(trend.data.columns, vec!["Year", "School", "Corp Avg"]);
    let corp: Vec<f64> = trend.data.rows.iter().filter_map(|r| r[2].number()).collect();
    assert_eq!(corp.len(), 2);
    assert!((corp[0] - 0.3).abs() < 1e-12);
    assert!((corp[1] - 0.4).abs() < 1e-12);
    assert!(model.panel("Attendance").is_some());
}

#[test]
fn multi_year_view_has_one_series_per_entity() {
    let model = build(ViewRequest::new(SELECTED, ViewId::AcademicAnalysisMultiYear));
    assert_eq!(model.panels.len(), 1);
    let panel = &model.panels[0];
    assert_eq!(panel.title, "Total|ELA Year over Year");
    assert_eq!(
        panel.data.columns,
        vec!["Year", "Selected Academy", "Metro Schools", "Peer A", "Peer C"]
    );
    // oldest year first; peer C has no 2022 row
    assert_eq!(panel.data.get(0, "Year"), Some(&Datum::Number(2022.0)));
    assert_eq!(panel.data.get(0, "Peer C"), Some(&Datum::Missing));
}

#[test]
fn multi_year_rejects_unknown_columns() {
    let err = sample_dashboard()
        .build(&ViewRequest::new(SELECTED, ViewId::AcademicAnalysisMultiYear).with_column("Shoe Size"))
        .unwrap_err();
    assert!(matches!(err, DashboardError::Conversion(_)));
}

#[test]
fn adult_high_school_compares_ccr_without_corporation() {
    let model = build(ViewRequest::new(ADULT_HIGH_SCHOOL, ViewId::AcademicAnalysisMultiYear));
    let panel = &model.panels[0];
    assert_eq!(panel.title, "AHS Year over Year");
    assert!(!panel.data.columns.iter().any(|c| c == "Metro Schools"));
}

#[test]
fn high_school_analysis_finds_hs_peers() {
    let model = build(ViewRequest::new(HIGH_SCHOOL, ViewId::AcademicAnalysisHs));
    assert!(!model.empty);
    let selection = model.peer_selection.unwrap();
    assert_eq!(selection.peers, vec![ADULT_HIGH_SCHOOL]);
}

#[test]
fn overview_flags_enrollment_mismatch() {
    let model = build(ViewRequest::new(SELECTED, ViewId::Overview));
    let enrollment = model.panel(ENROLLMENT_TITLE).unwrap();
    assert_eq!(
        enrollment.annotations,
        vec!["2023: Total Enrollment differs from the sum of ethnicity counts by 10".to_string()]
    );
    let ethnicity = model.panel(ETHNICITY_TITLE).unwrap();
    assert_eq!(ethnicity.data.num_rows(), 2);
    assert_eq!(ethnicity.data.get(0, "Black"), Some(&Datum::Number(0.4)));
}

#[test]
fn growth_follows_requested_grouping() {
    let model = build(ViewRequest::new(SELECTED, ViewId::Growth).with_growth_grouping(GrowthGrouping::Ethnicity));
    assert!(model.panel("ELA Adequate Growth by Ethnicity").is_some());

    let before = build(ViewRequest::new(SELECTED, ViewId::Growth).with_year(2022));
    assert!(before.empty);
    assert!(before.diagnostic.is_some());
}

#[test]
fn english_learner_view_has_iread_wida_and_cohort_panels() {
    let model = build(ViewRequest::new(SELECTED, ViewId::EnglishLearner));
    let titles: Vec<&str> = model.panels.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["IREAD Breakdown", "WIDA Composite Proficiency", "IREAD Results by WIDA Composite"]
    );
    assert!(model.panels.iter().all(|p| !p.empty));
}

#[test]
fn financial_views() {
    let info = build(ViewRequest::new(SELECTED, ViewId::FinancialInfo));
    assert!(info.panel(FINANCIAL_INFO_TITLE).is_some_and(|p| !p.empty));

    let metrics = build(ViewRequest::new(SELECTED, ViewId::FinancialMetrics));
    let ratings = metrics.panel(RATINGS_TITLE).unwrap();
    assert_eq!(ratings.data.columns, vec!["Metric", "2023", "2022"]);

    let other = build(ViewRequest::new(HIGH_SCHOOL, ViewId::FinancialInfo));
    assert!(other.empty);
}

#[test]
fn missing_school_or_family_gives_an_empty_page() {
    let unknown = build(ViewRequest::new(charter_dash::SchoolId(999), ViewId::Overview));
    assert!(unknown.empty);
    assert!(unknown.panels.is_empty());
    assert!(unknown.diagnostic.unwrap().contains("999"));

    let wrong_family = build(ViewRequest::new(SELECTED, ViewId::AcademicInfoHs));
    assert!(wrong_family.empty);
    assert!(wrong_family.peer_selection.is_none());
}

#[test]
fn view_model_serialises_nulls_and_suppression() {
    let model = build(ViewRequest::new(SELECTED, ViewId::AcademicAnalysisMultiYear));
    let json: serde_json::Value = serde_json::from_str(&model.to_json().unwrap()).unwrap();
    assert_eq!(json["view"], "academic_analysis_multi_year");
    assert!(json["panels"][0]["data"]["rows"][0][4].is_null());
    assert_eq!(json["peer_selection"]["peers"], serde_json::json!([101, 103]));
    assert_eq!(serde_json::to_value(Datum::Suppressed).unwrap(), "***");
}
