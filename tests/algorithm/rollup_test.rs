use charter_dash::algorithm::rollup::{
    cohort_panel, iread_panel, match_cohort, period_grid, stn_universe, summarize, summarize_cohort,
    wida_panel, year_summaries,
};
use charter_dash::models::records::stns_from_batch;
use charter_dash::models::{IreadRecord, IreadStatus, TestPeriod, WidaRecord};
use charter_dash::{DataProvider, Datum};
use rustc_hash::FxHashSet;

use crate::utils::{SELECTED, sample_snapshot};

fn iread() -> Vec<IreadRecord> {
    IreadRecord::from_batch(&sample_snapshot().iread_student(SELECTED).unwrap()).unwrap()
}

fn all_wida() -> Vec<WidaRecord> {
    let snapshot = sample_snapshot();
    let everyone: FxHashSet<String> = ["42", "43", "99"].iter().map(|s| s.to_string()).collect();
    WidaRecord::from_batch(&snapshot.wida_student(&everyone).unwrap()).unwrap()
}

#[test]
fn iread_pass_joins_most_recent_prior_wida() {
    let matches = match_cohort(&iread(), &all_wida());
    let student_42: Vec<_> = matches.iter().filter(|m| m.stn == "42").collect();
    assert_eq!(student_42.len(), 1);
    assert_eq!(student_42[0].iread_year, 2023);
    assert_eq!(student_42[0].wida_year, 2022);
    assert_eq!(student_42[0].composite, Some(3.5));
    assert_eq!(student_42[0].status, IreadStatus::Pass);
}

#[test]
fn cohort_summary_groups_by_year_and_status() {
    let matches = match_cohort(&iread(), &all_wida());
    let summaries = summarize_cohort(&matches);
    assert_eq!(summaries.len(), 2);
    let failed = summaries.iter().find(|s| s.status == IreadStatus::DidNotPass).unwrap();
    assert_eq!(failed.matched, 2);
    assert_eq!(failed.mean_composite, Some(2.0));
    assert_eq!(failed.pass_rate, 0.0);

    let panel = cohort_panel(&summaries);
    assert_eq!(panel.data.num_rows(), 2);
    assert_eq!(panel.data.get(0, "Year"), Some(&Datum::Number(2023.0)));
}

#[test]
fn period_grid_is_complete_and_counts_exemptions() {
    let grid = period_grid(&iread());
    assert_eq!(grid.len(), 2);
    let spring = grid.iter().find(|g| g.period == TestPeriod::Spring).unwrap();
    assert_eq!(spring.tested, 2);
    assert_eq!(spring.pass, 0.5);
    let summer = grid.iter().find(|g| g.period == TestPeriod::Summer).unwrap();
    assert_eq!(summer.tested, 1);
    assert_eq!(summer.pass, 0.0);
    assert_eq!(summer.pass_with_exemption, 1.0);

    let yearly = year_summaries(&iread(), &[]);
    assert_eq!(yearly.len(), 1);
    assert_eq!(yearly[0].exemptions, 1);
    assert_eq!(yearly[0].grade_2_pass, None);

    let panel = iread_panel(&iread(), &[], &[2023]);
    assert_eq!(
        panel.data.find_row("Spring Pass %").map(|r| r[1].clone()),
        Some(Datum::Number(0.5))
    );
}

#[test]
fn wida_averages_cover_only_the_school_universe() {
    let snapshot = sample_snapshot();
    let ilearn = stns_from_batch(&snapshot.school_stns(SELECTED).unwrap()).unwrap();
    let universe = stn_universe(&iread(), &ilearn);
    assert_eq!(universe.len(), 3);

    let scoped = WidaRecord::from_batch(&snapshot.wida_student(&universe).unwrap()).unwrap();
    assert!(scoped.iter().all(|r| r.stn != "99"));

    let summary = summarize(&all_wida(), &universe);
    assert_eq!(summary.by_year.get(&2022), Some(&3.5));
    assert_eq!(summary.by_year.get(&2023), Some(&2.0));

    let panel = wida_panel(&summary, &[2023, 2022, 2021]);
    let average = panel.data.find_row("School Average").unwrap();
    assert_eq!(average[1], Datum::Number(2.0));
    assert_eq!(average[3], Datum::Number(3.2));
}
