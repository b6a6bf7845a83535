use charter_dash::algorithm::growth::{GrowthGrouping, GrowthMetric, growth_panels, growth_rows};
use charter_dash::models::GrowthRecord;
use charter_dash::{DataProvider, Subject};

use crate::utils::{SELECTED, sample_snapshot};

fn records() -> Vec<GrowthRecord> {
    let snapshot = sample_snapshot();
    GrowthRecord::from_batch(&snapshot.growth_student(SELECTED).unwrap()).unwrap()
}

#[test]
fn shares_are_complementary() {
    let rows = growth_rows(&records(), GrowthGrouping::GradeLevel);
    assert_eq!(rows.len(), 2);
    for row in &rows {
        let me = row.majority_enrolled;
        assert!((me.adequate_share + me.not_adequate_share - 1.0).abs() < 1e-12);
        if let Some(d) = row.day_162 {
            assert!((d.adequate_share + d.not_adequate_share - 1.0).abs() < 1e-12);
        }
    }
}

#[test]
fn day_162_subset_and_difference() {
    let rows = growth_rows(&records(), GrowthGrouping::GradeLevel);
    let ela = rows
        .iter()
        .find(|r| r.subject == Subject::Ela && r.category == "Grade 5")
        .unwrap();
    assert_eq!(ela.majority_enrolled.students, 3);
    assert_eq!(ela.majority_enrolled.median_sgp, Some(60.0));
    let d162 = ela.day_162.unwrap();
    assert_eq!(d162.students, 2);
    assert_eq!(d162.adequate_share, 1.0);
    assert_eq!(d162.median_sgp, Some(65.0));

    let diff = ela.difference(GrowthMetric::AdequateGrowth).unwrap();
    assert!((diff - (d162.adequate_share - ela.majority_enrolled.adequate_share)).abs() < 1e-12);
    assert_eq!(ela.difference(GrowthMetric::MedianSgp), Some(5.0));
}

#[test]
fn group_without_adequate_growth_keeps_a_zero_row() {
    let rows = growth_rows(&records(), GrowthGrouping::GradeLevel);
    let math = rows.iter().find(|r| r.subject == Subject::Math).unwrap();
    assert_eq!(math.category, "Grade 6");
    assert_eq!(math.majority_enrolled.adequate_share, 0.0);
    assert_eq!(math.day_162.map(|d| d.adequate_share), Some(0.0));
}

#[test]
fn unlisted_categories_are_ignored() {
    let rows = growth_rows(&records(), GrowthGrouping::SocioeconomicStatus);
    assert!(rows.is_empty());
    let panels = growth_panels(&records(), GrowthGrouping::SocioeconomicStatus);
    assert!(panels.iter().all(|p| p.empty));
}

#[test]
fn ethnicity_panels_have_one_column_per_category_seen() {
    let panels = growth_panels(&records(), GrowthGrouping::Ethnicity);
    let chart = panels
        .iter()
        .find(|p| p.title == "ELA Adequate Growth by Ethnicity")
        .unwrap();
    assert_eq!(
        chart.data.columns,
        vec![
            "Year",
            "Black Majority Enrolled",
            "Black 162 Days",
            "Black Difference",
            "White Majority Enrolled",
            "White 162 Days",
            "White Difference",
        ]
    );
    assert_eq!(chart.data.num_rows(), 1);

    // the chart repeats the table's figures for each series
    let rows = growth_rows(&records(), GrowthGrouping::Ethnicity);
    for row in rows.iter().filter(|r| r.subject == Subject::Ela) {
        let cat = &row.category;
        let me = chart.data.get(0, &format!("{cat} Majority Enrolled")).and_then(|d| d.number());
        assert_eq!(me, Some(row.majority_enrolled.adequate_share));
        let diff = chart.data.get(0, &format!("{cat} Difference")).and_then(|d| d.number());
        assert_eq!(diff, row.difference(GrowthMetric::AdequateGrowth));
    }

    let table = panels
        .iter()
        .find(|p| p.title == "ELA Adequate Growth (Ethnicity)")
        .unwrap();
    assert_eq!(table.data.columns[1], "2023 Majority Enrolled");
}

#[test]
fn grouping_parses_from_labels() {
    assert_eq!("english-learner-status".parse::<GrowthGrouping>().unwrap(), GrowthGrouping::EnglishLearnerStatus);
    assert!("shoe size".parse::<GrowthGrouping>().is_err());
}
