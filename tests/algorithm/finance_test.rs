use charter_dash::algorithm::finance::{
    FINANCIAL_INFO_TITLE, INDICATORS_TITLE, RATINGS_TITLE, financial_info_panels, financial_metrics_panels,
    indicator_ratings, materialize_derived, prepare,
};
use charter_dash::{Cell, DashboardConfig, DataProvider, Datum, FinanceTable, MetricSet, Rating, YearLabel};
use indexmap::IndexMap;

use crate::utils::{SELECTED, sample_snapshot};

fn school_finance() -> FinanceTable {
    let snapshot = sample_snapshot();
    FinanceTable::from_batch(&snapshot.financial(SELECTED).unwrap()).unwrap()
}

fn two_year_table(rows: &[(&str, [f64; 2])]) -> FinanceTable {
    FinanceTable {
        years: vec![YearLabel::audited(2022), YearLabel::audited(2023)],
        rows: rows
            .iter()
            .map(|(name, values)| (name.to_string(), values.iter().map(|v| Cell::Value(*v)).collect()))
            .collect::<IndexMap<_, _>>(),
        indicators: IndexMap::new(),
    }
}

#[test]
fn derived_rows_from_published_categories() {
    let mut table = school_finance();
    materialize_derived(&mut table);
    let col = table.year_index(YearLabel::audited(2023)).unwrap();
    assert_eq!(table.value("Total Grants", col), Cell::Value(150.0));
    assert_eq!(table.value("Net Asset Position", col), Cell::Value(800.0));
    assert_eq!(table.value("Change in Net Assets", col), Cell::Value(50.0));
    assert_eq!(table.value("ADM Average", col), Cell::Value(295.0));
}

#[test]
fn preparation_is_idempotent_and_drops_later_columns() {
    let config = DashboardConfig::default();
    let table = school_finance();
    let once = prepare(&table, 2023, config.min_valid_finance_cells);
    let twice = prepare(&once, 2023, config.min_valid_finance_cells);
    assert_eq!(once, twice);
    assert_eq!(once.years, vec![YearLabel::audited(2022), YearLabel::audited(2023)]);

    // the sparse interim column is kept out even when it is in range
    let with_interim = prepare(&table, 2024, config.min_valid_finance_cells);
    assert!(with_interim.years.iter().all(|y| !y.is_interim()));
}

fn finance_table(columns: &[&str], rows: &[(&str, &[f64])]) -> FinanceTable {
    FinanceTable {
        years: columns.iter().map(|c| c.parse::<YearLabel>().unwrap()).collect(),
        rows: rows
            .iter()
            .map(|(name, values)| (name.to_string(), values.iter().map(|v| Cell::Value(*v)).collect()))
            .collect::<IndexMap<_, _>>(),
        indicators: IndexMap::new(),
    }
}

fn ratings(table: &FinanceTable, id: &str) -> Vec<Rating> {
    let results = MetricSet::default().evaluate(table);
    results.into_iter().find(|r| r.id == id).unwrap().ratings
}

#[test]
fn current_ratio_follows_configured_thresholds() {
    let metrics = MetricSet::default();
    let improving = two_year_table(&[("Current Assets", [105.0, 110.0]), ("Current Liabilities", [100.0, 100.0])]);
    let declining = two_year_table(&[("Current Assets", [115.0, 110.0]), ("Current Liabilities", [100.0, 100.0])]);

    let rate = |table: &FinanceTable| {
        let results = metrics.evaluate(table);
        let current = results.iter().find(|r| r.id == "current_ratio").unwrap();
        current.ratings[1]
    };
    assert_eq!(rate(&improving), Rating::Meets);
    assert_eq!(rate(&declining), Rating::DoesNotMeet);
}

#[test]
fn missing_inputs_give_no_rating() {
    let metrics = MetricSet::default();
    let table = two_year_table(&[("Current Assets", [105.0, 110.0])]);
    let results = metrics.evaluate(&table);
    let current = results.iter().find(|r| r.id == "current_ratio").unwrap();
    assert_eq!(current.values, vec![None, None]);
    assert!(current.ratings.iter().all(|r| *r == Rating::NoRating));
}

#[test]
fn custom_metric_set_from_toml() {
    let text = r#"
[[metrics]]
id = "leverage"
name = "Leverage"
formula = "debt_to_asset"

[[metrics.rules]]
rating = "Meets"
condition = { kind = "below", quantity = "value", threshold = 0.5 }

[[metrics.rules]]
rating = "Approaches"
condition = { kind = "at_most", quantity = "value", threshold = 0.9 }

[[metrics.rules]]
rating = "Does Not Meet"
condition = { kind = "always" }
"#;
    let metrics = MetricSet::from_toml_str(text).unwrap();
    let table = two_year_table(&[("Total Liabilities", [400.0, 1200.0]), ("Total Assets", [1000.0, 2000.0])]);
    let results = metrics.evaluate(&table);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].ratings, vec![Rating::Meets, Rating::Approaches]);
    assert_eq!(results[0].values, vec![Some(0.4), Some(0.6)]);

    let duplicate = format!("{text}\n{}", text.replace("Leverage", "Leverage again"));
    assert!(MetricSet::from_toml_str(&duplicate).is_err());
}

#[test]
fn indicator_text_is_parsed_or_annotated() {
    let table = school_finance();
    let ratings = indicator_ratings(&table);
    let audit = &ratings["2.1.a Audit Opinion"];
    let col = table.year_index(YearLabel::audited(2022)).unwrap();
    assert_eq!(audit[col].rating, Rating::Meets);

    let config = DashboardConfig::default();
    let panels = financial_info_panels(&table, 2023, &config);
    let indicators = panels.iter().find(|p| p.title == INDICATORS_TITLE).unwrap();
    assert_eq!(indicators.annotations.len(), 1);
    assert!(indicators.annotations[0].contains("Pending review"));
}

#[test]
fn information_table_shows_newest_year_first_with_change() {
    let config = DashboardConfig::default();
    let panels = financial_info_panels(&school_finance(), 2023, &config);
    let info = panels.iter().find(|p| p.title == FINANCIAL_INFO_TITLE).unwrap();
    assert_eq!(info.data.columns, vec!["Category", "2023", "2022", "% Change"]);
    let revenue = info.data.find_row("Operating Revenues").unwrap();
    assert_eq!(revenue[1], Datum::Number(1000.0));
    let change = revenue[3].number().unwrap();
    assert!((change - (1.0 / 0.9 - 1.0)).abs() < 1e-9);
}

#[test]
fn metric_panels_cover_every_built_in_metric() {
    let config = DashboardConfig::default();
    let metrics = MetricSet::default();
    let (panels, results) = financial_metrics_panels(&school_finance(), 2023, &metrics, &config);
    assert_eq!(results.len(), metrics.metrics.len());
    let ratings = panels.iter().find(|p| p.title == RATINGS_TITLE).unwrap();
    assert_eq!(ratings.data.num_rows(), metrics.metrics.len());

    let nothing = financial_metrics_panels(&FinanceTable::default(), 2023, &metrics, &config);
    assert!(nothing.0.iter().all(|p| p.empty));
    assert!(nothing.1.is_empty());
}

#[test]
fn current_ratio_just_below_one_approaches() {
    let table = two_year_table(&[("Current Assets", [80.0, 95.0]), ("Current Liabilities", [100.0, 100.0])]);
    assert_eq!(ratings(&table, "current_ratio"), vec![Rating::DoesNotMeet, Rating::Approaches]);
}

#[test]
fn days_cash_on_hand_boundaries() {
    // 365 000 of expenses is 1 000 a day
    let rate = |cash: [f64; 2]| {
        let table = two_year_table(&[("Unrestricted Cash", cash), ("Operating Expenses", [365_000.0, 365_000.0])]);
        ratings(&table, "days_cash_on_hand")[1]
    };
    assert_eq!(rate([40_000.0, 46_000.0]), Rating::Meets);
    assert_eq!(rate([40_000.0, 45_000.0]), Rating::Meets);
    assert_eq!(rate([50_000.0, 45_000.0]), Rating::DoesNotMeet);
    assert_eq!(rate([10_000.0, 15_000.0]), Rating::Approaches);
    assert_eq!(rate([20_000.0, 14_600.0]), Rating::DoesNotMeet);
}

#[test]
fn debt_service_coverage_boundaries() {
    let rate = |change: f64| {
        let table = finance_table(
            &["2023"],
            &[
                ("Change in Net Assets", &[change]),
                ("Depreciation/Amortization", &[30.0]),
                ("Interest Expense", &[10.0]),
                ("Lease/Mortgage Payments", &[10.0]),
                ("Principal Payments", &[80.0]),
            ],
        );
        ratings(&table, "debt_service_coverage")[0]
    };
    assert_eq!(rate(50.0), Rating::Meets);
    assert_eq!(rate(40.0), Rating::Approaches);
    assert_eq!(rate(30.0), Rating::DoesNotMeet);
}

#[test]
fn enrollment_change_boundaries() {
    let rate = |adm: [f64; 2]| ratings(&two_year_table(&[("ADM Average", adm)]), "enrollment_change");
    assert_eq!(rate([100.0, 91.0]), vec![Rating::NoRating, Rating::Meets]);
    assert_eq!(rate([100.0, 90.0])[1], Rating::Approaches);
    assert_eq!(rate([100.0, 85.0])[1], Rating::Approaches);
    assert_eq!(rate([100.0, 80.0])[1], Rating::DoesNotMeet);
}

#[test]
fn early_years_use_relaxed_margin_and_cash_flow_rules() {
    let margin = finance_table(
        &["2021", "2022"],
        &[("Operating Revenues", &[100.0, 100.0]), ("Change in Net Assets", &[10.0, -5.0])],
    );
    assert_eq!(ratings(&margin, "net_assets_margin"), vec![Rating::Meets, Rating::Meets]);

    // an interim column does not push 2022 into the third year
    let with_interim = finance_table(
        &["2021", "2022 (Q2)", "2022"],
        &[
            ("Operating Revenues", &[100.0, 50.0, 100.0]),
            ("Change in Net Assets", &[10.0, -50.0, -5.0]),
        ],
    );
    assert_eq!(
        ratings(&with_interim, "net_assets_margin"),
        vec![Rating::Meets, Rating::NoRating, Rating::Meets]
    );

    let cash = finance_table(&["2021", "2022"], &[("Unrestricted Cash", &[100.0, 150.0])]);
    assert_eq!(ratings(&cash, "cash_flow"), vec![Rating::Meets, Rating::Meets]);

    let third_year = finance_table(&["2021", "2022", "2023"], &[("Unrestricted Cash", &[100.0, 150.0, 140.0])]);
    assert_eq!(ratings(&third_year, "cash_flow")[2], Rating::Approaches);
}
