//! Shared fixtures for the integration tests
//!
//! `sample_snapshot` is a small but complete data set: one K8 school with
//! four neighbours in the K8 universe, its corporation, a high school, and
//! demographic, attendance, finance, growth, IREAD and WIDA rows.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use charter_dash::utils::arrow::conversion::utf8_batch;
use charter_dash::{Dashboard, DashboardConfig, DataSnapshot, SchoolId, TableName};
use parquet::arrow::ArrowWriter;

pub const SELECTED: SchoolId = SchoolId(100);
pub const PEER_A: SchoolId = SchoolId(101);
pub const PEER_B: SchoolId = SchoolId(102);
pub const PEER_C: SchoolId = SchoolId(103);
pub const PEER_D: SchoolId = SchoolId(104);
pub const HIGH_SCHOOL: SchoolId = SchoolId(200);
pub const ADULT_HIGH_SCHOOL: SchoolId = SchoolId(300);
pub const CORPORATION: u32 = 900;

/// Utf8 batch from a header and text rows; empty strings are nulls
pub fn table(header: &[&str], rows: &[&[&str]]) -> RecordBatch {
    let columns: Vec<(&str, Vec<Option<&str>>)> = header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values = rows
                .iter()
                .map(|row| Some(row[i]).filter(|v| !v.is_empty()))
                .collect();
            (*name, values)
        })
        .collect();
    utf8_batch(&columns).unwrap()
}

/// Write a batch to a Parquet file
pub fn write_parquet(path: &Path, batch: &RecordBatch) {
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}

pub fn school_index() -> RecordBatch {
    table(
        &[
            "SchoolID",
            "SchoolName",
            "CorporationID",
            "CorporationName",
            "SchoolType",
            "LowGrade",
            "HighGrade",
            "Lat",
            "Lon",
        ],
        &[
            &["100", "Selected Academy", "900", "Metro Schools", "K8", "5", "8", "39.770", "-86.160"],
            &["101", "Peer A", "901", "North Schools", "K8", "3", "7", "39.780", "-86.160"],
            &["102", "Peer B", "902", "South Schools", "K8", "2", "5", "39.765", "-86.160"],
            &["103", "Peer C", "903", "East Schools", "K12", "6", "12", "39.800", "-86.160"],
            &["104", "Peer D", "904", "West Schools", "K8", "3", "4", "39.771", "-86.160"],
            &["200", "Central High", "900", "Metro Schools", "HS", "9", "12", "39.700", "-86.100"],
            &["300", "Second Chance Adult High", "900", "Metro Schools", "AHS", "9", "12", "39.710", "-86.110"],
        ],
    )
}

const K8_HEADER: [&str; 16] = [
    "Year",
    "SchoolID",
    "SchoolName",
    "SchoolType",
    "LowGrade",
    "HighGrade",
    "Total|ELA Total Tested",
    "Total|ELA Proficient %",
    "Total|Math Proficient %",
    "Grade 5|ELA Total Tested",
    "Grade 5|ELA Below Proficiency",
    "Grade 5|ELA Approaching Proficiency",
    "Grade 5|ELA At Proficiency",
    "Grade 5|ELA Above Proficiency",
    "Grade 5|ELA Proficient %",
    "Grade 6|ELA Proficient %",
];

pub fn k8_academic() -> RecordBatch {
    table(
        &K8_HEADER,
        &[
            &["2023", "100", "Selected Academy", "K8", "5", "8", "100", "0.5", "0.4", "30", "5", "10", "10", "5", "0.5", "0.45"],
            &["2022", "100", "Selected Academy", "K8", "5", "8", "90", "0.45", "0.35", "28", "***", "***", "***", "***", "0.4", "0.42"],
            &["2023", "101", "Peer A", "K8", "3", "7", "80", "0.6", "0.5", "25", "5", "5", "10", "5", "0.6", "0.55"],
            &["2022", "101", "Peer A", "K8", "3", "7", "75", "0.55", "0.45", "24", "4", "6", "9", "5", "0.58", "0.5"],
            &["2023", "102", "Peer B", "K8", "2", "5", "60", "0.3", "0.3", "20", "8", "6", "4", "2", "0.3", ""],
            &["2023", "103", "Peer C", "K12", "6", "12", "70", "0.4", "0.35", "", "", "", "", "", "", "0.4"],
            &["2023", "104", "Peer D", "K8", "3", "4", "50", "0.7", "0.6", "", "", "", "", "", "", ""],
        ],
    )
}

pub fn corp_k8() -> RecordBatch {
    table(
        &[
            "Year",
            "CorporationID",
            "CorporationName",
            "Total|ELA Proficient %",
            "Grade 3|ELA Total Tested",
            "Grade 3|ELA At Proficiency",
            "Grade 3|ELA Above Proficiency",
            "Grade 5|ELA Total Tested",
            "Grade 5|ELA At Proficiency",
            "Grade 5|ELA Above Proficiency",
            "Grade 6|ELA Total Tested",
            "Grade 6|ELA At Proficiency",
            "Grade 6|ELA Above Proficiency",
            "Grade 5|ELA Proficient %",
            "Grade 6|ELA Proficient %",
        ],
        &[
            &["2023", "900", "Metro Schools", "0.9", "100", "50", "50", "100", "30", "10", "100", "20", "20", "0.4", "0.4"],
            &["2022", "900", "Metro Schools", "0.9", "100", "50", "50", "100", "20", "10", "100", "20", "10", "0.3", "0.3"],
        ],
    )
}

pub fn hs_academic() -> RecordBatch {
    table(
        &[
            "Year",
            "SchoolID",
            "SchoolName",
            "SchoolType",
            "LowGrade",
            "HighGrade",
            "Total|Graduation Rate",
            "Non Waiver|Graduation Rate",
            "AHS|CCR Percent",
        ],
        &[
            &["2023", "200", "Central High", "HS", "9", "12", "0.88", "0.84", ""],
            &["2022", "200", "Central High", "HS", "9", "12", "0.86", "0.8", ""],
            &["2023", "300", "Second Chance Adult High", "AHS", "9", "12", "", "", "0.35"],
        ],
    )
}

pub fn corp_hs() -> RecordBatch {
    table(
        &["Year", "CorporationID", "CorporationName", "Total|Graduation Rate", "Non Waiver|Graduation Rate"],
        &[
            &["2023", "900", "Metro Schools", "0.9", "0.85"],
            &["2022", "900", "Metro Schools", "0.89", "0.83"],
        ],
    )
}

pub fn demographics() -> RecordBatch {
    table(
        &["Year", "SchoolID", "SchoolName", "Total Enrollment", "Black", "Hispanic", "White", "Free or Reduced Price Meals"],
        &[
            &["2023", "100", "Selected Academy", "200", "80", "40", "70", "120"],
            &["2022", "100", "Selected Academy", "180", "70", "40", "70", "100"],
            &["2023", "900", "Metro Schools", "10000", "3000", "2000", "5000", "5000"],
        ],
    )
}

pub fn attendance() -> RecordBatch {
    table(
        &["Year", "SchoolID", "CorporationID", "Scope", "Attendance Rate", "Chronic Absenteeism %"],
        &[
            &["2023", "100", "", "School", "0.95", "0.10"],
            &["2022", "100", "", "School", "0.94", "0.12"],
            &["2023", "", "900", "Corporation", "0.92", "0.15"],
        ],
    )
}

pub const FINANCE_CATEGORIES: [(&str, f64); 14] = [
    ("State Grants", 100.0),
    ("Federal Grants", 50.0),
    ("Operating Revenues", 1000.0),
    ("Operating Expenses", 950.0),
    ("Total Assets", 2000.0),
    ("Total Liabilities", 1200.0),
    ("Current Assets", 110.0),
    ("Current Liabilities", 100.0),
    ("Unrestricted Cash", 300.0),
    ("Unrestricted Net Assets", 400.0),
    ("Depreciation/Amortization", 20.0),
    ("Interest Expense", 10.0),
    ("September ADM", 300.0),
    ("February ADM", 290.0),
];

pub fn financial() -> RecordBatch {
    let owned: Vec<[String; 5]> = FINANCE_CATEGORIES
        .iter()
        .map(|(category, value)| {
            [
                "100".to_string(),
                (*category).to_string(),
                (value * 0.9).to_string(),
                value.to_string(),
                // a sparse interim column
                if *category == "State Grants" { "25".to_string() } else { String::new() },
            ]
        })
        .collect();
    let mut rows: Vec<Vec<&str>> = owned.iter().map(|r| r.iter().map(String::as_str).collect()).collect();
    rows.push(vec!["100", "2.1.a Audit Opinion", "Meets Standard", "Pending review", ""]);
    let borrowed: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
    table(&["SchoolID", "Category", "2022", "2023", "2024 (Q1)"], &borrowed)
}

pub fn growth_student() -> RecordBatch {
    table(
        &[
            "STN",
            "SchoolID",
            "TestYear",
            "TestedGrade",
            "Subject",
            "ILEARNGrowthLevel",
            "ILEARNGrowthPercentile",
            "Day162",
            "Ethnicity",
        ],
        &[
            &["1", "100", "2023", "5", "ELA", "Adequate Growth", "60", "true", "Black"],
            &["2", "100", "2023", "5", "ELA", "Not Adequate Growth", "30", "false", "White"],
            &["3", "100", "2023", "5", "ELA", "Adequate Growth", "70", "true", "White"],
            &["4", "100", "2023", "6", "Math", "Not Adequate Growth", "20", "true", "Hispanic"],
        ],
    )
}

pub fn iread_student() -> RecordBatch {
    table(
        &["STN", "SchoolID", "Year", "TestPeriod", "TestedGrade", "CurrentGrade", "Status", "ExemptionStatus"],
        &[
            &["42", "100", "2023", "Spring", "3", "3", "Pass", ""],
            &["43", "100", "2023", "Spring", "3", "3", "Did Not Pass", ""],
            &["43", "100", "2023", "Summer", "3", "3", "Did Not Pass", "Exemption"],
        ],
    )
}

pub fn wida_student() -> RecordBatch {
    table(
        &["STN", "SchoolID", "Year", "TestedGrade", "CompositeOverallProficiencyLevel"],
        &[
            &["42", "100", "2021", "1", "3.2"],
            &["42", "100", "2022", "2", "3.5"],
            &["43", "100", "2023", "3", "2.0"],
            &["99", "555", "2023", "3", "5.0"],
        ],
    )
}

pub fn school_stns() -> RecordBatch {
    table(&["SchoolID", "Year", "STN"], &[&["100", "2023", "42"], &["100", "2023", "44"]])
}

/// Every table of the sample data set
pub fn sample_tables() -> Vec<(TableName, RecordBatch)> {
    vec![
        (TableName::SchoolIndex, school_index()),
        (TableName::K8Academic, k8_academic()),
        (TableName::HsAcademic, hs_academic()),
        (TableName::CorpK8, corp_k8()),
        (TableName::CorpHs, corp_hs()),
        (TableName::Demographics, demographics()),
        (TableName::Attendance, attendance()),
        (TableName::Financial, financial()),
        (TableName::GrowthStudent, growth_student()),
        (TableName::IreadStudent, iread_student()),
        (TableName::WidaStudent, wida_student()),
        (TableName::SchoolStns, school_stns()),
    ]
}

pub fn sample_snapshot() -> DataSnapshot {
    DataSnapshot::from_batches(sample_tables()).unwrap()
}

/// Dashboard over the sample snapshot with the default configuration
pub fn sample_dashboard() -> Dashboard {
    Dashboard::new(Arc::new(sample_snapshot()), DashboardConfig::default()).unwrap()
}
