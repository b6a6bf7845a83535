//! Column selection, derived rows and column validity for finance tables

use crate::models::FinanceTable;
use crate::schema::cell::Cell;

/// Finance category names
pub mod category {
    pub const STATE_GRANTS: &str = "State Grants";
    pub const FEDERAL_GRANTS: &str = "Federal Grants";
    pub const TOTAL_GRANTS: &str = "Total Grants";
    pub const OPERATING_REVENUES: &str = "Operating Revenues";
    pub const OPERATING_EXPENSES: &str = "Operating Expenses";
    pub const CHANGE_IN_NET_ASSETS: &str = "Change in Net Assets";
    pub const TOTAL_ASSETS: &str = "Total Assets";
    pub const TOTAL_LIABILITIES: &str = "Total Liabilities";
    pub const NET_ASSET_POSITION: &str = "Net Asset Position";
    pub const CURRENT_ASSETS: &str = "Current Assets";
    pub const CURRENT_LIABILITIES: &str = "Current Liabilities";
    pub const UNRESTRICTED_CASH: &str = "Unrestricted Cash";
    pub const UNRESTRICTED_NET_ASSETS: &str = "Unrestricted Net Assets";
    pub const DEPRECIATION: &str = "Depreciation/Amortization";
    pub const INTEREST_EXPENSE: &str = "Interest Expense";
    pub const LEASE_PAYMENTS: &str = "Lease/Mortgage Payments";
    pub const PRINCIPAL_PAYMENTS: &str = "Principal Payments";
    pub const SEPTEMBER_ADM: &str = "September ADM";
    pub const FEBRUARY_ADM: &str = "February ADM";
    pub const ADM_AVERAGE: &str = "ADM Average";
}

use category::*;

/// Keep columns up to `display_year`, oldest first
#[must_use]
pub fn select_years(table: &FinanceTable, display_year: u16) -> FinanceTable {
    let mut positions: Vec<usize> = (0..table.years.len())
        .filter(|&i| table.years[i].year <= display_year)
        .collect();
    positions.sort_by_key(|&i| table.years[i]);
    if positions.len() < table.years.len() {
        log::debug!(
            "Dropped {} finance columns after {display_year}",
            table.years.len() - positions.len()
        );
    }
    table.select_columns(&positions)
}

fn row(table: &FinanceTable, name: &str) -> Vec<Cell> {
    (0..table.years.len()).map(|i| table.value(name, i)).collect()
}

fn combine(a: &[Cell], b: &[Cell], f: fn(f64, f64) -> f64) -> Vec<Cell> {
    a.iter().zip(b).map(|(x, y)| x.zip_with(*y, f)).collect()
}

/// Mean of the two ADM counts; missing unless both were reported
fn adm_average(september: Cell, february: Cell) -> Cell {
    september.zip_with(february, |s, f| (s + f) / 2.0)
}

/// Set or overwrite the derived rows
///
/// `Total Grants = State + Federal`, `Net Asset Position = Assets −
/// Liabilities`, `Change in Net Assets = Revenues − Expenses` and
/// `ADM Average` from the September and February counts. Indicator rows are
/// left alone.
pub fn materialize_derived(table: &mut FinanceTable) {
    let total_grants = combine(&row(table, STATE_GRANTS), &row(table, FEDERAL_GRANTS), |a, b| a + b);
    let net_assets = combine(&row(table, TOTAL_ASSETS), &row(table, TOTAL_LIABILITIES), |a, b| a - b);
    let change = combine(
        &row(table, OPERATING_REVENUES),
        &row(table, OPERATING_EXPENSES),
        |a, b| a - b,
    );
    let adm: Vec<Cell> = row(table, SEPTEMBER_ADM)
        .into_iter()
        .zip(row(table, FEBRUARY_ADM))
        .map(|(s, f)| adm_average(s, f))
        .collect();

    table.set_row(TOTAL_GRANTS, total_grants);
    table.set_row(NET_ASSET_POSITION, net_assets);
    table.set_row(CHANGE_IN_NET_ASSETS, change);
    table.set_row(ADM_AVERAGE, adm);
}

/// Drop columns with fewer than `min_cells` non-zero numeric cells
#[must_use]
pub fn drop_sparse_columns(table: &FinanceTable, min_cells: usize) -> FinanceTable {
    let positions: Vec<usize> = (0..table.years.len())
        .filter(|&i| {
            let filled = table
                .rows
                .values()
                .filter(|cells| cells[i].value().is_some_and(|v| v != 0.0))
                .count();
            if filled < min_cells {
                log::debug!(
                    "Finance column {} has {filled} populated cells; dropped",
                    table.years[i]
                );
            }
            filled >= min_cells
        })
        .collect();
    table.select_columns(&positions)
}

/// Column selection, derived rows and validity in one step
#[must_use]
pub fn prepare(table: &FinanceTable, display_year: u16, min_cells: usize) -> FinanceTable {
    let mut selected = select_years(table, display_year);
    materialize_derived(&mut selected);
    drop_sparse_columns(&selected, min_cells)
}

/// Relative change from `prior` to `current`; `None` when `prior` is zero or
/// either side is not numeric
#[must_use]
pub fn percent_change(current: Cell, prior: Cell) -> Option<f64> {
    let (current, prior) = (current.value()?, prior.value()?);
    if prior == 0.0 {
        return None;
    }
    Some((current - prior) / prior.abs())
}
