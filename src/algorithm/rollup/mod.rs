//! Student-level roll-ups for the English-learner view
//!
//! IREAD results are pivoted into a complete year/period grid, WIDA composites
//! are averaged over the school's student universe, and the two are joined
//! per student.

pub mod cohort;
pub mod iread;
pub mod wida;

pub use cohort::{CohortMatch, CohortSummary, cohort_panel, match_cohort, summarize_cohort};
pub use iread::{PeriodSummary, YearSummary, iread_panel, period_grid, year_summaries};
pub use wida::{WidaSummary, stn_universe, summarize, wida_panel};
