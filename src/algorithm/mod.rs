//! Dashboard algorithms
//!
//! Each submodule is a pure function of decoded records: peer selection,
//! proficiency aggregation, student roll-ups, growth and finance metrics.

pub mod finance;
pub mod growth;
pub mod peers;
pub mod proficiency;
pub mod rollup;
