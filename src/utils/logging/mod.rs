//! Logging utilities
//!
//! Standardised start/complete/warning lines for provider loads and view
//! assembly.

pub mod log;

pub use log::{log_operation_complete, log_operation_start, log_warning};
