//! Operation log lines
//!
//! Loads, index builds and view assembly all report through these helpers so
//! the log reads as matched start/complete pairs.

use std::fmt::Display;
use std::time::Duration;

/// Log the start of an operation on `target`
pub fn log_operation_start(operation: &str, target: &dyn Display) {
    log::info!("{operation} {target}");
}

/// Log a finished operation with the number of `unit`s it produced
///
/// # Arguments
/// * `operation` - Past-tense verb, e.g. "loaded"
/// * `target` - What was operated on (a directory, a school, an index key)
/// * `count` - How many units were produced
/// * `unit` - Plural noun for the count ("tables", "panels")
/// * `elapsed` - Wall time, when measured
pub fn log_operation_complete(
    operation: &str,
    target: &dyn Display,
    count: usize,
    unit: &str,
    elapsed: Option<Duration>,
) {
    match elapsed {
        Some(elapsed) => log::info!("{target}: {operation} {count} {unit} in {elapsed:?}"),
        None => log::info!("{target}: {operation} {count} {unit}"),
    }
}

/// Log a warning, optionally naming what it concerns
pub fn log_warning(message: &str, target: Option<&dyn Display>) {
    match target {
        Some(target) => log::warn!("{message}: {target}"),
        None => log::warn!("{message}"),
    }
}
