//! Utility functions for error handling
//!
//! Thin wrappers around filesystem access that attach the path and purpose to
//! the error message, so a failed snapshot or config load says what it was
//! looking for.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{DashboardError, Result};

fn io_context(e: &io::Error, path: &Path, purpose: &str) -> DashboardError {
    let context = match e.kind() {
        io::ErrorKind::PermissionDenied => "Permission denied - check file permissions",
        io::ErrorKind::NotFound => "File not found",
        io::ErrorKind::InvalidData => "File contains invalid UTF-8 data - cannot read as text",
        _ => "I/O failure",
    };
    DashboardError::Io(io::Error::new(
        e.kind(),
        format!("{context}: {} (needed for: {purpose})", path.display()),
    ))
}

/// Check that a directory exists and is readable
pub fn validate_directory(path: &Path, purpose: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(DashboardError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Directory not found: {} (needed for: {purpose})", path.display()),
        )));
    }
    fs::read_dir(path)
        .map(|_| ())
        .map_err(|e| io_context(&e, path, purpose))
}

/// Read a file to string with the path and purpose attached to any error
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    if !path.is_file() {
        return Err(DashboardError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("File not found: {} (needed for: {purpose})", path.display()),
        )));
    }
    fs::read_to_string(path).map_err(|e| io_context(&e, path, purpose))
}

/// Open a file with the path and purpose attached to any error
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    fs::File::open(path).map_err(|e| io_context(&e, path, purpose))
}
