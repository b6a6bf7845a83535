//! Sentinel-preserving cells.
//!
//! State-published tables encode three different situations in one string
//! column: a number, a value withheld for N-size privacy (`***`), and no value
//! at all (empty or null). Everything downstream pattern-matches on [`Cell`]
//! instead of inspecting NaNs, so "suppressed" never collapses into "missing"
//! and a literal `"0"` stays a real zero.

use std::fmt;

use serde::{Serialize, Serializer};

/// Literal used by the state for suppressed values
pub const SUPPRESSED_TOKEN: &str = "***";

/// A single coerced table cell
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Cell {
    /// A real numeric value (including zero)
    Value(f64),
    /// A value exists upstream but is withheld
    Suppressed,
    /// No value
    #[default]
    Missing,
}

impl Cell {
    /// Coerce a raw string cell
    ///
    /// `"***"` becomes [`Cell::Suppressed`], empty/whitespace or `None` becomes
    /// [`Cell::Missing`], anything parseable as a finite number becomes
    /// [`Cell::Value`]. Unparseable text is treated as missing.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Missing;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        if trimmed == SUPPRESSED_TOKEN {
            return Self::Suppressed;
        }
        let numeric = trimmed.replace(',', "");
        match numeric.parse::<f64>() {
            Ok(v) if v.is_finite() => Self::Value(v),
            _ => {
                log::debug!("Treating non-numeric cell '{trimmed}' as missing");
                Self::Missing
            }
        }
    }

    /// Wrap an optional float, mapping NaN and infinities to missing
    #[must_use]
    pub fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Self::Value(v),
            _ => Self::Missing,
        }
    }

    /// The numeric value, if any
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    #[must_use]
    pub const fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed)
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// True for a numeric zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Value(v) if *v == 0.0)
    }

    /// Apply a function to the numeric value, keeping sentinels as they are
    #[must_use]
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Value(v) => Self::from_option(Some(f(v))),
            other => other,
        }
    }

    /// Combine two cells; missing dominates, then suppressed
    #[must_use]
    pub fn zip_with(self, other: Self, f: impl FnOnce(f64, f64) -> f64) -> Self {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => Self::from_option(Some(f(a, b))),
            (Self::Missing, _) | (_, Self::Missing) => Self::Missing,
            _ => Self::Suppressed,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::from_option(Some(value))
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        Self::from_option(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Suppressed => f.write_str(SUPPRESSED_TOKEN),
            Self::Missing => Ok(()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::Suppressed => serializer.serialize_str(SUPPRESSED_TOKEN),
            Self::Missing => serializer.serialize_none(),
        }
    }
}

/// Sum numeric cells
///
/// Returns [`Cell::Missing`] when every cell is missing and
/// [`Cell::Suppressed`] when any cell is suppressed, so an integer-zero sum is
/// always distinguishable from a sum over nothing.
#[must_use]
pub fn sum_cells<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Cell {
    let mut total = 0.0;
    let mut seen_value = false;
    let mut seen_suppressed = false;
    for cell in cells {
        match cell {
            Cell::Value(v) => {
                total += v;
                seen_value = true;
            }
            Cell::Suppressed => seen_suppressed = true,
            Cell::Missing => {}
        }
    }
    if seen_suppressed {
        Cell::Suppressed
    } else if seen_value {
        Cell::Value(total)
    } else {
        Cell::Missing
    }
}
