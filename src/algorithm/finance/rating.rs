//! Accountability rating levels

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rating of one metric in one year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Exceeds,
    Meets,
    Approaches,
    #[serde(rename = "Does Not Meet")]
    DoesNotMeet,
    #[serde(rename = "No Rating")]
    NoRating,
}

impl Rating {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exceeds => "Exceeds",
            Self::Meets => "Meets",
            Self::Approaches => "Approaches",
            Self::DoesNotMeet => "Does Not Meet",
            Self::NoRating => "No Rating",
        }
    }

    /// Parse a published indicator rating
    ///
    /// Accepts full labels with or without a trailing "Standard" and the
    /// state's abbreviations (`ES`, `MS`, `AS`, `DNMS`). Anything else is
    /// `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim().to_ascii_lowercase();
        let text = text.strip_suffix(" standard").unwrap_or(&text);
        match text {
            "exceeds" | "es" => Some(Self::Exceeds),
            "meets" | "ms" => Some(Self::Meets),
            "approaches" | "as" => Some(Self::Approaches),
            "does not meet" | "dnms" | "dnm" => Some(Self::DoesNotMeet),
            "no rating" | "n/a" | "nr" => Some(Self::NoRating),
            _ => None,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A qualitative indicator rating with the text it was read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorRating {
    pub rating: Rating,
    pub raw: Option<String>,
}

impl IndicatorRating {
    /// Parse an indicator cell; unreadable text is kept as `No Rating`
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        let rating = raw.and_then(Rating::parse).unwrap_or_else(|| {
            if let Some(text) = raw {
                log::debug!("Unrecognised indicator rating '{text}'");
            }
            Rating::NoRating
        });
        Self {
            rating,
            raw: raw.map(str::to_string),
        }
    }
}
