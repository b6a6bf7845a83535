//! Comparable-peer selection
//!
//! The universe is pruned by the minimum-cohort filter (K8) and the grade-span
//! overlap gate (skipped for adult high schools), then the nearest schools by
//! Euclidean distance on `(Lat, Lon)` are taken.

use arrow::record_batch::RecordBatch;
use serde::Serialize;

use super::spatial::{GeoPoint, SpatialIndex};
use crate::error::Result;
use crate::models::{AnalysisType, Grade, GradeSpan, SchoolId, SchoolType};
use crate::provider::GEO_TESTED_COLUMN;
use crate::schema::cell::Cell;
use crate::schema::columns::meta;
use crate::utils::arrow::extractors::{column_strings, optional_column_cells};

/// Parameters of one peer query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerQuery {
    pub school_id: SchoolId,
    pub year: u16,
    pub analysis: AnalysisType,
    /// `N_max`: how many peers to return at most
    pub universe_size: usize,
    pub min_tested: f64,
    pub overlap_grades_required: u8,
}

/// A selected peer, ordered by distance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerCandidate {
    pub id: SchoolId,
    pub name: String,
    pub distance: f64,
}

/// Decode an `all_schools_geo` batch into index points
///
/// Rows without coordinates are dropped; they can never be ranked by distance.
pub fn universe_from_batch(batch: &RecordBatch) -> Result<Vec<GeoPoint>> {
    let ids = column_strings(batch, meta::SCHOOL_ID)?;
    let names = column_strings(batch, meta::SCHOOL_NAME)?;
    let types = column_strings(batch, meta::SCHOOL_TYPE)?;
    let lows = column_strings(batch, meta::LOW_GRADE)?;
    let highs = column_strings(batch, meta::HIGH_GRADE)?;
    let lats = optional_column_cells(batch, "Lat")?;
    let lons = optional_column_cells(batch, "Lon")?;
    let tested = optional_column_cells(batch, GEO_TESTED_COLUMN)?;

    let mut points = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let Some(id) = ids[row].as_deref().and_then(|v| v.parse::<SchoolId>().ok()) else {
            continue;
        };
        let (Some(lat), Some(lon)) = (lats[row].value(), lons[row].value()) else {
            log::debug!("School {id} has no coordinates; excluded from spatial index");
            continue;
        };
        let low = lows[row].as_deref().and_then(|g| g.parse::<Grade>().ok());
        let high = highs[row].as_deref().and_then(|g| g.parse::<Grade>().ok());
        points.push(GeoPoint {
            id,
            name: names[row].clone().unwrap_or_default(),
            school_type: types[row]
                .as_deref()
                .and_then(|t| t.parse().ok())
                .unwrap_or(SchoolType::K8),
            span: low.zip(high).map(|(l, h)| GradeSpan::new(l, h)),
            lat,
            lon,
            tested: tested[row],
        });
    }
    Ok(points)
}

/// Select the nearest comparable schools
///
/// Returns an empty list when the selected school is not in the index.
#[must_use]
pub fn select_peers(index: &SpatialIndex, query: &PeerQuery) -> Vec<PeerCandidate> {
    let Some(selected) = index.get(query.school_id) else {
        log::info!(
            "School {} not in the {} universe for {}; no peers",
            query.school_id,
            query.analysis,
            query.year
        );
        return Vec::new();
    };

    let gate_span = match (selected.school_type, selected.span) {
        (SchoolType::AHS, _) => None,
        (_, Some(span)) => Some(span),
        (_, None) => {
            log::warn!(
                "School {} has no grade span; skipping the overlap gate",
                selected.id
            );
            None
        }
    };

    let accept = |candidate: &GeoPoint| {
        if candidate.id == selected.id {
            return false;
        }
        if query.analysis == AnalysisType::K8 && !meets_cohort_minimum(candidate.tested, query.min_tested) {
            return false;
        }
        match gate_span {
            Some(span) => candidate
                .span
                .is_some_and(|c| span.overlaps(&c, query.overlap_grades_required)),
            None => true,
        }
    };

    index
        .nearest(selected.lat, selected.lon, query.universe_size, accept)
        .into_iter()
        .map(|(distance, point)| PeerCandidate {
            id: point.id,
            name: point.name.clone(),
            distance,
        })
        .collect()
}

/// Cohort filter: suppressed or missing counts never meet the minimum
fn meets_cohort_minimum(tested: Cell, minimum: f64) -> bool {
    tested.value().is_some_and(|t| t >= minimum)
}

/// Sort candidates by distance, then id
pub fn sort_by_distance(peers: &mut [PeerCandidate]) {
    peers.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
}
