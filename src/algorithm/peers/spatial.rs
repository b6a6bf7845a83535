//! Two-dimensional kd-tree over school coordinates
//!
//! Points are stored in one vector arranged as an implicit tree: the median
//! of every sub-range (split on alternating axes) is that range's node.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::models::{GradeSpan, SchoolId, SchoolType};
use crate::schema::cell::Cell;

/// A school in the geographic universe of one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub id: SchoolId,
    pub name: String,
    pub school_type: SchoolType,
    pub span: Option<GradeSpan>,
    pub lat: f64,
    pub lon: f64,
    /// `Total|ELA Total Tested` for the year (K8 universes)
    pub tested: Cell,
}

impl GeoPoint {
    fn coord(&self, axis: usize) -> f64 {
        if axis == 0 { self.lat } else { self.lon }
    }

    /// Squared Euclidean distance in degree space
    #[must_use]
    pub fn distance_sq(&self, lat: f64, lon: f64) -> f64 {
        (self.lat - lat).powi(2) + (self.lon - lon).powi(2)
    }
}

/// Candidate in the bounded max-heap; the farthest (then highest id) is on top
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist_sq: f64,
    id: SchoolId,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Spatial index over one year's universe of schools
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    points: Vec<GeoPoint>,
}

impl SpatialIndex {
    /// Build the tree; points without finite coordinates must be filtered out first
    #[must_use]
    pub fn build(mut points: Vec<GeoPoint>) -> Self {
        points.retain(|p| p.lat.is_finite() && p.lon.is_finite());
        let len = points.len();
        Self::arrange(&mut points, 0, len, 0);
        Self { points }
    }

    fn arrange(points: &mut [GeoPoint], lo: usize, hi: usize, depth: usize) {
        if hi.saturating_sub(lo) <= 1 {
            return;
        }
        let axis = depth % 2;
        let mid = lo + (hi - lo) / 2;
        points[lo..hi].select_nth_unstable_by(mid - lo, |a, b| {
            a.coord(axis).total_cmp(&b.coord(axis)).then(a.id.cmp(&b.id))
        });
        Self::arrange(points, lo, mid, depth + 1);
        Self::arrange(points, mid + 1, hi, depth + 1);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point with the given id
    #[must_use]
    pub fn get(&self, id: SchoolId) -> Option<&GeoPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    /// The `k` nearest accepted points, sorted by distance then id
    ///
    /// Returns `(distance, point)` pairs with Euclidean distances.
    pub fn nearest<F>(&self, lat: f64, lon: f64, k: usize, accept: F) -> Vec<(f64, &GeoPoint)>
    where
        F: Fn(&GeoPoint) -> bool,
    {
        if k == 0 || self.points.is_empty() {
            return Vec::new();
        }
        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search(0, self.points.len(), 0, [lat, lon], k, &accept, &mut heap);
        let mut found: Vec<Candidate> = heap.into_vec();
        found.sort();
        found
            .into_iter()
            .map(|c| (c.dist_sq.sqrt(), &self.points[c.index]))
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn search<F>(
        &self,
        lo: usize,
        hi: usize,
        depth: usize,
        target: [f64; 2],
        k: usize,
        accept: &F,
        heap: &mut BinaryHeap<Candidate>,
    ) where
        F: Fn(&GeoPoint) -> bool,
    {
        if lo >= hi {
            return;
        }
        let axis = depth % 2;
        let mid = lo + (hi - lo) / 2;
        let point = &self.points[mid];

        if accept(point) {
            let candidate = Candidate {
                dist_sq: point.distance_sq(target[0], target[1]),
                id: point.id,
                index: mid,
            };
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        let diff = target[axis] - point.coord(axis);
        let (near, far) = if diff < 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };
        self.search(near.0, near.1, depth + 1, target, k, accept, heap);
        let must_cross = heap.len() < k || heap.peek().is_some_and(|w| diff * diff <= w.dist_sq);
        if must_cross {
            self.search(far.0, far.1, depth + 1, target, k, accept, heap);
        }
    }
}
