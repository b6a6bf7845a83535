//! Comparable-peer selection engine
//!
//! Spatial indexes are memoised per `(snapshot, year, analysis)` so repeated
//! requests against one snapshot reuse the same tree; entries from older
//! snapshots are evicted when a new snapshot is seen.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::models::AnalysisType;
use crate::provider::DataProvider;
use crate::utils::{log_operation_complete, log_operation_start};

pub mod reconcile;
pub mod selection;
pub mod spatial;

pub use reconcile::{PeerOption, PeerSelection, reconcile};
pub use selection::{PeerCandidate, PeerQuery, select_peers, universe_from_batch};
pub use spatial::{GeoPoint, SpatialIndex};

type CacheKey = (u64, u16, AnalysisType);

/// Peer selection with a memoised spatial index
#[derive(Debug, Default)]
pub struct PeerEngine {
    cache: RwLock<FxHashMap<CacheKey, Arc<SpatialIndex>>>,
}

impl PeerEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spatial index of one year's universe, built on first use
    pub fn index(
        &self,
        provider: &dyn DataProvider,
        year: u16,
        analysis: AnalysisType,
    ) -> Result<Arc<SpatialIndex>> {
        let key = (provider.snapshot_id(), year, analysis);
        if let Ok(cache) = self.cache.read() {
            if let Some(index) = cache.get(&key) {
                return Ok(Arc::clone(index));
            }
        }

        let start = Instant::now();
        let label = format!("{analysis} universe {year}");
        log_operation_start("Building spatial index for", &label);
        let geo = provider.all_schools_geo(year, analysis)?;
        let index = Arc::new(SpatialIndex::build(universe_from_batch(&geo)?));
        log_operation_complete("indexed", &label, index.len(), "schools", Some(start.elapsed()));

        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|(snapshot, _, _), _| *snapshot == key.0);
            cache.insert(key, Arc::clone(&index));
        }
        Ok(index)
    }

    /// Nearest comparable schools for a query
    pub fn comparable_schools(
        &self,
        provider: &dyn DataProvider,
        query: &PeerQuery,
    ) -> Result<Vec<PeerCandidate>> {
        let index = self.index(provider, query.year, query.analysis)?;
        Ok(select_peers(&index, query))
    }

    /// Number of cached indexes
    #[must_use]
    pub fn cached_indexes(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or_default()
    }
}
