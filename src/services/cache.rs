use moka::future::{Cache, CacheBuilder};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{BoundingBox, BranchType, MapMarker};
use crate::services::store::{GeoStore, StoreError};

/// In-process cache for map viewport lookups
///
/// Map clients re-request the same viewport while panning, so bounding-box
/// results are kept for a short TTL. Branch locations only change on reload,
/// which makes a stale entry harmless.
pub struct MapCache {
    markers: Cache<String, Arc<Vec<MapMarker>>>,
}

impl MapCache {
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let markers = CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { markers }
    }

    /// Return markers inside `bbox`, fetching from the store on a miss
    pub async fn markers_in(
        &self,
        store: &dyn GeoStore,
        branch_type: BranchType,
        bbox: &BoundingBox,
    ) -> Result<Arc<Vec<MapMarker>>, StoreError> {
        let key = CacheKey::viewport(branch_type, bbox);

        if let Some(markers) = self.markers.get(&key).await {
            tracing::trace!("Map cache hit: {}", key);
            return Ok(markers);
        }

        let markers = Arc::new(store.branches_in_bounding_box(branch_type, bbox).await?);
        self.markers.insert(key.clone(), markers.clone()).await;
        tracing::trace!("Map cache set: {}", key);

        Ok(markers)
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Viewport corners in full precision; `f64` display round-trips exactly,
    /// so two keys match only when the boxes are identical
    pub fn viewport(branch_type: BranchType, bbox: &BoundingBox) -> String {
        format!(
            "map:{}:{}:{}:{}:{}",
            branch_type, bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat
        )
    }
}
