use std::sync::Arc;
use tracing::instrument;

use crate::core::{
    catalog::BranchCatalog,
    distance::haversine_distance,
    error::EngineError,
    filters::ServiceMatches,
    scoring::rank_candidates,
};
use crate::models::{NearBranch, NearbyBranch, ScoredCandidate, ScoringWeights, ServiceInfo};
use crate::services::GeoStore;

/// Query sizes for the selector
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    /// Candidates fetched for best-branch ranking
    pub default_k: usize,
    /// Results wanted from the service-filtered search
    pub default_max_results: usize,
    /// Rows returned by the plain nearest lookup
    pub near_k: usize,
    /// Largest k the expanding search will ask for
    pub search_cap: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default_k: 5,
            default_max_results: 5,
            near_k: 10,
            search_cap: 100,
        }
    }
}

/// Picks branches near a point: weighted ranking and service-filtered search
///
/// Per-request distances stay in the returned `(branch, distance)` pairs.
/// The catalog's branches are never written to, so concurrent searches from
/// different origins cannot see each other's distances.
#[derive(Clone)]
pub struct BranchSelector {
    catalog: Arc<BranchCatalog>,
    store: Arc<dyn GeoStore>,
    weights: ScoringWeights,
    limits: SearchLimits,
}

impl BranchSelector {
    pub fn new(
        catalog: Arc<BranchCatalog>,
        store: Arc<dyn GeoStore>,
        weights: ScoringWeights,
        limits: SearchLimits,
    ) -> Self {
        Self {
            catalog,
            store,
            weights,
            limits,
        }
    }

    pub fn with_defaults(catalog: Arc<BranchCatalog>, store: Arc<dyn GeoStore>) -> Self {
        Self::new(catalog, store, ScoringWeights::default(), SearchLimits::default())
    }

    pub fn catalog(&self) -> &Arc<BranchCatalog> {
        &self.catalog
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Rank the `k` nearest branches by weighted score, best first
    ///
    /// All `k` fetched candidates come back, reordered; nothing is dropped
    /// after scoring.
    #[instrument(skip(self))]
    pub async fn best_branch(
        &self,
        longitude: f64,
        latitude: f64,
        k: usize,
    ) -> Result<Vec<ScoredCandidate>, EngineError> {
        let rows = self
            .store
            .nearest_branches(self.catalog.branch_type(), longitude, latitude, k)
            .await?;
        let candidates = self.resolve(rows)?;

        tracing::debug!("Ranking {} candidates", candidates.len());

        rank_candidates(candidates, &self.weights)
    }

    /// Nearest branches providing `service_id`, widening the scan until enough are found
    ///
    /// Starts with `k = max_results` and asks again with `k + 1` until
    /// `max_results` distinct providers are collected, k reaches the search
    /// cap, or the store has no more branches. A short result is a valid
    /// outcome. Output is sorted ascending by distance.
    #[instrument(skip(self))]
    pub async fn available_near_branches(
        &self,
        service_id: i64,
        longitude: f64,
        latitude: f64,
        max_results: usize,
    ) -> Result<Vec<NearbyBranch>, EngineError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let cap = self.limits.search_cap;
        let mut k = max_results.min(cap);
        let mut matches = ServiceMatches::new(service_id);

        loop {
            let rows = self
                .store
                .nearest_branches(self.catalog.branch_type(), longitude, latitude, k)
                .await?;
            let store_exhausted = rows.len() < k;

            for candidate in self.resolve(rows)? {
                matches.offer(candidate);
            }

            if matches.len() >= max_results {
                break;
            }
            if store_exhausted {
                tracing::debug!(k, found = matches.len(), "Store exhausted before enough providers were found");
                break;
            }
            if k >= cap {
                tracing::debug!(k, found = matches.len(), "Search cap reached before enough providers were found");
                break;
            }
            k += 1;
        }

        Ok(matches.into_nearest(max_results))
    }

    /// The `k` nearest branches with their distances, unscored
    #[instrument(skip(self))]
    pub async fn near_branches(
        &self,
        longitude: f64,
        latitude: f64,
        k: usize,
    ) -> Result<Vec<NearbyBranch>, EngineError> {
        let rows = self
            .store
            .nearest_branches(self.catalog.branch_type(), longitude, latitude, k)
            .await?;
        self.resolve(rows)
    }

    /// One branch with its distance from the given point
    pub fn branch_info(&self, branch_id: i64, longitude: f64, latitude: f64) -> Result<NearbyBranch, EngineError> {
        let branch = self.catalog.find(branch_id)?;
        let distance = haversine_distance(latitude, longitude, branch.latitude, branch.longitude);

        Ok(NearbyBranch {
            branch: Arc::clone(branch),
            distance,
        })
    }

    /// Services a branch provides
    pub fn services_of(&self, branch_id: i64) -> Result<&[ServiceInfo], EngineError> {
        Ok(&self.catalog.find(branch_id)?.provided_services)
    }

    /// Pair store rows with catalog branches. An id missing from the catalog is an error.
    fn resolve(&self, rows: Vec<NearBranch>) -> Result<Vec<NearbyBranch>, EngineError> {
        rows.into_iter()
            .map(|row| {
                let branch = self.catalog.find(row.branch_id).map_err(|e| {
                    tracing::error!(branch_id = row.branch_id, "Store returned a branch missing from the catalog");
                    e
                })?;
                Ok(NearbyBranch {
                    branch: Arc::clone(branch),
                    distance: row.distance,
                })
            })
            .collect()
    }
}
