use serde::{Deserialize, Serialize};
use crate::models::domain::{Branch, NearbyBranch, ScoredCandidate, ServiceInfo};

/// Serializable view of a branch, optionally with a per-request distance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchView {
    pub id: i64,
    pub name: String,
    pub post_index: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub load_rate: f64,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl BranchView {
    pub fn new(branch: &Branch, distance_km: Option<f64>) -> Self {
        Self {
            id: branch.id,
            name: branch.name.clone(),
            post_index: branch.post_index.clone(),
            address: branch.address.clone(),
            latitude: branch.latitude,
            longitude: branch.longitude,
            load_rate: branch.load_rate,
            rating: branch.rating,
            distance_km,
        }
    }
}

impl From<&NearbyBranch> for BranchView {
    fn from(nearby: &NearbyBranch) -> Self {
        Self::new(&nearby.branch, Some(nearby.distance))
    }
}

/// Branch with the score it was ranked on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedBranchView {
    #[serde(flatten)]
    pub branch: BranchView,
    pub score: f64,
}

impl From<&ScoredCandidate> for RankedBranchView {
    fn from(candidate: &ScoredCandidate) -> Self {
        Self {
            branch: BranchView::new(&candidate.branch, Some(candidate.distance)),
            score: candidate.score,
        }
    }
}

/// One branch with its distance from the caller and the services it provides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchDetailView {
    #[serde(flatten)]
    pub branch: BranchView,
    pub services: Vec<ServiceInfo>,
}

impl From<&NearbyBranch> for BranchDetailView {
    fn from(nearby: &NearbyBranch) -> Self {
        Self {
            branch: BranchView::from(nearby),
            services: nearby.branch.provided_services.clone(),
        }
    }
}

/// Response for a successful booking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookReservationResponse {
    pub reservation_id: i64,
    pub queue_position: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub branches: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
