use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Rating substituted for records whose rating cannot be scored
pub const SENTINEL_WORST_RATING: f64 = 1.0;

/// Kind of branch a GeoStore query is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchType {
    Office,
    Atm,
}

impl BranchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchType::Office => "office",
            BranchType::Atm => "atm",
        }
    }
}

impl std::fmt::Display for BranchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bank service a branch can provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub id: i64,
    pub name: String,
}

/// Top level of the bank service catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub id: i64,
    pub name: String,
}

/// Second level of the bank service catalog; groups services under a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSubcategory {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
}

/// Raw branch row as persisted by the GeoStore
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRecord {
    pub id: i64,
    pub name: String,
    pub post_index: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub load_rate: f64,
    pub rating: f64,
    #[serde(default)]
    pub services: Vec<ServiceInfo>,
}

/// Lightweight record returned by bounding-box lookups for map rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One row of a nearest-k query: branch id plus its distance from the origin in km
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearBranch {
    pub branch_id: i64,
    pub distance: f64,
}

/// Persisted reservation fields, without the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub office_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub service_id: i64,
    #[serde(default)]
    pub contact: Option<String>,
}

/// A reservation held in a branch's digital queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub office_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub service_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl Reservation {
    pub fn from_record(id: i64, record: ReservationRecord) -> Self {
        Self {
            id,
            office_id: record.office_id,
            date: record.date,
            time: record.time,
            service_id: record.service_id,
            contact: record.contact,
        }
    }
}

/// A bank office or ATM held by the catalog for the lifetime of the process
///
/// Location, load and rating are a read-only snapshot taken at load time.
/// Only the digital queue changes at runtime, and every append goes through
/// the queue's own lock.
#[derive(Debug)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub post_index: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub load_rate: f64,
    pub rating: f64,
    pub provided_services: Vec<ServiceInfo>,
    digital_queue: RwLock<Vec<Reservation>>,
}

impl Branch {
    /// Build a branch from a store record, repairing values that cannot be scored
    pub fn from_record(record: BranchRecord) -> Self {
        let rating = if record.rating.is_finite() && record.rating > 0.0 {
            record.rating
        } else {
            tracing::warn!(
                branch_id = record.id,
                rating = record.rating,
                "Branch has a non-positive rating, substituting the worst rating"
            );
            SENTINEL_WORST_RATING
        };

        let load_rate = if record.load_rate.is_finite() {
            record.load_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if load_rate != record.load_rate {
            tracing::warn!(
                branch_id = record.id,
                load_rate = record.load_rate,
                "Branch load rate outside [0, 1], clamped to {}",
                load_rate
            );
        }

        Self {
            id: record.id,
            name: record.name,
            post_index: record.post_index,
            address: record.address,
            latitude: record.latitude,
            longitude: record.longitude,
            load_rate,
            rating,
            provided_services: record.services,
            digital_queue: RwLock::new(Vec::new()),
        }
    }

    /// Append a reservation in arrival order
    pub async fn enqueue(&self, reservation: Reservation) {
        self.digital_queue.write().await.push(reservation);
    }

    /// Copy of the in-process queue
    pub async fn queue_snapshot(&self) -> Vec<Reservation> {
        self.digital_queue.read().await.clone()
    }

    /// Set the contact on a queued reservation. Returns false when it is not queued here.
    pub async fn attach_contact(&self, reservation_id: i64, contact: &str) -> bool {
        let mut queue = self.digital_queue.write().await;
        match queue.iter_mut().find(|r| r.id == reservation_id) {
            Some(reservation) => {
                reservation.contact = Some(contact.to_string());
                true
            }
            None => false,
        }
    }
}

/// Ranking output: a branch with the distance and score it was ranked on
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub branch: Arc<Branch>,
    pub distance: f64,
    pub score: f64,
}

/// Search output: a branch with its distance from this search's origin
#[derive(Debug, Clone)]
pub struct NearbyBranch {
    pub branch: Arc<Branch>,
    pub distance: f64,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Scoring weights
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub distance: f64,
    pub load: f64,
    pub rating: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            distance: 0.55,
            load: 0.35,
            rating: 0.10,
        }
    }
}
