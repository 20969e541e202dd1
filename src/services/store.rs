use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::models::{
    BoundingBox, BranchRecord, BranchType, MapMarker, NearBranch, Reservation, ReservationRecord,
    ServiceCategory, ServiceInfo, ServiceSubcategory,
};

/// Errors that can occur when talking to the backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Persistent source of branch, service and reservation data
///
/// Distances are great-circle kilometres. `nearest_branches` returns rows
/// ordered ascending by distance and never more than `k` of them.
#[async_trait]
pub trait GeoStore: Send + Sync {
    /// Every branch of a type together with the services it provides
    async fn branch_records(&self, branch_type: BranchType) -> Result<Vec<BranchRecord>, StoreError>;

    async fn nearest_branches(
        &self,
        branch_type: BranchType,
        longitude: f64,
        latitude: f64,
        k: usize,
    ) -> Result<Vec<NearBranch>, StoreError>;

    async fn branches_in_bounding_box(
        &self,
        branch_type: BranchType,
        bbox: &BoundingBox,
    ) -> Result<Vec<MapMarker>, StoreError>;

    /// Fails with `StoreError::NotFound` for an unknown id
    async fn reservation_record(&self, reservation_id: i64) -> Result<ReservationRecord, StoreError>;

    async fn reservation_ids_for_office(&self, office_id: i64) -> Result<Vec<i64>, StoreError>;

    /// Start times already booked at an office on `date`, ascending
    async fn booked_times(&self, office_id: i64, date: NaiveDate) -> Result<Vec<NaiveTime>, StoreError>;

    /// Persist a reservation and return its new id
    ///
    /// Fails with `StoreError::Conflict` when the office already has a
    /// reservation starting at the same date and time.
    async fn create_reservation(
        &self,
        office_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        service_id: i64,
    ) -> Result<i64, StoreError>;

    async fn register_notification(&self, reservation_id: i64, contact: &str) -> Result<(), StoreError>;

    /// Reservations on `date` that have a contact to notify
    async fn reservations_due(&self, date: NaiveDate) -> Result<Vec<Reservation>, StoreError>;

    async fn service_categories(&self) -> Result<Vec<ServiceCategory>, StoreError>;

    /// Subcategories of one category; empty for an unknown category
    async fn service_subcategories(&self, category_id: i64) -> Result<Vec<ServiceSubcategory>, StoreError>;

    /// Services grouped under one subcategory; empty for an unknown subcategory
    async fn bank_services(&self, subcategory_id: i64) -> Result<Vec<ServiceInfo>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
