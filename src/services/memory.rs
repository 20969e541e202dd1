use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::core::distance::{haversine_distance, is_within_bounding_box};
use crate::models::{
    BoundingBox, BranchRecord, BranchType, MapMarker, NearBranch, Reservation, ReservationRecord,
    ServiceCategory, ServiceInfo, ServiceSubcategory,
};
use crate::services::store::{GeoStore, StoreError};

/// GeoStore held entirely in memory
///
/// Used for local runs without PostgreSQL, and by tests and benches.
/// Nearest-k ordering is by distance, then id, so results are deterministic.
pub struct InMemoryGeoStore {
    branches: Vec<(BranchType, BranchRecord)>,
    categories: Vec<ServiceCategory>,
    subcategories: Vec<ServiceSubcategory>,
    services: Vec<(i64, ServiceInfo)>,
    reservations: RwLock<BTreeMap<i64, ReservationRecord>>,
    next_reservation_id: AtomicI64,
    nearest_queries: AtomicUsize,
}

impl InMemoryGeoStore {
    pub fn new() -> Self {
        Self {
            branches: Vec::new(),
            categories: Vec::new(),
            subcategories: Vec::new(),
            services: Vec::new(),
            reservations: RwLock::new(BTreeMap::new()),
            next_reservation_id: AtomicI64::new(1),
            nearest_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_branch(mut self, branch_type: BranchType, record: BranchRecord) -> Self {
        self.branches.push((branch_type, record));
        self
    }

    pub fn with_branches<I>(mut self, branch_type: BranchType, records: I) -> Self
    where
        I: IntoIterator<Item = BranchRecord>,
    {
        self.branches
            .extend(records.into_iter().map(|record| (branch_type, record)));
        self
    }

    pub fn with_category(mut self, id: i64, name: &str) -> Self {
        self.categories.push(ServiceCategory { id, name: name.to_string() });
        self
    }

    pub fn with_subcategory(mut self, id: i64, category_id: i64, name: &str) -> Self {
        self.subcategories.push(ServiceSubcategory {
            id,
            category_id,
            name: name.to_string(),
        });
        self
    }

    pub fn with_service(mut self, subcategory_id: i64, service: ServiceInfo) -> Self {
        self.services.push((subcategory_id, service));
        self
    }

    /// Number of nearest-k queries served so far
    pub fn nearest_queries(&self) -> usize {
        self.nearest_queries.load(Ordering::Relaxed)
    }

    fn records_of(&self, branch_type: BranchType) -> impl Iterator<Item = &BranchRecord> {
        self.branches
            .iter()
            .filter(move |(t, _)| *t == branch_type)
            .map(|(_, record)| record)
    }
}

impl Default for InMemoryGeoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeoStore for InMemoryGeoStore {
    async fn branch_records(&self, branch_type: BranchType) -> Result<Vec<BranchRecord>, StoreError> {
        Ok(self.records_of(branch_type).cloned().collect())
    }

    async fn nearest_branches(
        &self,
        branch_type: BranchType,
        longitude: f64,
        latitude: f64,
        k: usize,
    ) -> Result<Vec<NearBranch>, StoreError> {
        self.nearest_queries.fetch_add(1, Ordering::Relaxed);

        let mut rows: Vec<NearBranch> = self
            .records_of(branch_type)
            .map(|record| NearBranch {
                branch_id: record.id,
                distance: haversine_distance(latitude, longitude, record.latitude, record.longitude),
            })
            .collect();

        rows.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.branch_id.cmp(&b.branch_id))
        });
        rows.truncate(k);

        Ok(rows)
    }

    async fn branches_in_bounding_box(
        &self,
        branch_type: BranchType,
        bbox: &BoundingBox,
    ) -> Result<Vec<MapMarker>, StoreError> {
        Ok(self
            .records_of(branch_type)
            .filter(|record| is_within_bounding_box(record.latitude, record.longitude, bbox))
            .map(|record| MapMarker {
                id: record.id,
                name: record.name.clone(),
                address: record.address.clone(),
                latitude: record.latitude,
                longitude: record.longitude,
            })
            .collect())
    }

    async fn reservation_record(&self, reservation_id: i64) -> Result<ReservationRecord, StoreError> {
        self.reservations
            .read()
            .await
            .get(&reservation_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("reservation {}", reservation_id)))
    }

    async fn reservation_ids_for_office(&self, office_id: i64) -> Result<Vec<i64>, StoreError> {
        Ok(self
            .reservations
            .read()
            .await
            .iter()
            .filter(|(_, record)| record.office_id == office_id)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn booked_times(&self, office_id: i64, date: NaiveDate) -> Result<Vec<NaiveTime>, StoreError> {
        let mut times: Vec<NaiveTime> = self
            .reservations
            .read()
            .await
            .values()
            .filter(|record| record.office_id == office_id && record.date == date)
            .map(|record| record.time)
            .collect();
        times.sort();
        Ok(times)
    }

    async fn create_reservation(
        &self,
        office_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        service_id: i64,
    ) -> Result<i64, StoreError> {
        // Check and insert under one write guard so concurrent bookings of a slot serialize
        let mut reservations = self.reservations.write().await;
        let taken = reservations
            .values()
            .any(|record| record.office_id == office_id && record.date == date && record.time == time);
        if taken {
            return Err(StoreError::Conflict(format!(
                "office {} already booked at {} {}",
                office_id, date, time
            )));
        }

        let id = self.next_reservation_id.fetch_add(1, Ordering::Relaxed);
        reservations.insert(
            id,
            ReservationRecord {
                office_id,
                date,
                time,
                service_id,
                contact: None,
            },
        );
        Ok(id)
    }

    async fn register_notification(&self, reservation_id: i64, contact: &str) -> Result<(), StoreError> {
        let mut reservations = self.reservations.write().await;
        let record = reservations
            .get_mut(&reservation_id)
            .ok_or_else(|| StoreError::NotFound(format!("reservation {}", reservation_id)))?;
        record.contact = Some(contact.to_string());
        Ok(())
    }

    async fn reservations_due(&self, date: NaiveDate) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .reservations
            .read()
            .await
            .iter()
            .filter(|(_, record)| record.date == date && record.contact.is_some())
            .map(|(id, record)| Reservation::from_record(*id, record.clone()))
            .collect())
    }

    async fn service_categories(&self) -> Result<Vec<ServiceCategory>, StoreError> {
        Ok(self.categories.clone())
    }

    async fn service_subcategories(&self, category_id: i64) -> Result<Vec<ServiceSubcategory>, StoreError> {
        Ok(self
            .subcategories
            .iter()
            .filter(|subcategory| subcategory.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn bank_services(&self, subcategory_id: i64) -> Result<Vec<ServiceInfo>, StoreError> {
        Ok(self
            .services
            .iter()
            .filter(|(id, _)| *id == subcategory_id)
            .map(|(_, service)| service.clone())
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, latitude: f64, longitude: f64) -> BranchRecord {
        BranchRecord {
            id,
            name: format!("Office {}", id),
            post_index: "101000".to_string(),
            address: format!("Street {}", id),
            latitude,
            longitude,
            load_rate: 0.5,
            rating: 4.0,
            services: vec![],
        }
    }

    #[tokio::test]
    async fn test_nearest_sorted_and_limited() {
        let store = InMemoryGeoStore::new()
            .with_branch(BranchType::Office, record(1, 55.80, 37.60))
            .with_branch(BranchType::Office, record(2, 55.76, 37.60))
            .with_branch(BranchType::Office, record(3, 55.90, 37.60))
            .with_branch(BranchType::Atm, record(4, 55.75, 37.60));

        let rows = store
            .nearest_branches(BranchType::Office, 37.60, 55.75, 2)
            .await
            .unwrap();

        assert_eq!(rows.iter().map(|r| r.branch_id).collect::<Vec<_>>(), vec![2, 1]);
        assert!(rows[0].distance < rows[1].distance);
        assert_eq!(store.nearest_queries(), 1);
    }

    #[tokio::test]
    async fn test_reservation_lifecycle() {
        let store = InMemoryGeoStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();

        let id = store.create_reservation(1, date, time, 3).await.unwrap();
        assert_eq!(store.reservation_ids_for_office(1).await.unwrap(), vec![id]);
        assert!(store.reservations_due(date).await.unwrap().is_empty());

        store.register_notification(id, "+79990000000").await.unwrap();
        let due = store.reservations_due(date).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].contact.as_deref(), Some("+79990000000"));

        assert!(matches!(
            store.reservation_record(id + 1).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_same_slot_cannot_be_booked_twice() {
        let store = InMemoryGeoStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

        store.create_reservation(1, date, ten, 3).await.unwrap();
        store.create_reservation(1, date, nine, 3).await.unwrap();
        // Same time at another office is a different slot
        store.create_reservation(2, date, ten, 3).await.unwrap();

        assert!(matches!(
            store.create_reservation(1, date, ten, 4).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.booked_times(1, date).await.unwrap(), vec![nine, ten]);
        assert_eq!(store.reservation_ids_for_office(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_service_catalog_levels() {
        let store = InMemoryGeoStore::new()
            .with_category(1, "Individuals")
            .with_category(2, "Business")
            .with_subcategory(10, 1, "Cards")
            .with_subcategory(20, 2, "Accounts")
            .with_service(10, ServiceInfo { id: 7, name: "Card reissue".to_string() });

        assert_eq!(store.service_categories().await.unwrap().len(), 2);

        let subcategories = store.service_subcategories(1).await.unwrap();
        assert_eq!(subcategories.len(), 1);
        assert_eq!(subcategories[0].id, 10);

        let services = store.bank_services(10).await.unwrap();
        assert_eq!(services[0].id, 7);
        assert!(store.bank_services(20).await.unwrap().is_empty());
        assert!(store.service_subcategories(99).await.unwrap().is_empty());
    }
}
