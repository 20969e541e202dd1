use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tracing::instrument;

use crate::core::{booking::BookingPolicy, catalog::BranchCatalog, error::EngineError};
use crate::models::Reservation;
use crate::services::{GeoStore, StoreError};

/// Map a store miss on a reservation lookup to `ReservationNotFound`
fn reservation_error(err: StoreError, reservation_id: i64) -> EngineError {
    match err {
        StoreError::NotFound(_) => EngineError::ReservationNotFound(reservation_id),
        other => EngineError::Store(other),
    }
}

/// Maintains each branch's digital queue and the slots it can still take
#[derive(Clone)]
pub struct QueueManager {
    catalog: Arc<BranchCatalog>,
    store: Arc<dyn GeoStore>,
    policy: BookingPolicy,
}

impl QueueManager {
    pub fn new(catalog: Arc<BranchCatalog>, store: Arc<dyn GeoStore>) -> Self {
        Self::with_policy(catalog, store, BookingPolicy::default())
    }

    pub fn with_policy(catalog: Arc<BranchCatalog>, store: Arc<dyn GeoStore>, policy: BookingPolicy) -> Self {
        Self { catalog, store, policy }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Free slot start times at an office on `date`, as seen at `now`
    ///
    /// Booked slots are left out, and so are slots of today that have
    /// already started. A date outside the booking window is `InvalidSlot`.
    #[instrument(skip(self))]
    pub async fn time_slots(
        &self,
        office_id: i64,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveTime>, EngineError> {
        self.catalog.find(office_id)?;

        if !self.policy.in_window(date, now.date()) {
            return Err(EngineError::InvalidSlot(format!(
                "{} is outside the {} day booking window",
                date, self.policy.horizon_days
            )));
        }

        self.free_slots(office_id, date, now).await
    }

    /// Days in the booking window on which the office still has a free slot
    #[instrument(skip(self))]
    pub async fn reservation_days(&self, office_id: i64, now: NaiveDateTime) -> Result<Vec<NaiveDate>, EngineError> {
        self.catalog.find(office_id)?;

        let mut days = Vec::new();
        for date in self.policy.days_from(now.date()) {
            if !self.free_slots(office_id, date, now).await?.is_empty() {
                days.push(date);
            }
        }

        Ok(days)
    }

    async fn free_slots(
        &self,
        office_id: i64,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveTime>, EngineError> {
        let booked = self.store.booked_times(office_id, date).await?;

        Ok(self
            .policy
            .slots()
            .into_iter()
            .filter(|slot| !booked.contains(slot))
            .filter(|slot| date > now.date() || *slot > now.time())
            .collect())
    }

    /// Load a persisted reservation and append it to its office's queue
    ///
    /// An office id missing from the catalog fails with `BranchNotFound`
    /// before any queue is touched.
    #[instrument(skip(self))]
    pub async fn register_reservation(&self, reservation_id: i64) -> Result<Reservation, EngineError> {
        let record = self
            .store
            .reservation_record(reservation_id)
            .await
            .map_err(|e| reservation_error(e, reservation_id))?;

        let branch = self.catalog.find(record.office_id)?;
        let reservation = Reservation::from_record(reservation_id, record);
        branch.enqueue(reservation.clone()).await;

        tracing::info!(
            reservation_id,
            office_id = branch.id,
            "Reservation added to digital queue"
        );

        Ok(reservation)
    }

    /// Every persisted reservation of an office, in the order the store lists them
    ///
    /// Each id is hydrated with its own lookup, which is fine for queues of a
    /// few dozen entries and does not scale past that.
    #[instrument(skip(self))]
    pub async fn list_queue(&self, office_id: i64) -> Result<Vec<Reservation>, EngineError> {
        self.catalog.find(office_id)?;

        let ids = self.store.reservation_ids_for_office(office_id).await?;
        let mut reservations = Vec::with_capacity(ids.len());
        for reservation_id in ids {
            let record = self
                .store
                .reservation_record(reservation_id)
                .await
                .map_err(|e| reservation_error(e, reservation_id))?;
            reservations.push(Reservation::from_record(reservation_id, record));
        }

        Ok(reservations)
    }

    /// Create a reservation in the store and queue it at the office
    ///
    /// The slot is checked against the booking policy as of `now`. A slot
    /// another booking already holds fails with `SlotTaken`. Returns the
    /// reservation and its 1-based position in the in-process queue.
    #[instrument(skip(self))]
    pub async fn book(
        &self,
        office_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        service_id: i64,
        now: NaiveDateTime,
    ) -> Result<(Reservation, usize), EngineError> {
        let branch = self.catalog.find(office_id)?;
        self.policy.check(date, time, now)?;

        let reservation_id = self
            .store
            .create_reservation(office_id, date, time, service_id)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => EngineError::SlotTaken { office_id, date, time },
                other => EngineError::Store(other),
            })?;
        let reservation = self.register_reservation(reservation_id).await?;

        let position = branch
            .queue_snapshot()
            .await
            .iter()
            .position(|queued| queued.id == reservation_id)
            .map_or(0, |index| index + 1);

        Ok((reservation, position))
    }

    /// Store a contact for reminders and mirror it onto the queued reservation
    #[instrument(skip(self, contact))]
    pub async fn register_notification(&self, reservation_id: i64, contact: &str) -> Result<(), EngineError> {
        self.store
            .register_notification(reservation_id, contact)
            .await
            .map_err(|e| reservation_error(e, reservation_id))?;

        let record = self
            .store
            .reservation_record(reservation_id)
            .await
            .map_err(|e| reservation_error(e, reservation_id))?;

        if let Ok(branch) = self.catalog.find(record.office_id) {
            if !branch.attach_contact(reservation_id, contact).await {
                tracing::debug!(reservation_id, "Reservation not queued in this process, contact stored only");
            }
        }

        Ok(())
    }

    /// Reservations queued at an office during this run
    pub async fn queue_snapshot(&self, office_id: i64) -> Result<Vec<Reservation>, EngineError> {
        Ok(self.catalog.find(office_id)?.queue_snapshot().await)
    }
}
