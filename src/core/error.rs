use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::services::StoreError;

/// Errors surfaced by the selection engine and queue manager
///
/// An empty or partial search result is never an error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Branch not found: {0}")]
    BranchNotFound(i64),

    #[error("Reservation not found: {0}")]
    ReservationNotFound(i64),

    #[error("Invalid booking slot: {0}")]
    InvalidSlot(String),

    #[error("Slot already booked: office {office_id} at {date} {time}")]
    SlotTaken {
        office_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    },

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::BranchNotFound(_) | EngineError::ReservationNotFound(_) => 404,
            EngineError::InvalidSlot(_) => 400,
            EngineError::SlotTaken { .. } => 409,
            EngineError::DataIntegrity(_) => 500,
            EngineError::Store(StoreError::InvalidInput(_)) => 400,
            EngineError::Store(StoreError::Conflict(_)) => 409,
            EngineError::Store(_) => 503,
        }
    }
}
