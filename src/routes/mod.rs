// Route exports
pub mod atms;
pub mod branches;
pub mod catalog;
pub mod maps;
pub mod reservations;

use actix_web::{web, HttpResponse};
use std::sync::Arc;
use validator::ValidationErrors;

use crate::core::{BranchSelector, EngineError, QueueManager};
use crate::models::ErrorResponse;
use crate::services::{GeoStore, MapCache, StoreError};

/// Application state shared across all handlers
///
/// `selector` and `queue` work on the office catalog, `atm_selector` on the
/// ATM catalog. All of them share one store.
#[derive(Clone)]
pub struct AppState {
    pub selector: BranchSelector,
    pub atm_selector: BranchSelector,
    pub queue: QueueManager,
    pub store: Arc<dyn GeoStore>,
    pub map_cache: Arc<MapCache>,
}

impl AppState {
    pub fn new(
        selector: BranchSelector,
        atm_selector: BranchSelector,
        queue: QueueManager,
        store: Arc<dyn GeoStore>,
        map_cache: Arc<MapCache>,
    ) -> Self {
        Self {
            selector,
            atm_selector,
            queue,
            store,
            map_cache,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(reservations::configure)
            .configure(branches::configure)
            .configure(atms::configure)
            .configure(catalog::configure)
            .configure(maps::configure),
    );
}

/// 400 response for a request that failed validation
pub(crate) fn validation_error(errors: ValidationErrors) -> HttpResponse {
    tracing::info!("Validation failed: field_errors={:?}", errors);
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Map an engine error onto its HTTP response
pub(crate) fn engine_error(err: EngineError) -> HttpResponse {
    let status_code = err.status_code();
    if status_code < 500 {
        tracing::info!("{}", err);
    } else {
        tracing::error!("Request failed: {}", err);
    }

    let error = match &err {
        EngineError::BranchNotFound(_) | EngineError::ReservationNotFound(_) => "Not found",
        EngineError::InvalidSlot(_) => "Invalid booking slot",
        EngineError::SlotTaken { .. } | EngineError::Store(StoreError::Conflict(_)) => "Slot already booked",
        EngineError::DataIntegrity(_) => "Data integrity error",
        EngineError::Store(StoreError::InvalidInput(_)) => "Invalid input",
        EngineError::Store(_) => "Store unavailable",
    };

    let status = actix_web::http::StatusCode::from_u16(status_code)
        .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);

    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: err.to_string(),
        status_code,
    })
}
