use actix_web::{web, HttpResponse, Responder};

use crate::core::EngineError;
use crate::routes::{engine_error, AppState};

/// Configure service catalog routes
///
/// Categories hold subcategories, which hold the bookable services. An
/// unknown parent id yields an empty list.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/categories", web::get().to(categories))
        .route("/categories/{id}/subcategories", web::get().to(subcategories))
        .route("/subcategories/{id}/services", web::get().to(services));
}

/// GET /api/v1/categories
async fn categories(state: web::Data<AppState>) -> impl Responder {
    match state.store.service_categories().await {
        Ok(categories) => HttpResponse::Ok().json(categories),
        Err(e) => engine_error(EngineError::Store(e)),
    }
}

/// GET /api/v1/categories/{id}/subcategories
async fn subcategories(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    match state.store.service_subcategories(path.into_inner()).await {
        Ok(subcategories) => HttpResponse::Ok().json(subcategories),
        Err(e) => engine_error(EngineError::Store(e)),
    }
}

/// GET /api/v1/subcategories/{id}/services
async fn services(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    match state.store.bank_services(path.into_inner()).await {
        Ok(services) => HttpResponse::Ok().json(services),
        Err(e) => engine_error(EngineError::Store(e)),
    }
}
