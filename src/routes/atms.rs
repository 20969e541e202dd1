use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{BranchDetailView, LocationQuery, OriginQuery, RankedBranchView};
use crate::routes::{engine_error, validation_error, AppState};

/// Configure ATM routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/atms/best", web::get().to(best_atm))
        .route("/atms/{id}", web::get().to(atm_info));
}

/// Rank the nearest ATMs with the office scoring weights
///
/// GET /api/v1/atms/best?longitude={lon}&latitude={lat}&k={k}
async fn best_atm(
    state: web::Data<AppState>,
    query: web::Query<LocationQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    let k = query.k.map_or(state.atm_selector.limits().default_k, usize::from);

    match state.atm_selector.best_branch(query.longitude, query.latitude, k).await {
        Ok(ranked) => {
            tracing::info!("Ranked {} ATMs near ({}, {})", ranked.len(), query.longitude, query.latitude);
            HttpResponse::Ok().json(ranked.iter().map(RankedBranchView::from).collect::<Vec<_>>())
        }
        Err(e) => engine_error(e),
    }
}

/// GET /api/v1/atms/{id}?longitude={lon}&latitude={lat}
async fn atm_info(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<OriginQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    match state.atm_selector.branch_info(path.into_inner(), query.longitude, query.latitude) {
        Ok(info) => HttpResponse::Ok().json(BranchDetailView::from(&info)),
        Err(e) => engine_error(e),
    }
}
