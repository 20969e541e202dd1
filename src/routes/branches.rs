use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    AvailableBranchesQuery, BranchDetailView, BranchView, HealthResponse, LocationQuery, OriginQuery, RankedBranchView,
};
use crate::routes::{engine_error, validation_error, AppState};

/// Configure branch search routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/branches/best", web::get().to(best_branch))
        .route("/branches/available", web::get().to(available_branches))
        .route("/branches/near", web::get().to(near_branches))
        .route("/branches/{id}/services", web::get().to(branch_services))
        .route("/branches/{id}", web::get().to(branch_info));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        branches: state.selector.catalog().len(),
        timestamp: chrono::Utc::now(),
    })
}

/// Rank the nearest offices by weighted score
///
/// GET /api/v1/branches/best?longitude={lon}&latitude={lat}&k={k}
async fn best_branch(
    state: web::Data<AppState>,
    query: web::Query<LocationQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    let k = query.k.map_or(state.selector.limits().default_k, usize::from);

    match state.selector.best_branch(query.longitude, query.latitude, k).await {
        Ok(ranked) => {
            tracing::info!("Ranked {} offices near ({}, {})", ranked.len(), query.longitude, query.latitude);
            HttpResponse::Ok().json(ranked.iter().map(RankedBranchView::from).collect::<Vec<_>>())
        }
        Err(e) => engine_error(e),
    }
}

/// Nearest offices that provide a service
///
/// GET /api/v1/branches/available?service_id={id}&longitude={lon}&latitude={lat}&max_results={n}
async fn available_branches(
    state: web::Data<AppState>,
    query: web::Query<AvailableBranchesQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    let limits = state.selector.limits();
    let max_results = query
        .max_results
        .map_or(limits.default_max_results, usize::from)
        .min(limits.search_cap);

    match state
        .selector
        .available_near_branches(query.service_id, query.longitude, query.latitude, max_results)
        .await
    {
        Ok(found) => HttpResponse::Ok().json(found.iter().map(BranchView::from).collect::<Vec<_>>()),
        Err(e) => engine_error(e),
    }
}

/// Nearest offices with distances, unscored
///
/// GET /api/v1/branches/near?longitude={lon}&latitude={lat}&k={k}
async fn near_branches(
    state: web::Data<AppState>,
    query: web::Query<LocationQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    let k = query.k.map_or(state.selector.limits().near_k, usize::from);

    match state.selector.near_branches(query.longitude, query.latitude, k).await {
        Ok(found) => HttpResponse::Ok().json(found.iter().map(BranchView::from).collect::<Vec<_>>()),
        Err(e) => engine_error(e),
    }
}

/// Services offered at a branch
///
/// GET /api/v1/branches/{id}/services
async fn branch_services(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    match state.selector.services_of(path.into_inner()) {
        Ok(services) => HttpResponse::Ok().json(services),
        Err(e) => engine_error(e),
    }
}

/// One office with its distance from the caller and its services
///
/// GET /api/v1/branches/{id}?longitude={lon}&latitude={lat}
async fn branch_info(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<OriginQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    match state.selector.branch_info(path.into_inner(), query.longitude, query.latitude) {
        Ok(info) => HttpResponse::Ok().json(BranchDetailView::from(&info)),
        Err(e) => engine_error(e),
    }
}
