use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{BoundingBox, BoundingBoxQuery, BranchType, ErrorResponse};
use crate::routes::{validation_error, AppState};

/// Configure map viewport routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/maps/offices", web::get().to(offices_for_map))
        .route("/maps/atms", web::get().to(atms_for_map));
}

/// GET /api/v1/maps/offices?longitude_min=..&latitude_min=..&longitude_max=..&latitude_max=..
async fn offices_for_map(
    state: web::Data<AppState>,
    query: web::Query<BoundingBoxQuery>,
) -> impl Responder {
    markers_for_map(&state, BranchType::Office, &query).await
}

/// GET /api/v1/maps/atms?longitude_min=..&latitude_min=..&longitude_max=..&latitude_max=..
async fn atms_for_map(
    state: web::Data<AppState>,
    query: web::Query<BoundingBoxQuery>,
) -> impl Responder {
    markers_for_map(&state, BranchType::Atm, &query).await
}

async fn markers_for_map(
    state: &AppState,
    branch_type: BranchType,
    query: &BoundingBoxQuery,
) -> HttpResponse {
    if let Err(errors) = query.validate() {
        return validation_error(errors);
    }

    let bbox = BoundingBox {
        min_lat: query.latitude_min,
        max_lat: query.latitude_max,
        min_lon: query.longitude_min,
        max_lon: query.longitude_max,
    };

    match state
        .map_cache
        .markers_in(state.store.as_ref(), branch_type, &bbox)
        .await
    {
        Ok(markers) => HttpResponse::Ok().json(markers.as_slice()),
        Err(e) => {
            tracing::error!("Failed to fetch {} markers: {}", branch_type, e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "Store unavailable".to_string(),
                message: e.to_string(),
                status_code: 503,
            })
        }
    }
}
