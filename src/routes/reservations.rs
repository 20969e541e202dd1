use actix_web::{web, HttpResponse, Responder};
use chrono::Local;
use validator::Validate;

use crate::models::{BookReservationRequest, BookReservationResponse, NotifyRequest, SlotsQuery};
use crate::routes::{engine_error, validation_error, AppState};

/// Configure reservation and digital queue routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/reservations", web::post().to(book_reservation))
        .route("/reservations/{id}/notify", web::post().to(register_notification))
        .route("/branches/{id}/queue", web::get().to(digital_queue))
        .route("/branches/{id}/days", web::get().to(reservation_days))
        .route("/branches/{id}/slots", web::get().to(time_slots));
}

/// Book a reservation and put it in the office's digital queue
///
/// POST /api/v1/reservations
///
/// The slot must be a free slot start in the booking window; a taken slot
/// answers 409.
///
/// Request body:
/// ```json
/// {
///   "officeId": 12,
///   "date": "2024-05-01",
///   "time": "10:30:00",
///   "serviceId": 4
/// }
/// ```
async fn book_reservation(
    state: web::Data<AppState>,
    req: web::Json<BookReservationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state
        .queue
        .book(req.office_id, req.date, req.time, req.service_id, Local::now().naive_local())
        .await
    {
        Ok((reservation, queue_position)) => HttpResponse::Created().json(BookReservationResponse {
            reservation_id: reservation.id,
            queue_position,
        }),
        Err(e) => engine_error(e),
    }
}

/// Register a phone number for the reservation's reminder
///
/// POST /api/v1/reservations/{id}/notify
///
/// Request body:
/// ```json
/// { "phoneNumber": "+79990000000" }
/// ```
async fn register_notification(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<NotifyRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let reservation_id = path.into_inner();
    match state.queue.register_notification(reservation_id, &req.phone_number).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "reservationId": reservation_id,
            "registered": true,
        })),
        Err(e) => engine_error(e),
    }
}

/// Reservations persisted for an office
///
/// GET /api/v1/branches/{id}/queue
async fn digital_queue(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    match state.queue.list_queue(path.into_inner()).await {
        Ok(reservations) => HttpResponse::Ok().json(reservations),
        Err(e) => engine_error(e),
    }
}

/// Days on which the office still has a free slot
///
/// GET /api/v1/branches/{id}/days
async fn reservation_days(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    match state
        .queue
        .reservation_days(path.into_inner(), Local::now().naive_local())
        .await
    {
        Ok(days) => HttpResponse::Ok().json(days),
        Err(e) => engine_error(e),
    }
}

/// Free slot start times at the office on one day
///
/// GET /api/v1/branches/{id}/slots?date={yyyy-mm-dd}
async fn time_slots(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<SlotsQuery>,
) -> impl Responder {
    match state
        .queue
        .time_slots(path.into_inner(), query.date, Local::now().naive_local())
        .await
    {
        Ok(slots) => HttpResponse::Ok().json(slots),
        Err(e) => engine_error(e),
    }
}
