//! Rutas de reservas: pago, confirmación, cancelación y embarque

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::trip_dto::{
    BoardRequest, BookingListFilter, BookingResponse, CancelRequest, ConfirmBookingRequest, DispatchRequest,
    InitiatePaymentRequest, TripResponse,
};
use crate::dto::{ApiResponse, Page, Pagination};
use crate::models::booking::{Booking, BookingStatus};
use crate::repositories::BookingFilter;
use crate::routes::{parse_status, OptionalJson};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings))
        .route("/:id", get(get_booking))
        .route("/:id/payment", post(initiate_payment))
        .route("/:id/confirm", post(confirm_booking))
        .route("/:id/cancel", post(cancel_booking))
        .route("/:id/board", post(board_booking))
        .route("/:id/assign-driver", post(assign_driver))
}

fn respond(state: &AppState, booking: Booking, message: &str) -> Json<ApiResponse<BookingResponse>> {
    Json(ApiResponse::success_with_message(
        BookingResponse::new(booking, state.clock.now()),
        message.to_string(),
    ))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<BookingListFilter>,
) -> Result<Json<Page<BookingResponse>>, AppError> {
    let filter = BookingFilter {
        status: parse_status::<BookingStatus>("status", filter.status)?,
        trip_id: filter.trip_id,
    };
    let (items, total) = state.bookings.list_bookings(&filter, pagination.window()).await?;
    let now = state.clock.now();
    Ok(Json(Page::new(items, pagination, total).map(|b| BookingResponse::new(b, now))))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.bookings.get_booking(id).await?;
    Ok(Json(BookingResponse::new(booking, state.clock.now())))
}

async fn initiate_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<InitiatePaymentRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let booking = state.bookings.initiate_payment(id, request).await?;
    Ok(respond(&state, booking, "Payment initiated"))
}

async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<ConfirmBookingRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let booking = state.bookings.confirm_booking(id, request).await?;
    Ok(respond(&state, booking, "Booking confirmed"))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<CancelRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    request.validate()?;
    let booking = state.bookings.cancel_booking(id, request.reason).await?;
    Ok(respond(&state, booking, "Booking cancelled"))
}

async fn board_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<BoardRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let booking = state.bookings.board(id, request).await?;
    Ok(respond(&state, booking, "Passengers boarded"))
}

async fn assign_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<DispatchRequest>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let trip = state
        .dispatch
        .assign_driver_for_booking(id, request.driver_id, request.override_min_seats)
        .await?;
    Ok(Json(ApiResponse::success_with_message(trip.into(), "Trip dispatched".to_string())))
}
