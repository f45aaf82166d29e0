//! Rutas de viajes: programación, despacho y ciclo de vida

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::trip_dto::{
    BookingResponse, CancelRequest, CreateBookingRequest, CreateTripRequest, DispatchRequest,
    TripCancellationResponse, TripDepartureResponse, TripFilter, TripResponse,
};
use crate::dto::{ApiResponse, Page, Pagination};
use crate::models::trip::TripStatus;
use crate::repositories::BookingFilter;
use crate::routes::{parse_status, OptionalJson};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(create_trip))
        .route("/:id", get(get_trip))
        .route("/:id/dispatch", post(dispatch_trip))
        .route("/:id/cancel", post(cancel_trip))
        .route("/:id/depart", post(depart_trip))
        .route("/:id/arrive", post(arrive_trip))
        .route("/:id/bookings", get(list_trip_bookings).post(create_booking))
}

async fn create_trip(
    State(state): State<AppState>,
    Json(request): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TripResponse>>), AppError> {
    let trip = state.trips.create_trip(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(trip.into(), "Trip scheduled".to_string())),
    ))
}

async fn list_trips(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<TripFilter>,
) -> Result<Json<Page<TripResponse>>, AppError> {
    let status = parse_status::<TripStatus>("status", filter.status)?;
    let (items, total) = state.trips.list_trips(status, pagination.window()).await?;
    Ok(Json(Page::new(items, pagination, total).map(TripResponse::from)))
}

async fn get_trip(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<TripResponse>, AppError> {
    Ok(Json(state.trips.get_trip(id).await?.into()))
}

async fn dispatch_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<DispatchRequest>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let trip = state.dispatch.assign_driver(id, request.driver_id, request.override_min_seats).await?;
    Ok(Json(ApiResponse::success_with_message(trip.into(), "Trip dispatched".to_string())))
}

async fn cancel_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<CancelRequest>,
) -> Result<Json<ApiResponse<TripCancellationResponse>>, AppError> {
    request.validate()?;
    let (trip, summary) = state.trips.cancel_trip(id, request.reason).await?;
    Ok(Json(ApiResponse::success_with_message(
        TripCancellationResponse::new(trip, summary),
        "Trip cancelled".to_string(),
    )))
}

async fn depart_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripDepartureResponse>>, AppError> {
    let (trip, cancelled_bookings) = state.trips.depart(id).await?;
    Ok(Json(ApiResponse::success_with_message(
        TripDepartureResponse { trip: trip.into(), cancelled_bookings },
        "Trip departed".to_string(),
    )))
}

async fn arrive_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let trip = state.trips.arrive(id).await?;
    Ok(Json(ApiResponse::success_with_message(trip.into(), "Trip completed".to_string())))
}

async fn create_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingResponse>>), AppError> {
    let booking = state.bookings.create_booking(id, request).await?;
    let now = state.clock.now();
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            BookingResponse::new(booking, now),
            "Seats held pending payment".to_string(),
        )),
    ))
}

async fn list_trip_bookings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<BookingResponse>>, AppError> {
    // 404 para viajes inexistentes en lugar de una lista vacía
    state.trips.get_trip(id).await?;
    let filter = BookingFilter { status: None, trip_id: Some(id) };
    let (items, total) = state.bookings.list_bookings(&filter, pagination.window()).await?;
    let now = state.clock.now();
    Ok(Json(Page::new(items, pagination, total).map(|b| BookingResponse::new(b, now))))
}
