//! Rutas de operación: conductores, auto-despacho y panel

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::dto::driver_dto::{CreateDriverRequest, UpdateAvailabilityRequest};
use crate::dto::{ApiResponse, Page, Pagination};
use crate::models::driver::Driver;
use crate::services::dashboard_service::DashboardStats;
use crate::services::dispatch_coordinator::AutoDispatchReport;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_drivers).post(register_driver))
        .route("/:id/availability", put(update_availability))
}

pub fn create_dispatch_router() -> Router<AppState> {
    Router::new().route("/auto", post(auto_dispatch))
}

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

async fn register_driver(
    State(state): State<AppState>,
    Json(request): Json<CreateDriverRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Driver>>), AppError> {
    let driver = state.drivers.register(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success_with_message(driver, "Driver registered".to_string()))))
}

async fn list_drivers(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<Driver>>, AppError> {
    let (items, total) = state.drivers.list(pagination.window()).await?;
    Ok(Json(Page::new(items, pagination, total)))
}

async fn update_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<ApiResponse<Driver>>, AppError> {
    let driver = state.drivers.update_availability(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(driver, "Driver availability updated".to_string())))
}

async fn auto_dispatch(State(state): State<AppState>) -> Result<Json<ApiResponse<AutoDispatchReport>>, AppError> {
    let report = state.dispatch.auto_dispatch().await?;
    let message = format!(
        "{} trip(s) dispatched, {} pending manual follow-up",
        report.dispatched.len(),
        report.pending.len()
    );
    Ok(Json(ApiResponse::success_with_message(report, message)))
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.dashboard.stats().await?))
}
