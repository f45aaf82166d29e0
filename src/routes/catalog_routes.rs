//! Rutas del catálogo: configuraciones de vehículo, rutas y tarifas

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::dto::catalog_dto::{
    CatalogFilter, CreateRouteRequest, CreateVehicleConfigRequest, RouteLookupQuery, RouteMatch,
    UpdatePricingConfigRequest, UpdateRouteRequest, UpdateVehicleConfigRequest,
};
use crate::dto::{ApiResponse, Page, Pagination};
use crate::models::pricing::PricingConfig;
use crate::models::route::Route;
use crate::models::vehicle_config::VehicleConfig;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_config_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicle_configs).post(create_vehicle_config))
        .route(
            "/:id",
            get(get_vehicle_config).put(update_vehicle_config).delete(delete_vehicle_config),
        )
}

pub fn create_route_catalog_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routes).post(create_route))
        .route("/lookup", get(lookup_route))
        .route("/:id", get(get_route).put(update_route).delete(delete_route))
}

pub fn create_pricing_config_router() -> Router<AppState> {
    Router::new().route("/", get(get_pricing_config).put(update_pricing_config))
}

// ---------------------------------------------------------------------------
// Configuraciones de vehículo
// ---------------------------------------------------------------------------

async fn create_vehicle_config(
    State(state): State<AppState>,
    Json(request): Json<CreateVehicleConfigRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VehicleConfig>>), AppError> {
    let config = state.vehicle_configs.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(config, "Vehicle config created".to_string())),
    ))
}

async fn list_vehicle_configs(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<CatalogFilter>,
) -> Result<Json<Page<VehicleConfig>>, AppError> {
    let (items, total) = state.vehicle_configs.list(filter.include_inactive, pagination.window()).await?;
    Ok(Json(Page::new(items, pagination, total)))
}

async fn get_vehicle_config(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleConfig>, AppError> {
    Ok(Json(state.vehicle_configs.get(id).await?))
}

async fn update_vehicle_config(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleConfigRequest>,
) -> Result<Json<ApiResponse<VehicleConfig>>, AppError> {
    let config = state.vehicle_configs.update(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(config, "Vehicle config updated".to_string())))
}

async fn delete_vehicle_config(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VehicleConfig>>, AppError> {
    let config = state.vehicle_configs.deactivate(id).await?;
    Ok(Json(ApiResponse::success_with_message(config, "Vehicle config deactivated".to_string())))
}

// ---------------------------------------------------------------------------
// Rutas
// ---------------------------------------------------------------------------

async fn create_route(
    State(state): State<AppState>,
    Json(request): Json<CreateRouteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Route>>), AppError> {
    let route = state.routes.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success_with_message(route, "Route created".to_string()))))
}

async fn list_routes(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<CatalogFilter>,
) -> Result<Json<Page<Route>>, AppError> {
    let (items, total) = state.routes.list(filter.include_inactive, pagination.window()).await?;
    Ok(Json(Page::new(items, pagination, total)))
}

async fn lookup_route(
    State(state): State<AppState>,
    Query(query): Query<RouteLookupQuery>,
) -> Result<Json<RouteMatch>, AppError> {
    Ok(Json(state.routes.lookup(query).await?))
}

async fn get_route(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Route>, AppError> {
    Ok(Json(state.routes.get(id).await?))
}

async fn update_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRouteRequest>,
) -> Result<Json<ApiResponse<Route>>, AppError> {
    let route = state.routes.update(id, request).await?;
    Ok(Json(ApiResponse::success_with_message(route, "Route updated".to_string())))
}

async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Route>>, AppError> {
    let route = state.routes.deactivate(id).await?;
    Ok(Json(ApiResponse::success_with_message(route, "Route deactivated".to_string())))
}

// ---------------------------------------------------------------------------
// Tarifas
// ---------------------------------------------------------------------------

async fn get_pricing_config(State(state): State<AppState>) -> Result<Json<PricingConfig>, AppError> {
    Ok(Json(state.pricing.current().await?))
}

async fn update_pricing_config(
    State(state): State<AppState>,
    Json(request): Json<UpdatePricingConfigRequest>,
) -> Result<Json<ApiResponse<PricingConfig>>, AppError> {
    let config = state.pricing.update(request).await?;
    Ok(Json(ApiResponse::success_with_message(config, "Pricing config updated".to_string())))
}
