//! Routers de la API
//!
//! Un router por recurso, anidados bajo `/api`.

pub mod booking_routes;
pub mod catalog_routes;
pub mod operations_routes;
pub mod trip_routes;

use std::str::FromStr;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub fn create_api_router() -> Router<AppState> {
    let api = Router::new()
        .nest("/vehicle-configs", catalog_routes::create_vehicle_config_router())
        .nest("/routes", catalog_routes::create_route_catalog_router())
        .nest("/pricing-config", catalog_routes::create_pricing_config_router())
        .nest("/trips", trip_routes::create_trip_router())
        .nest("/bookings", booking_routes::create_booking_router())
        .nest("/drivers", operations_routes::create_driver_router())
        .nest("/dispatch", operations_routes::create_dispatch_router())
        .nest("/dashboard", operations_routes::create_dashboard_router())
        .route("/health", get(health));

    Router::new().nest("/api", api)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Filtro de estado opcional en query string (`?status=FILLING`)
pub(crate) fn parse_status<T: FromStr<Err = String>>(field: &str, value: Option<String>) -> AppResult<Option<T>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().parse::<T>().map_err(|e| AppError::Validation(format!("{}: {}", field, e))))
        .transpose()
}

/// Cuerpo JSON opcional: un cuerpo vacío toma los valores por defecto,
/// un cuerpo presente pero inválido es un error de validación.
pub(crate) struct OptionalJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))
    }
}
