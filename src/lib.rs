//! Intercity Rides
//!
//! Núcleo de viajes interurbanos compartidos: catálogo de vehículos y rutas,
//! motor de tarifas, programación de viajes con asientos, reservas con OTP
//! de embarque y despacho de conductores.

pub mod config;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::Router;
use tower_http::compression::CompressionLayer;

use crate::middleware::{cors::cors_for, trace::trace_layer};
use crate::state::AppState;

/// Router completo de la aplicación con sus capas
pub fn build_app(state: AppState) -> Router {
    let cors = cors_for(&state.config);
    routes::create_api_router()
        .layer(CompressionLayer::new())
        .layer(trace_layer())
        .layer(cors)
        .with_state(state)
}
