use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::route::{GeoPoint, Route};
use crate::models::vehicle_config::VehicleType;

// Request para crear una configuración de vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleConfigRequest {
    pub vehicle_type: VehicleType,
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
    pub total_price: Decimal,
    #[validate(range(min = 1, max = 60))]
    pub min_seats: i32,
    #[validate(range(min = 1, max = 60))]
    pub max_seats: i32,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

// Request para actualizar una configuración de vehículo
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleConfigRequest {
    pub vehicle_type: Option<VehicleType>,
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    pub total_price: Option<Decimal>,
    #[validate(range(min = 1, max = 60))]
    pub min_seats: Option<i32>,
    #[validate(range(min = 1, max = 60))]
    pub max_seats: Option<i32>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

// ?include_inactive=true en los listados de catálogo
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CatalogFilter {
    #[serde(default)]
    pub include_inactive: bool,
}

// Request para crear una ruta
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRouteRequest {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub distance_km: f64,
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
    pub price_multiplier: Option<Decimal>,
    pub is_bidirectional: Option<bool>,
    pub is_active: Option<bool>,
}

// Request para actualizar una ruta
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRouteRequest {
    pub origin: Option<GeoPoint>,
    pub destination: Option<GeoPoint>,
    pub distance_km: Option<f64>,
    #[validate(range(min = 1))]
    pub duration_minutes: Option<i32>,
    pub price_multiplier: Option<Decimal>,
    pub is_bidirectional: Option<bool>,
    pub is_active: Option<bool>,
}

// ?origin=&destination=
#[derive(Debug, Deserialize, Validate)]
pub struct RouteLookupQuery {
    #[validate(length(min = 1))]
    pub origin: String,
    #[validate(length(min = 1))]
    pub destination: String,
}

// Resultado de la búsqueda de ruta, con el sentido del viaje
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteMatch {
    pub route: Route,
    pub reverse: bool,
}

// Request para actualizar la configuración de tarifas
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePricingConfigRequest {
    pub commission_percent: Option<Decimal>,
    pub platform_fee_percent: Option<Decimal>,
    pub gst_percent: Option<Decimal>,
    pub min_commission_amount: Option<Decimal>,
    pub max_commission_amount: Option<Decimal>,
    pub commission_enabled: Option<bool>,
    pub night_fare_enabled: Option<bool>,
    pub night_fare_multiplier: Option<Decimal>,
    #[validate(range(max = 23))]
    pub night_start_hour: Option<u32>,
    #[validate(range(max = 23))]
    pub night_end_hour: Option<u32>,
    pub utc_offset_minutes: Option<i32>,
}
