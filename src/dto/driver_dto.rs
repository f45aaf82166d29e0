use serde::Deserialize;
use validator::Validate;

use crate::utils::validation::{validate_phone, validate_vehicle_number};

// Request para registrar un conductor
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(custom = "validate_vehicle_number")]
    pub vehicle_number: String,
    pub current_lat: Option<f64>,
    pub current_lng: Option<f64>,
}

// Request para cambiar la disponibilidad (y opcionalmente la posición)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAvailabilityRequest {
    pub is_available: bool,
    pub current_lat: Option<f64>,
    pub current_lng: Option<f64>,
}
