//! Modelo de Driver
//!
//! Vista mínima del conductor que necesita el despacho: disponibilidad,
//! última posición conocida y viaje asignado.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Conductor - mapea exactamente a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub vehicle_number: String,
    pub is_available: bool,
    pub current_lat: Option<f64>,
    pub current_lng: Option<f64>,
    pub current_trip_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    /// Libre para un nuevo viaje
    pub fn can_take_trip(&self) -> bool {
        self.is_available && self.current_trip_id.is_none()
    }
}
