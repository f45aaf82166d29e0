//! Modelo de Route
//!
//! Par origen/destino del catálogo interurbano con distancia, duración
//! y multiplicador de precio.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Punto geográfico con nombre
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Ruta principal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub distance_km: f64,
    pub duration_minutes: i32,
    pub price_multiplier: Decimal,
    pub is_bidirectional: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Route {
    /// Extremos (salida, llegada) según el sentido del viaje
    pub fn endpoints(&self, reverse: bool) -> (&GeoPoint, &GeoPoint) {
        if reverse {
            (&self.destination, &self.origin)
        } else {
            (&self.origin, &self.destination)
        }
    }

    /// ¿La ruta cubre el viaje origen → destino? Devuelve `Some(reverse)` si sí.
    pub fn matches(&self, origin: &str, destination: &str) -> Option<bool> {
        let same = |a: &str, b: &str| a.trim().eq_ignore_ascii_case(b.trim());
        if same(&self.origin.name, origin) && same(&self.destination.name, destination) {
            Some(false)
        } else if self.is_bidirectional
            && same(&self.destination.name, origin)
            && same(&self.origin.name, destination)
        {
            Some(true)
        } else {
            None
        }
    }
}
