//! Modelo de VehicleConfig
//!
//! Clases de vehículo interurbano que se pueden reservar (capacidad,
//! tarifa total del viaje y metadatos de presentación).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tipo de vehículo interurbano
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    SharedAuto,
    SharedCar,
    PremiumCar,
    Suv,
    TempoTraveller,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::SharedAuto => "SHARED_AUTO",
            VehicleType::SharedCar => "SHARED_CAR",
            VehicleType::PremiumCar => "PREMIUM_CAR",
            VehicleType::Suv => "SUV",
            VehicleType::TempoTraveller => "TEMPO_TRAVELLER",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHARED_AUTO" => Ok(VehicleType::SharedAuto),
            "SHARED_CAR" => Ok(VehicleType::SharedCar),
            "PREMIUM_CAR" => Ok(VehicleType::PremiumCar),
            "SUV" => Ok(VehicleType::Suv),
            "TEMPO_TRAVELLER" => Ok(VehicleType::TempoTraveller),
            other => Err(format!("unknown vehicle type '{}'", other)),
        }
    }
}

/// Configuración de una clase de vehículo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleConfig {
    pub id: Uuid,
    pub vehicle_type: VehicleType,
    pub display_name: String,
    pub total_price: Decimal,
    pub min_seats: i32,
    pub max_seats: i32,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
