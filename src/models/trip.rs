//! Modelo de Trip
//!
//! Una salida interurbana programada con inventario de asientos finito.
//! El viaje es el dueño del contador autoritativo de asientos reservados.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::pricing::PricingConfig;
use crate::models::vehicle_config::VehicleType;
use crate::services::pricing_engine;
use crate::utils::errors::{AppError, AppResult};

/// Estado del viaje
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Scheduled,
    Filling,
    Dispatched,
    InTransit,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub const ALL: [TripStatus; 6] = [
        TripStatus::Scheduled,
        TripStatus::Filling,
        TripStatus::Dispatched,
        TripStatus::InTransit,
        TripStatus::Completed,
        TripStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Scheduled => "SCHEDULED",
            TripStatus::Filling => "FILLING",
            TripStatus::Dispatched => "DISPATCHED",
            TripStatus::InTransit => "IN_TRANSIT",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    /// Solo se aceptan reservas y despachos antes de asignar conductor
    pub fn is_open(&self) -> bool {
        matches!(self, TripStatus::Scheduled | TripStatus::Filling)
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TripStatus::ALL
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown trip status '{}'", s))
    }
}

/// Viaje programado
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: Uuid,
    pub vehicle_config_id: Uuid,
    pub vehicle_type: VehicleType,
    pub route_id: Uuid,
    /// Recorre la ruta de destino a origen
    pub reverse: bool,
    pub origin_name: String,
    pub destination_name: String,
    pub status: TripStatus,
    pub scheduled_departure: DateTime<Utc>,
    pub scheduled_arrival: DateTime<Utc>,
    pub actual_departure: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub total_seats: i32,
    pub min_seats: i32,
    pub booked_seats: i32,
    pub total_price: Decimal,
    pub current_per_head_price: Decimal,
    pub price_locked: bool,
    pub pricing: PricingConfig,
    pub driver_id: Option<Uuid>,
    pub dispatch_override: bool,
    pub cancellation_reason: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn available_seats(&self) -> i32 {
        self.total_seats - self.booked_seats
    }

    pub fn meets_min_seats(&self) -> bool {
        self.booked_seats >= self.min_seats
    }

    /// Reservar asientos: valida estado y capacidad, recalcula el precio por cabeza
    pub(crate) fn reserve_seats(&mut self, seats: i32, now: DateTime<Utc>) -> AppResult<()> {
        if !self.status.is_open() {
            return Err(AppError::InvalidStateTransition(format!(
                "Trip {} is {} and no longer accepts bookings",
                self.id, self.status
            )));
        }
        if seats < 1 {
            return Err(AppError::Validation("seat_count must be at least 1".to_string()));
        }
        if seats > self.available_seats() {
            return Err(AppError::CapacityExceeded(format!(
                "Trip {} has {} seat(s) available, {} requested",
                self.id,
                self.available_seats(),
                seats
            )));
        }

        self.booked_seats += seats;
        if self.status == TripStatus::Scheduled {
            self.status = TripStatus::Filling;
        }
        self.reprice(now);
        Ok(())
    }

    /// Liberar asientos; nunca deja el contador por debajo de cero
    pub(crate) fn release_seats(&mut self, seats: i32, now: DateTime<Utc>) -> AppResult<()> {
        if seats < 0 || seats > self.booked_seats {
            return Err(AppError::Internal(format!(
                "Trip {} cannot release {} seat(s), only {} booked",
                self.id, seats, self.booked_seats
            )));
        }

        self.booked_seats -= seats;
        if self.status == TripStatus::Filling && self.booked_seats == 0 {
            self.status = TripStatus::Scheduled;
        }
        self.reprice(now);
        Ok(())
    }

    fn reprice(&mut self, now: DateTime<Utc>) {
        if !self.price_locked {
            self.current_per_head_price =
                pricing_engine::per_head_price(self.total_price, self.booked_seats);
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::Duration;

    /// Viaje de 4 plazas a 400 con mínimo de 2 plazas
    pub fn trip(now: DateTime<Utc>) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            vehicle_config_id: Uuid::new_v4(),
            vehicle_type: VehicleType::SharedCar,
            route_id: Uuid::new_v4(),
            reverse: false,
            origin_name: "Bengaluru".to_string(),
            destination_name: "Mysuru".to_string(),
            status: TripStatus::Scheduled,
            scheduled_departure: now + Duration::hours(48),
            scheduled_arrival: now + Duration::hours(51),
            actual_departure: None,
            actual_arrival: None,
            total_seats: 4,
            min_seats: 2,
            booked_seats: 0,
            total_price: Decimal::new(400, 0),
            current_per_head_price: Decimal::new(400, 0),
            price_locked: false,
            pricing: PricingConfig::default(),
            driver_id: None,
            dispatch_override: false,
            cancellation_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
