use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::Booking;
use crate::models::trip::Trip;
use crate::models::trip_ledger::{CascadeSummary, HoldRequest};

// Request para programar un viaje
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTripRequest {
    pub vehicle_config_id: Uuid,
    pub route_id: Uuid,
    /// Recorrer la ruta en sentido inverso (solo rutas bidireccionales)
    #[serde(default)]
    pub reverse: bool,
    pub scheduled_departure: DateTime<Utc>,
    #[validate(range(min = 1, max = 60))]
    pub total_seats: Option<i32>,
}

// ?status=FILLING
#[derive(Debug, Default, Deserialize)]
pub struct TripFilter {
    pub status: Option<String>,
}

// Request de despacho (también usado por assign-driver)
#[derive(Debug, Default, Deserialize)]
pub struct DispatchRequest {
    pub driver_id: Option<Uuid>,
    #[serde(default, alias = "override")]
    pub override_min_seats: bool,
}

// Motivo opcional de cancelación
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

// Viaje con asientos libres calculados
#[derive(Debug, Serialize, Deserialize)]
pub struct TripResponse {
    #[serde(flatten)]
    pub trip: Trip,
    pub available_seats: i32,
}

impl From<Trip> for TripResponse {
    fn from(trip: Trip) -> Self {
        Self {
            available_seats: trip.available_seats(),
            trip,
        }
    }
}

// Resultado de cancelar un viaje
#[derive(Debug, Serialize, Deserialize)]
pub struct TripCancellationResponse {
    pub trip: TripResponse,
    pub cancelled_bookings: Vec<Uuid>,
    pub refunded_bookings: Vec<Uuid>,
    pub refund_total: rust_decimal::Decimal,
}

impl TripCancellationResponse {
    pub fn new(trip: Trip, summary: CascadeSummary) -> Self {
        Self {
            trip: trip.into(),
            cancelled_bookings: summary.cancelled_bookings,
            refunded_bookings: summary.refunded_bookings,
            refund_total: summary.refund_total,
        }
    }
}

// Resultado de la salida: reservas impagadas canceladas
#[derive(Debug, Serialize, Deserialize)]
pub struct TripDepartureResponse {
    pub trip: TripResponse,
    pub cancelled_bookings: Vec<Uuid>,
}

// Request de reserva (HOLD)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub user_id: Uuid,
    #[validate(range(min = 1, max = 60))]
    pub seat_count: i32,
    #[validate(length(max = 200))]
    pub pickup_point: Option<String>,
    #[validate(length(max = 200))]
    pub drop_point: Option<String>,
}

impl From<CreateBookingRequest> for HoldRequest {
    fn from(request: CreateBookingRequest) -> Self {
        Self {
            user_id: request.user_id,
            seat_count: request.seat_count,
            pickup_point: request.pickup_point,
            drop_point: request.drop_point,
        }
    }
}

// ?status=&trip_id=
#[derive(Debug, Default, Deserialize)]
pub struct BookingListFilter {
    pub status: Option<String>,
    pub trip_id: Option<Uuid>,
}

// Request para iniciar el pago
#[derive(Debug, Deserialize, Validate)]
pub struct InitiatePaymentRequest {
    #[validate(length(min = 1, max = 100))]
    pub payment_reference: String,
}

// Request de confirmación (pago capturado)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ConfirmBookingRequest {
    #[validate(length(min = 1, max = 100))]
    pub payment_reference: Option<String>,
}

// Request de embarque
#[derive(Debug, Deserialize, Validate)]
pub struct BoardRequest {
    #[validate(length(min = 1, max = 10))]
    pub otp: String,
    #[validate(range(min = 1))]
    pub passengers: Option<i32>,
}

// Reserva tal como la ve el cliente
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    pub booking: Booking,
    pub hold_active: bool,
}

impl BookingResponse {
    pub fn new(booking: Booking, now: DateTime<Utc>) -> Self {
        Self {
            hold_active: booking.hold_expires_at.is_some() && !booking.hold_expired(now),
            booking,
        }
    }
}
