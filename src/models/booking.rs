//! Modelo de Booking
//!
//! Reserva de uno o varios asientos de un viaje por parte de un pasajero o grupo.
//! La reserva solo referencia al viaje; la capacidad vive en `Trip`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Estado de la reserva
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Hold,
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Refunded,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Hold,
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Hold => "HOLD",
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Refunded => "REFUNDED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Refunded
        )
    }

    /// Reservas cuyos asientos cuentan en `Trip::booked_seats`
    pub fn holds_seats(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::Refunded)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown booking status '{}'", s))
    }
}

/// Estado del pago asociado a la reserva
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Initiated,
    Paid,
    RefundPending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Initiated => "INITIATED",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::RefundPending => "REFUND_PENDING",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(PaymentStatus::Unpaid),
            "INITIATED" => Ok(PaymentStatus::Initiated),
            "PAID" => Ok(PaymentStatus::Paid),
            "REFUND_PENDING" => Ok(PaymentStatus::RefundPending),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

/// Reserva de asientos
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub booking_code: Option<String>,
    pub seat_count: i32,
    pub price_per_seat: Decimal,
    pub total_amount: Decimal,
    pub commission_amount: Decimal,
    pub platform_fee_amount: Decimal,
    pub gst_amount: Decimal,
    pub payable_amount: Decimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub pickup_point: Option<String>,
    pub drop_point: Option<String>,
    pub otp: Option<String>,
    pub otp_verified_at: Option<DateTime<Utc>>,
    pub passengers_onboarded: i32,
    pub hold_expires_at: Option<DateTime<Utc>>,
    pub refund_amount: Option<Decimal>,
    pub cancellation_reason: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Una reserva HOLD cuya ventana de pago ya pasó
    pub fn hold_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Hold
            && self.hold_expires_at.map(|at| at <= now).unwrap_or(false)
    }

    pub fn remaining_to_board(&self) -> i32 {
        self.seat_count - self.passengers_onboarded
    }
}
