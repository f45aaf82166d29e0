//! Gestión de reservas
//!
//! HOLD → PENDING → CONFIRMED → COMPLETED, con CANCELLED/REFUNDED como salidas.
//! Toda operación se aplica bajo el candado del viaje de la reserva, de modo que
//! el contador de asientos y la reserva cambian juntos.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::dto::trip_dto::{BoardRequest, ConfirmBookingRequest, CreateBookingRequest, InitiatePaymentRequest};
use crate::models::booking::Booking;
use crate::repositories::{BookingFilter, PageWindow};
use crate::services::pricing_engine::RefundPolicy;
use crate::services::trip_ledgers::TripLedgers;
use crate::utils::clock::Clock;
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct BookingManager {
    ledgers: Arc<TripLedgers>,
    refund_policy: RefundPolicy,
    hold_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl BookingManager {
    pub fn new(
        ledgers: Arc<TripLedgers>,
        refund_policy: RefundPolicy,
        hold_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { ledgers, refund_policy, hold_ttl, clock }
    }

    pub fn refund_policy(&self) -> &RefundPolicy {
        &self.refund_policy
    }

    async fn trip_of(&self, booking_id: Uuid) -> AppResult<Uuid> {
        self.ledgers
            .repository()
            .find_booking(booking_id)
            .await?
            .map(|b| b.trip_id)
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))
    }

    /// Retener asientos (HOLD) al precio por cabeza vigente
    pub async fn create_booking(&self, trip_id: Uuid, request: CreateBookingRequest) -> AppResult<Booking> {
        request.validate()?;
        let now = self.clock.now();
        let hold_ttl = self.hold_ttl;

        let (booking_id, ledger) = self
            .ledgers
            .mutate(trip_id, |l| l.place_hold(request.into(), hold_ttl, now))
            .await?;

        let booking = ledger.booking(booking_id)?.clone();
        log::info!(
            "🎫 Reserva {} en espera: {} plaza(s) en el viaje {} a {} por plaza (ocupación {}/{})",
            booking.id,
            booking.seat_count,
            trip_id,
            booking.price_per_seat,
            ledger.trip.booked_seats,
            ledger.trip.total_seats
        );
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.ledgers
            .repository()
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))
    }

    pub async fn list_bookings(&self, filter: &BookingFilter, window: PageWindow) -> AppResult<(Vec<Booking>, i64)> {
        self.ledgers.repository().list_bookings(filter, window).await
    }

    /// HOLD → PENDING
    pub async fn initiate_payment(&self, booking_id: Uuid, request: InitiatePaymentRequest) -> AppResult<Booking> {
        request.validate()?;
        let trip_id = self.trip_of(booking_id).await?;
        let now = self.clock.now();

        let ((), ledger) = self
            .ledgers
            .mutate(trip_id, |l| l.initiate_payment(booking_id, request.payment_reference, now))
            .await?;

        log::info!("💳 Pago iniciado para la reserva {}", booking_id);
        Ok(ledger.booking(booking_id)?.clone())
    }

    /// HOLD|PENDING → CONFIRMED. Una retención vencida se expira antes de rechazar.
    pub async fn confirm_booking(&self, booking_id: Uuid, request: ConfirmBookingRequest) -> AppResult<Booking> {
        request.validate()?;
        let trip_id = self.trip_of(booking_id).await?;
        let now = self.clock.now();

        let mut lease = self.ledgers.lock(trip_id).await?;
        if lease.ledger().booking(booking_id)?.hold_expired(now) {
            let expired = lease.ledger_mut().expire_holds(now)?;
            lease.commit().await?;
            log::warn!(
                "⚠️ Reserva {} no confirmada: la retención expiró ({} retenciones liberadas)",
                booking_id,
                expired.len()
            );
            return Err(AppError::InvalidStateTransition(format!(
                "Hold on booking {} expired before payment was confirmed",
                booking_id
            )));
        }

        lease.ledger_mut().confirm_booking(booking_id, request.payment_reference, now)?;
        let ledger = lease.commit().await?;
        let booking = ledger.booking(booking_id)?.clone();

        log::info!(
            "✅ Reserva {} confirmada ({}): {} a pagar",
            booking.id,
            booking.booking_code.as_deref().unwrap_or("-"),
            booking.payable_amount
        );
        Ok(booking)
    }

    /// Cancelación por el pasajero; el reembolso depende de la antelación
    pub async fn cancel_booking(&self, booking_id: Uuid, reason: Option<String>) -> AppResult<Booking> {
        let trip_id = self.trip_of(booking_id).await?;
        let now = self.clock.now();
        let policy = &self.refund_policy;

        let (booking, _) = self
            .ledgers
            .mutate(trip_id, |l| l.cancel_booking(booking_id, reason, policy, now).cloned())
            .await?;

        log::info!(
            "↩️ Reserva {} {} (reembolso {})",
            booking.id,
            booking.status,
            booking.refund_amount.unwrap_or_default()
        );
        Ok(booking)
    }

    /// Embarque con OTP
    pub async fn board(&self, booking_id: Uuid, request: BoardRequest) -> AppResult<Booking> {
        request.validate()?;
        let trip_id = self.trip_of(booking_id).await?;
        let now = self.clock.now();

        let (booking, _) = self
            .ledgers
            .mutate(trip_id, |l| l.board(booking_id, &request.otp, request.passengers, now).cloned())
            .await
            .map_err(|e| {
                if matches!(e, AppError::InvalidOtp) {
                    log::warn!("⚠️ OTP incorrecto para la reserva {}", booking_id);
                }
                e
            })?;

        log::info!(
            "🧍 Embarque en la reserva {}: {}/{} pasajeros",
            booking.id,
            booking.passengers_onboarded,
            booking.seat_count
        );
        Ok(booking)
    }

    /// Barrido de retenciones vencidas; devuelve cuántas reservas se cancelaron
    pub async fn expire_holds(&self) -> AppResult<usize> {
        let now = self.clock.now();
        let trip_ids = self.ledgers.repository().trips_with_expired_holds(now).await?;

        let mut released = 0;
        for trip_id in trip_ids {
            let mut lease = match self.ledgers.lock(trip_id).await {
                Ok(lease) => lease,
                Err(e) => {
                    log::error!("❌ No se pudo bloquear el viaje {} para expirar retenciones: {}", trip_id, e);
                    continue;
                }
            };

            let expired = match lease.ledger_mut().expire_holds(now) {
                Ok(expired) if expired.is_empty() => continue,
                Ok(expired) => expired,
                Err(e) => {
                    log::error!("❌ Error expirando retenciones del viaje {}: {}", trip_id, e);
                    continue;
                }
            };

            match lease.commit().await {
                Ok(_) => {
                    log::info!("⏰ {} retención(es) expirada(s) en el viaje {}", expired.len(), trip_id);
                    released += expired.len();
                }
                Err(e) => log::error!("❌ Error guardando el viaje {} tras expirar retenciones: {}", trip_id, e),
            }
        }
        Ok(released)
    }
}
