//! Agregado viaje + reservas
//!
//! Un viaje y todas sus reservas se cargan, se modifican y se persisten como una
//! unidad. Todas las transiciones de estado de viajes y reservas viven aquí como
//! funciones síncronas sobre el agregado; los servicios se encargan de bloquear,
//! cargar y guardar.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::models::trip::{Trip, TripStatus};
use crate::services::pricing_engine::{self, RefundPolicy};
use crate::utils::codes;
use crate::utils::errors::{not_found_error, transition_error, AppError, AppResult};

/// Datos necesarios para reservar asientos
#[derive(Debug, Clone)]
pub struct HoldRequest {
    pub user_id: Uuid,
    pub seat_count: i32,
    pub pickup_point: Option<String>,
    pub drop_point: Option<String>,
}

/// Resultado de cancelar un viaje en cascada
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CascadeSummary {
    pub cancelled_bookings: Vec<Uuid>,
    pub refunded_bookings: Vec<Uuid>,
    pub refund_total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripLedger {
    pub trip: Trip,
    pub bookings: Vec<Booking>,
}

impl TripLedger {
    pub fn new(trip: Trip) -> Self {
        Self { trip, bookings: Vec::new() }
    }

    pub fn booking(&self, booking_id: Uuid) -> AppResult<&Booking> {
        self.bookings
            .iter()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))
    }

    fn booking_index(&self, booking_id: Uuid) -> AppResult<usize> {
        self.bookings
            .iter()
            .position(|b| b.id == booking_id)
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))
    }

    /// Asientos retenidos según las reservas; debe coincidir con `trip.booked_seats`
    pub fn seats_held_by_bookings(&self) -> i32 {
        self.bookings
            .iter()
            .filter(|b| b.status.holds_seats())
            .map(|b| b.seat_count)
            .sum()
    }

    pub fn is_consistent(&self) -> bool {
        let trip = &self.trip;
        trip.booked_seats >= 0
            && trip.booked_seats <= trip.total_seats
            && trip.booked_seats == self.seats_held_by_bookings()
    }

    // ---------------------------------------------------------------------
    // Reservas
    // ---------------------------------------------------------------------

    /// Retener asientos (HOLD) a la espera del pago
    pub fn place_hold(&mut self, request: HoldRequest, hold_ttl: Duration, now: DateTime<Utc>) -> AppResult<Uuid> {
        if request.seat_count < 1 {
            return Err(AppError::Validation("seat_count must be at least 1".to_string()));
        }
        self.trip.reserve_seats(request.seat_count, now)?;

        let fare = pricing_engine::fare_breakdown(
            self.trip.current_per_head_price,
            request.seat_count,
            &self.trip.pricing,
        );

        let booking = Booking {
            id: Uuid::new_v4(),
            trip_id: self.trip.id,
            user_id: request.user_id,
            booking_code: None,
            seat_count: request.seat_count,
            price_per_seat: fare.price_per_seat,
            total_amount: fare.total_amount,
            commission_amount: fare.commission_amount,
            platform_fee_amount: fare.platform_fee_amount,
            gst_amount: fare.gst_amount,
            payable_amount: fare.payable_amount,
            status: BookingStatus::Hold,
            payment_status: PaymentStatus::Unpaid,
            payment_reference: None,
            pickup_point: request.pickup_point,
            drop_point: request.drop_point,
            otp: None,
            otp_verified_at: None,
            passengers_onboarded: 0,
            hold_expires_at: Some(now + hold_ttl),
            refund_amount: None,
            cancellation_reason: None,
            confirmed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };
        let id = booking.id;
        self.bookings.push(booking);
        Ok(id)
    }

    fn ensure_hold_alive(booking: &Booking, now: DateTime<Utc>) -> AppResult<()> {
        if booking.hold_expired(now) {
            return Err(AppError::InvalidStateTransition(format!(
                "Hold on booking {} expired at {}",
                booking.id,
                booking.hold_expires_at.map(|t| t.to_rfc3339()).unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// HOLD → PENDING: el pasarela de pago recibió la orden
    pub fn initiate_payment(&mut self, booking_id: Uuid, payment_reference: String, now: DateTime<Utc>) -> AppResult<()> {
        let idx = self.booking_index(booking_id)?;
        let booking = &mut self.bookings[idx];
        if booking.status != BookingStatus::Hold {
            return Err(transition_error("booking", booking.status.as_str(), "initiate payment for"));
        }
        Self::ensure_hold_alive(booking, now)?;

        booking.status = BookingStatus::Pending;
        booking.payment_status = PaymentStatus::Initiated;
        booking.payment_reference = Some(payment_reference);
        booking.updated_at = now;
        Ok(())
    }

    /// HOLD|PENDING → CONFIRMED: pago capturado. El precio por asiento queda
    /// fijado al precio por cabeza vigente en este momento.
    pub fn confirm_booking(
        &mut self,
        booking_id: Uuid,
        payment_reference: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if self.trip.status.is_terminal() || self.trip.status == TripStatus::InTransit {
            return Err(transition_error("booking on a trip", self.trip.status.as_str(), "confirm"));
        }

        let per_head = self.trip.current_per_head_price;
        let idx = self.booking_index(booking_id)?;
        let pricing = self.trip.pricing.clone();
        let booking = &mut self.bookings[idx];

        match booking.status {
            BookingStatus::Hold => Self::ensure_hold_alive(booking, now)?,
            BookingStatus::Pending => {}
            other => return Err(transition_error("booking", other.as_str(), "confirm")),
        }

        let fare = pricing_engine::fare_breakdown(per_head, booking.seat_count, &pricing);
        booking.price_per_seat = fare.price_per_seat;
        booking.total_amount = fare.total_amount;
        booking.commission_amount = fare.commission_amount;
        booking.platform_fee_amount = fare.platform_fee_amount;
        booking.gst_amount = fare.gst_amount;
        booking.payable_amount = fare.payable_amount;

        booking.status = BookingStatus::Confirmed;
        booking.payment_status = PaymentStatus::Paid;
        if payment_reference.is_some() {
            booking.payment_reference = payment_reference;
        }
        booking.booking_code = Some(codes::generate_booking_code());
        booking.otp = Some(codes::generate_otp());
        booking.hold_expires_at = None;
        booking.confirmed_at = Some(now);
        booking.updated_at = now;
        Ok(())
    }

    /// Cancelación por el pasajero o el administrador. HOLD/PENDING → CANCELLED,
    /// CONFIRMED → REFUNDED con el reembolso según la antelación.
    pub fn cancel_booking(
        &mut self,
        booking_id: Uuid,
        reason: Option<String>,
        refund_policy: &RefundPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<&Booking> {
        match self.trip.status {
            TripStatus::Scheduled | TripStatus::Filling | TripStatus::Dispatched => {}
            other => return Err(transition_error("booking on a trip", other.as_str(), "cancel")),
        }

        let idx = self.booking_index(booking_id)?;
        let lead_time = self.trip.scheduled_departure - now;
        let booking = &self.bookings[idx];
        let refund = match booking.status {
            BookingStatus::Hold | BookingStatus::Pending => None,
            BookingStatus::Confirmed => Some(refund_policy.refund_amount(booking.payable_amount, lead_time)),
            other => return Err(transition_error("booking", other.as_str(), "cancel")),
        };

        self.release_booking(idx, reason, refund, now)?;
        Ok(&self.bookings[idx])
    }

    /// Libera los asientos de la reserva y la deja en su estado terminal
    fn release_booking(
        &mut self,
        idx: usize,
        reason: Option<String>,
        refund: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let seats = self.bookings[idx].seat_count;
        self.trip.release_seats(seats, now)?;

        let booking = &mut self.bookings[idx];
        match refund {
            Some(amount) => {
                booking.status = BookingStatus::Refunded;
                booking.payment_status = PaymentStatus::RefundPending;
                booking.refund_amount = Some(amount);
            }
            None => booking.status = BookingStatus::Cancelled,
        }
        booking.cancellation_reason = reason;
        booking.hold_expires_at = None;
        booking.cancelled_at = Some(now);
        booking.updated_at = now;
        Ok(())
    }

    /// Cancela las reservas HOLD cuya ventana expiró; devuelve sus ids
    pub fn expire_holds(&mut self, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        let expired: Vec<usize> = self
            .bookings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.hold_expired(now))
            .map(|(idx, _)| idx)
            .collect();

        let mut released = Vec::with_capacity(expired.len());
        for idx in expired {
            self.release_booking(idx, Some("hold expired".to_string()), None, now)?;
            released.push(self.bookings[idx].id);
        }
        Ok(released)
    }

    /// Embarque con OTP. Un OTP incorrecto no modifica nada.
    pub fn board(
        &mut self,
        booking_id: Uuid,
        otp: &str,
        passengers: Option<i32>,
        now: DateTime<Utc>,
    ) -> AppResult<&Booking> {
        let idx = self.booking_index(booking_id)?;
        let trip_status = self.trip.status;
        let booking = &mut self.bookings[idx];

        if !matches!(booking.status, BookingStatus::Confirmed | BookingStatus::Completed) {
            return Err(transition_error("booking", booking.status.as_str(), "board"));
        }
        if booking.otp.as_deref() != Some(otp.trim()) {
            return Err(AppError::InvalidOtp);
        }
        if booking.status == BookingStatus::Completed {
            return Ok(&self.bookings[idx]);
        }
        if trip_status != TripStatus::Dispatched {
            return Err(transition_error("passenger on a trip", trip_status.as_str(), "board"));
        }

        let remaining = booking.remaining_to_board();
        let count = passengers.unwrap_or(remaining);
        if count < 1 || count > remaining {
            return Err(AppError::Validation(format!(
                "Booking {} has {} passenger(s) left to board, {} requested",
                booking.id, remaining, count
            )));
        }

        booking.passengers_onboarded += count;
        booking.otp_verified_at.get_or_insert(now);
        if booking.remaining_to_board() == 0 {
            booking.status = BookingStatus::Completed;
        }
        booking.updated_at = now;
        Ok(&self.bookings[idx])
    }

    // ---------------------------------------------------------------------
    // Viaje
    // ---------------------------------------------------------------------

    /// Comprobación previa al despacho (sin modificar el agregado)
    pub fn ensure_dispatchable(&self, override_min_seats: bool) -> AppResult<()> {
        let trip = &self.trip;
        if !trip.status.is_open() {
            return Err(transition_error("trip", trip.status.as_str(), "dispatch"));
        }
        if !trip.meets_min_seats() && !override_min_seats {
            return Err(AppError::InvalidStateTransition(format!(
                "Trip {} has {} of {} minimum seats booked; dispatch requires override",
                trip.id, trip.booked_seats, trip.min_seats
            )));
        }
        Ok(())
    }

    /// SCHEDULED|FILLING → DISPATCHED. Fija el precio por cabeza.
    pub fn dispatch(&mut self, driver_id: Uuid, override_min_seats: bool, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_dispatchable(override_min_seats)?;
        let trip = &mut self.trip;
        trip.driver_id = Some(driver_id);
        trip.dispatch_override = override_min_seats && !trip.meets_min_seats();
        trip.status = TripStatus::Dispatched;
        trip.price_locked = true;
        trip.updated_at = now;
        Ok(())
    }

    /// DISPATCHED → IN_TRANSIT. Las reservas sin pagar se cancelan.
    pub fn depart(&mut self, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        if self.trip.status != TripStatus::Dispatched {
            return Err(transition_error("trip", self.trip.status.as_str(), "depart"));
        }

        let unpaid: Vec<usize> = self
            .bookings
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b.status, BookingStatus::Hold | BookingStatus::Pending))
            .map(|(idx, _)| idx)
            .collect();

        let mut cancelled = Vec::with_capacity(unpaid.len());
        for idx in unpaid {
            self.release_booking(idx, Some("trip departed before payment".to_string()), None, now)?;
            cancelled.push(self.bookings[idx].id);
        }

        self.trip.status = TripStatus::InTransit;
        self.trip.actual_departure = Some(now);
        self.trip.updated_at = now;
        Ok(cancelled)
    }

    /// IN_TRANSIT → COMPLETED. Las reservas confirmadas se completan.
    pub fn arrive(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        if self.trip.status != TripStatus::InTransit {
            return Err(transition_error("trip", self.trip.status.as_str(), "complete"));
        }

        for booking in self.bookings.iter_mut().filter(|b| b.status == BookingStatus::Confirmed) {
            booking.status = BookingStatus::Completed;
            booking.updated_at = now;
        }

        self.trip.status = TripStatus::Completed;
        self.trip.actual_arrival = Some(now);
        self.trip.updated_at = now;
        Ok(())
    }

    /// Cancelación del viaje con cascada a todas sus reservas no terminales.
    /// Las confirmadas quedan REFUNDED con reembolso completo.
    pub fn cancel_trip(&mut self, reason: Option<String>, now: DateTime<Utc>) -> AppResult<CascadeSummary> {
        if self.trip.status.is_terminal() {
            return Err(transition_error("trip", self.trip.status.as_str(), "cancel"));
        }

        let open: Vec<usize> = self
            .bookings
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.status.is_terminal())
            .map(|(idx, _)| idx)
            .collect();

        let booking_reason = Some(match &reason {
            Some(r) => format!("trip cancelled: {}", r),
            None => "trip cancelled".to_string(),
        });

        let mut summary = CascadeSummary::default();
        for idx in open {
            let booking = &self.bookings[idx];
            let refund = (booking.status == BookingStatus::Confirmed).then_some(booking.payable_amount);
            self.release_booking(idx, booking_reason.clone(), refund, now)?;

            let id = self.bookings[idx].id;
            match refund {
                Some(amount) => {
                    summary.refunded_bookings.push(id);
                    summary.refund_total += amount;
                }
                None => summary.cancelled_bookings.push(id),
            }
        }

        self.trip.status = TripStatus::Cancelled;
        self.trip.cancellation_reason = reason;
        self.trip.updated_at = now;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::fixtures;

    fn hold(seats: i32) -> HoldRequest {
        HoldRequest { user_id: Uuid::new_v4(), seat_count: seats, pickup_point: None, drop_point: None }
    }

    fn ledger(now: DateTime<Utc>) -> TripLedger {
        TripLedger::new(fixtures::trip(now))
    }

    fn ttl() -> Duration {
        Duration::minutes(10)
    }

    #[test]
    fn test_shared_trip_fill_and_release_scenario() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        let policy = RefundPolicy::default();

        let a = ledger.place_hold(hold(2), ttl(), now).unwrap();
        ledger.confirm_booking(a, Some("pay_a".into()), now).unwrap();
        assert_eq!(ledger.trip.status, TripStatus::Filling);
        assert_eq!(ledger.trip.booked_seats, 2);
        assert_eq!(ledger.trip.current_per_head_price, Decimal::new(200, 0));

        let b = ledger.place_hold(hold(2), ttl(), now).unwrap();
        ledger.confirm_booking(b, Some("pay_b".into()), now).unwrap();
        assert_eq!(ledger.trip.booked_seats, 4);
        assert_eq!(ledger.trip.current_per_head_price, Decimal::new(100, 0));

        let err = ledger.place_hold(hold(1), ttl(), now).unwrap_err();
        assert!(matches!(err, AppError::CapacityExceeded(_)));
        assert_eq!(ledger.bookings.len(), 2);

        let cancelled = ledger.cancel_booking(a, None, &policy, now).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Refunded);
        assert_eq!(ledger.trip.booked_seats, 2);
        assert_eq!(ledger.trip.current_per_head_price, Decimal::new(200, 0));
        assert!(ledger.is_consistent());
    }

    #[test]
    fn test_confirmed_price_is_not_retroactively_lowered() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        let a = ledger.place_hold(hold(2), ttl(), now).unwrap();
        ledger.confirm_booking(a, None, now).unwrap();
        let b = ledger.place_hold(hold(2), ttl(), now).unwrap();
        ledger.confirm_booking(b, None, now).unwrap();

        assert_eq!(ledger.booking(a).unwrap().price_per_seat, Decimal::new(200, 0));
        assert_eq!(ledger.booking(b).unwrap().price_per_seat, Decimal::new(100, 0));
    }

    #[test]
    fn test_per_head_price_round_trip_while_filling() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        for _ in 0..3 {
            ledger.place_hold(hold(1), ttl(), now).unwrap();
            let trip = &ledger.trip;
            let product = trip.current_per_head_price * Decimal::from(trip.booked_seats.max(1));
            assert!((product - trip.total_price).abs() < Decimal::new(5, 2));
        }
    }

    #[test]
    fn test_refund_depends_on_lead_time() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        ledger.trip.scheduled_departure = now + Duration::hours(10);
        let a = ledger.place_hold(hold(2), ttl(), now).unwrap();
        ledger.confirm_booking(a, None, now).unwrap();
        let paid = ledger.booking(a).unwrap().payable_amount;

        let booking = ledger.cancel_booking(a, Some("changed plans".into()), &RefundPolicy::default(), now).unwrap();
        assert_eq!(booking.refund_amount, Some((paid / Decimal::from(2)).round_dp(2)));
        assert_eq!(booking.payment_status, PaymentStatus::RefundPending);
    }

    #[test]
    fn test_cancel_hold_has_no_refund_and_cannot_repeat() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        let a = ledger.place_hold(hold(1), ttl(), now).unwrap();
        let policy = RefundPolicy::default();
        let booking = ledger.cancel_booking(a, None, &policy, now).unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.refund_amount, None);
        assert_eq!(ledger.trip.status, TripStatus::Scheduled);

        let err = ledger.cancel_booking(a, None, &policy, now).unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
        assert_eq!(ledger.trip.booked_seats, 0);
    }

    #[test]
    fn test_hold_expiry_releases_seats() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        let a = ledger.place_hold(hold(3), ttl(), now).unwrap();
        let paid = ledger.place_hold(hold(1), ttl(), now).unwrap();
        ledger.initiate_payment(paid, "pay_1".into(), now).unwrap();

        assert!(ledger.expire_holds(now + Duration::minutes(9)).unwrap().is_empty());
        let expired = ledger.expire_holds(now + Duration::minutes(10)).unwrap();
        assert_eq!(expired, vec![a]);
        assert_eq!(ledger.booking(a).unwrap().status, BookingStatus::Cancelled);
        assert_eq!(ledger.booking(paid).unwrap().status, BookingStatus::Pending);
        assert_eq!(ledger.trip.booked_seats, 1);
        assert!(ledger.is_consistent());
    }

    #[test]
    fn test_expired_hold_cannot_be_confirmed() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        let a = ledger.place_hold(hold(1), ttl(), now).unwrap();
        let err = ledger.confirm_booking(a, None, now + Duration::minutes(11)).unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
    }

    #[test]
    fn test_dispatch_requires_min_seats_or_override() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        ledger.place_hold(hold(1), ttl(), now).unwrap();

        let driver = Uuid::new_v4();
        let err = ledger.dispatch(driver, false, now).unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
        assert_eq!(ledger.trip.status, TripStatus::Filling);

        ledger.dispatch(driver, true, now).unwrap();
        assert_eq!(ledger.trip.status, TripStatus::Dispatched);
        assert!(ledger.trip.dispatch_override);
        assert!(ledger.trip.price_locked);

        let err = ledger.dispatch(driver, true, now).unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
        let err = ledger.place_hold(hold(1), ttl(), now).unwrap_err();
        assert!(matches!(err, AppError::InvalidStateTransition(_)));
    }

    #[test]
    fn test_wrong_otp_changes_nothing() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        let a = ledger.place_hold(hold(2), ttl(), now).unwrap();
        ledger.confirm_booking(a, None, now).unwrap();
        ledger.dispatch(Uuid::new_v4(), false, now).unwrap();

        let before = ledger.clone();
        let otp = ledger.booking(a).unwrap().otp.clone().unwrap();
        let wrong = if otp == "0000" { "1111" } else { "0000" };
        let err = ledger.board(a, wrong, None, now).unwrap_err();
        assert!(matches!(err, AppError::InvalidOtp));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_boarding_counts_up_to_seat_count() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        let a = ledger.place_hold(hold(2), ttl(), now).unwrap();
        ledger.confirm_booking(a, None, now).unwrap();
        let otp = ledger.booking(a).unwrap().otp.clone().unwrap();

        // aún no despachado
        assert!(ledger.board(a, &otp, Some(1), now).is_err());
        ledger.dispatch(Uuid::new_v4(), false, now).unwrap();

        let booking = ledger.board(a, &otp, Some(1), now).unwrap();
        assert_eq!(booking.passengers_onboarded, 1);
        assert_eq!(booking.status, BookingStatus::Confirmed);

        assert!(matches!(ledger.board(a, &otp, Some(2), now), Err(AppError::Validation(_))));

        let booking = ledger.board(a, &otp, None, now).unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        let booking = ledger.board(a, &otp, None, now).unwrap();
        assert_eq!(booking.passengers_onboarded, 2);
    }

    #[test]
    fn test_cancel_trip_cascades_to_bookings() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        let held = ledger.place_hold(hold(1), ttl(), now).unwrap();
        let paid = ledger.place_hold(hold(2), ttl(), now).unwrap();
        ledger.confirm_booking(paid, None, now).unwrap();
        let payable = ledger.booking(paid).unwrap().payable_amount;

        let summary = ledger.cancel_trip(Some("vehicle breakdown".into()), now).unwrap();
        assert_eq!(summary.cancelled_bookings, vec![held]);
        assert_eq!(summary.refunded_bookings, vec![paid]);
        assert_eq!(summary.refund_total, payable);
        assert_eq!(ledger.trip.status, TripStatus::Cancelled);
        assert_eq!(ledger.trip.booked_seats, 0);
        assert!(ledger.bookings.iter().all(|b| b.status.is_terminal()));
        assert!(ledger.cancel_trip(None, now).is_err());
    }

    #[test]
    fn test_depart_and_arrive() {
        let now = Utc::now();
        let mut ledger = ledger(now);
        let paid = ledger.place_hold(hold(2), ttl(), now).unwrap();
        ledger.confirm_booking(paid, None, now).unwrap();
        let unpaid = ledger.place_hold(hold(1), ttl(), now).unwrap();

        assert!(ledger.depart(now).is_err());
        ledger.dispatch(Uuid::new_v4(), false, now).unwrap();
        let cancelled = ledger.depart(now).unwrap();
        assert_eq!(cancelled, vec![unpaid]);
        assert_eq!(ledger.trip.status, TripStatus::InTransit);
        assert_eq!(ledger.trip.booked_seats, 2);

        ledger.arrive(now + Duration::hours(3)).unwrap();
        assert_eq!(ledger.trip.status, TripStatus::Completed);
        assert_eq!(ledger.booking(paid).unwrap().status, BookingStatus::Completed);
        assert!(ledger.is_consistent());
    }
}
