use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::models::pricing::PricingConfig;
use crate::models::trip::{Trip, TripStatus};
use crate::models::trip_ledger::TripLedger;
use crate::models::vehicle_config::VehicleType;
use crate::repositories::{parse_column, BookingFilter, PageWindow, TripRepository};
use crate::utils::errors::{not_found_error, AppError, AppResult};

// Fila de la tabla trips
#[derive(Debug, sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    vehicle_config_id: Uuid,
    vehicle_type: String,
    route_id: Uuid,
    reverse: bool,
    origin_name: String,
    destination_name: String,
    status: String,
    scheduled_departure: DateTime<Utc>,
    scheduled_arrival: DateTime<Utc>,
    actual_departure: Option<DateTime<Utc>>,
    actual_arrival: Option<DateTime<Utc>>,
    total_seats: i32,
    min_seats: i32,
    booked_seats: i32,
    total_price: Decimal,
    current_per_head_price: Decimal,
    price_locked: bool,
    pricing: Json<PricingConfig>,
    driver_id: Option<Uuid>,
    dispatch_override: bool,
    cancellation_reason: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TripRow> for Trip {
    type Error = sqlx::Error;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        Ok(Trip {
            id: row.id,
            vehicle_config_id: row.vehicle_config_id,
            vehicle_type: parse_column::<VehicleType>(&row.vehicle_type)?,
            route_id: row.route_id,
            reverse: row.reverse,
            origin_name: row.origin_name,
            destination_name: row.destination_name,
            status: parse_column::<TripStatus>(&row.status)?,
            scheduled_departure: row.scheduled_departure,
            scheduled_arrival: row.scheduled_arrival,
            actual_departure: row.actual_departure,
            actual_arrival: row.actual_arrival,
            total_seats: row.total_seats,
            min_seats: row.min_seats,
            booked_seats: row.booked_seats,
            total_price: row.total_price,
            current_per_head_price: row.current_per_head_price,
            price_locked: row.price_locked,
            pricing: row.pricing.0,
            driver_id: row.driver_id,
            dispatch_override: row.dispatch_override,
            cancellation_reason: row.cancellation_reason,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// Fila de la tabla bookings
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    trip_id: Uuid,
    user_id: Uuid,
    booking_code: Option<String>,
    seat_count: i32,
    price_per_seat: Decimal,
    total_amount: Decimal,
    commission_amount: Decimal,
    platform_fee_amount: Decimal,
    gst_amount: Decimal,
    payable_amount: Decimal,
    status: String,
    payment_status: String,
    payment_reference: Option<String>,
    pickup_point: Option<String>,
    drop_point: Option<String>,
    otp: Option<String>,
    otp_verified_at: Option<DateTime<Utc>>,
    passengers_onboarded: i32,
    hold_expires_at: Option<DateTime<Utc>>,
    refund_amount: Option<Decimal>,
    cancellation_reason: Option<String>,
    confirmed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = sqlx::Error;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            trip_id: row.trip_id,
            user_id: row.user_id,
            booking_code: row.booking_code,
            seat_count: row.seat_count,
            price_per_seat: row.price_per_seat,
            total_amount: row.total_amount,
            commission_amount: row.commission_amount,
            platform_fee_amount: row.platform_fee_amount,
            gst_amount: row.gst_amount,
            payable_amount: row.payable_amount,
            status: parse_column::<BookingStatus>(&row.status)?,
            payment_status: parse_column::<PaymentStatus>(&row.payment_status)?,
            payment_reference: row.payment_reference,
            pickup_point: row.pickup_point,
            drop_point: row.drop_point,
            otp: row.otp,
            otp_verified_at: row.otp_verified_at,
            passengers_onboarded: row.passengers_onboarded,
            hold_expires_at: row.hold_expires_at,
            refund_amount: row.refund_amount,
            cancellation_reason: row.cancellation_reason,
            confirmed_at: row.confirmed_at,
            cancelled_at: row.cancelled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_trips(rows: Vec<TripRow>) -> Result<Vec<Trip>, sqlx::Error> {
    rows.into_iter().map(Trip::try_from).collect()
}

fn into_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, sqlx::Error> {
    rows.into_iter().map(Booking::try_from).collect()
}

fn status_counts<T: std::str::FromStr<Err = String>>(rows: Vec<(String, i64)>) -> AppResult<Vec<(T, i64)>> {
    rows.into_iter()
        .map(|(status, count)| -> AppResult<(T, i64)> { Ok((parse_column::<T>(&status)?, count)) })
        .collect()
}

pub struct PgTripRepository {
    pool: PgPool,
}

impl PgTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_bookings(tx: &mut Transaction<'_, Postgres>, bookings: &[Booking]) -> Result<(), sqlx::Error> {
        for booking in bookings {
            sqlx::query(
                r#"
                INSERT INTO bookings (
                    id, trip_id, user_id, booking_code, seat_count, price_per_seat, total_amount,
                    commission_amount, platform_fee_amount, gst_amount, payable_amount, status,
                    payment_status, payment_reference, pickup_point, drop_point, otp,
                    otp_verified_at, passengers_onboarded, hold_expires_at, refund_amount,
                    cancellation_reason, confirmed_at, cancelled_at, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                        $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)
                ON CONFLICT (id) DO UPDATE SET
                    booking_code = EXCLUDED.booking_code,
                    price_per_seat = EXCLUDED.price_per_seat,
                    total_amount = EXCLUDED.total_amount,
                    commission_amount = EXCLUDED.commission_amount,
                    platform_fee_amount = EXCLUDED.platform_fee_amount,
                    gst_amount = EXCLUDED.gst_amount,
                    payable_amount = EXCLUDED.payable_amount,
                    status = EXCLUDED.status,
                    payment_status = EXCLUDED.payment_status,
                    payment_reference = EXCLUDED.payment_reference,
                    otp = EXCLUDED.otp,
                    otp_verified_at = EXCLUDED.otp_verified_at,
                    passengers_onboarded = EXCLUDED.passengers_onboarded,
                    hold_expires_at = EXCLUDED.hold_expires_at,
                    refund_amount = EXCLUDED.refund_amount,
                    cancellation_reason = EXCLUDED.cancellation_reason,
                    confirmed_at = EXCLUDED.confirmed_at,
                    cancelled_at = EXCLUDED.cancelled_at,
                    updated_at = EXCLUDED.updated_at
                WHERE bookings.updated_at IS DISTINCT FROM EXCLUDED.updated_at
                "#,
            )
            .bind(booking.id)
            .bind(booking.trip_id)
            .bind(booking.user_id)
            .bind(&booking.booking_code)
            .bind(booking.seat_count)
            .bind(booking.price_per_seat)
            .bind(booking.total_amount)
            .bind(booking.commission_amount)
            .bind(booking.platform_fee_amount)
            .bind(booking.gst_amount)
            .bind(booking.payable_amount)
            .bind(booking.status.as_str())
            .bind(booking.payment_status.as_str())
            .bind(&booking.payment_reference)
            .bind(&booking.pickup_point)
            .bind(&booking.drop_point)
            .bind(&booking.otp)
            .bind(booking.otp_verified_at)
            .bind(booking.passengers_onboarded)
            .bind(booking.hold_expires_at)
            .bind(booking.refund_amount)
            .bind(&booking.cancellation_reason)
            .bind(booking.confirmed_at)
            .bind(booking.cancelled_at)
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn insert(&self, ledger: &TripLedger) -> AppResult<()> {
        let trip = &ledger.trip;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO trips (
                id, vehicle_config_id, vehicle_type, route_id, reverse, origin_name, destination_name,
                status, scheduled_departure, scheduled_arrival, actual_departure, actual_arrival,
                total_seats, min_seats, booked_seats, total_price, current_per_head_price,
                price_locked, pricing, driver_id, dispatch_override, cancellation_reason,
                version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25)
            "#,
        )
        .bind(trip.id)
        .bind(trip.vehicle_config_id)
        .bind(trip.vehicle_type.as_str())
        .bind(trip.route_id)
        .bind(trip.reverse)
        .bind(&trip.origin_name)
        .bind(&trip.destination_name)
        .bind(trip.status.as_str())
        .bind(trip.scheduled_departure)
        .bind(trip.scheduled_arrival)
        .bind(trip.actual_departure)
        .bind(trip.actual_arrival)
        .bind(trip.total_seats)
        .bind(trip.min_seats)
        .bind(trip.booked_seats)
        .bind(trip.total_price)
        .bind(trip.current_per_head_price)
        .bind(trip.price_locked)
        .bind(Json(&trip.pricing))
        .bind(trip.driver_id)
        .bind(trip.dispatch_override)
        .bind(&trip.cancellation_reason)
        .bind(trip.version)
        .bind(trip.created_at)
        .bind(trip.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::upsert_bookings(&mut tx, &ledger.bookings).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load(&self, trip_id: Uuid) -> AppResult<Option<TripLedger>> {
        let row = sqlx::query_as::<_, TripRow>("SELECT * FROM trips WHERE id = $1")
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let bookings = sqlx::query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE trip_id = $1 ORDER BY created_at, id",
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(TripLedger {
            trip: Trip::try_from(row)?,
            bookings: into_bookings(bookings)?,
        }))
    }

    async fn save(&self, ledger: &TripLedger, expected_version: i64) -> AppResult<()> {
        let trip = &ledger.trip;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE trips
            SET status = $3, actual_departure = $4, actual_arrival = $5, booked_seats = $6,
                current_per_head_price = $7, price_locked = $8, driver_id = $9,
                dispatch_override = $10, cancellation_reason = $11, version = $12, updated_at = $13
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(trip.id)
        .bind(expected_version)
        .bind(trip.status.as_str())
        .bind(trip.actual_departure)
        .bind(trip.actual_arrival)
        .bind(trip.booked_seats)
        .bind(trip.current_per_head_price)
        .bind(trip.price_locked)
        .bind(trip.driver_id)
        .bind(trip.dispatch_override)
        .bind(&trip.cancellation_reason)
        .bind(trip.version)
        .bind(trip.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM trips WHERE id = $1")
                .bind(trip.id)
                .fetch_optional(&self.pool)
                .await?;
            return Err(match exists {
                Some((version,)) => AppError::Conflict(format!(
                    "Trip {} was modified concurrently (version {} != {})",
                    trip.id, version, expected_version
                )),
                None => not_found_error("Trip", &trip.id.to_string()),
            });
        }

        Self::upsert_bookings(&mut tx, &ledger.bookings).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_trips(&self, status: Option<TripStatus>, window: PageWindow) -> AppResult<(Vec<Trip>, i64)> {
        let status = status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT * FROM trips
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY scheduled_departure, created_at
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM trips WHERE ($1::text IS NULL OR status = $1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok((into_trips(rows)?, total))
    }

    async fn open_trips(&self) -> AppResult<Vec<Trip>> {
        let rows = sqlx::query_as::<_, TripRow>(
            "SELECT * FROM trips WHERE status IN ('SCHEDULED', 'FILLING') ORDER BY scheduled_departure",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(into_trips(rows)?)
    }

    async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Booking::try_from).transpose()?)
    }

    async fn list_bookings(&self, filter: &BookingFilter, window: PageWindow) -> AppResult<(Vec<Booking>, i64)> {
        let status = filter.status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT * FROM bookings
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR trip_id = $2)
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(filter.trip_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR trip_id = $2)
            "#,
        )
        .bind(status)
        .bind(filter.trip_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((into_bookings(rows)?, total))
    }

    async fn trips_with_expired_holds(&self, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT DISTINCT trip_id FROM bookings WHERE status = 'HOLD' AND hold_expires_at <= $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn trip_status_counts(&self) -> AppResult<Vec<(TripStatus, i64)>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM trips GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        status_counts(rows)
    }

    async fn booking_status_counts(&self) -> AppResult<Vec<(BookingStatus, i64)>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM bookings GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        status_counts(rows)
    }
}
