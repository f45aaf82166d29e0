//! Programación de viajes y ciclo de vida del viaje
//!
//! Crea viajes a partir de una configuración de vehículo y una ruta, y aplica
//! las transiciones de viaje que no implican asignar conductor: cancelación en
//! cascada, salida, llegada y cancelación automática de viajes sin mínimo.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::dto::trip_dto::CreateTripRequest;
use crate::models::trip::{Trip, TripStatus};
use crate::models::trip_ledger::{CascadeSummary, TripLedger};
use crate::repositories::{DriverRepository, PageWindow, RouteRepository, VehicleConfigRepository};
use crate::services::pricing_config_service::PricingConfigService;
use crate::services::pricing_engine;
use crate::services::trip_ledgers::TripLedgers;
use crate::utils::clock::Clock;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Motivo registrado en los viajes cancelados automáticamente
pub const STALE_TRIP_REASON: &str = "minimum seats not reached by scheduled departure";
/// Antelación máxima con la que se puede programar un viaje
pub const MAX_SCHEDULING_HORIZON_DAYS: i64 = 365;

pub struct TripScheduler {
    ledgers: Arc<TripLedgers>,
    vehicle_configs: Arc<dyn VehicleConfigRepository>,
    routes: Arc<dyn RouteRepository>,
    drivers: Arc<dyn DriverRepository>,
    pricing: Arc<PricingConfigService>,
    clock: Arc<dyn Clock>,
}

impl TripScheduler {
    pub fn new(
        ledgers: Arc<TripLedgers>,
        vehicle_configs: Arc<dyn VehicleConfigRepository>,
        routes: Arc<dyn RouteRepository>,
        drivers: Arc<dyn DriverRepository>,
        pricing: Arc<PricingConfigService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { ledgers, vehicle_configs, routes, drivers, pricing, clock }
    }

    /// Programar un viaje con la tarifa vigente como snapshot
    pub async fn create_trip(&self, request: CreateTripRequest) -> AppResult<Trip> {
        request.validate()?;
        let now = self.clock.now();

        if request.scheduled_departure <= now {
            return Err(AppError::Validation("scheduled_departure must be in the future".to_string()));
        }
        if request.scheduled_departure > now + Duration::days(MAX_SCHEDULING_HORIZON_DAYS) {
            return Err(AppError::Validation(format!(
                "scheduled_departure cannot be more than {} days ahead",
                MAX_SCHEDULING_HORIZON_DAYS
            )));
        }

        let vehicle = self
            .vehicle_configs
            .find_by_id(request.vehicle_config_id)
            .await?
            .ok_or_else(|| not_found_error("VehicleConfig", &request.vehicle_config_id.to_string()))?;
        let route = self
            .routes
            .find_by_id(request.route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", &request.route_id.to_string()))?;

        if request.reverse && !route.is_bidirectional {
            return Err(AppError::Validation(format!(
                "Route {} is one-way and cannot be travelled in reverse",
                route.id
            )));
        }

        let total_seats = request.total_seats.unwrap_or(vehicle.max_seats);
        if total_seats < vehicle.min_seats || total_seats > vehicle.max_seats {
            return Err(AppError::Validation(format!(
                "total_seats must be between {} and {} for {}",
                vehicle.min_seats, vehicle.max_seats, vehicle.vehicle_type
            )));
        }

        let pricing = self.pricing.current().await?;
        let total_price = pricing_engine::trip_total_price(&vehicle, &route, &pricing, request.scheduled_departure)?;
        let (origin, destination) = route.endpoints(request.reverse);
        let scheduled_arrival = request
            .scheduled_departure
            .checked_add_signed(Duration::minutes(i64::from(route.duration_minutes)))
            .ok_or_else(|| AppError::Validation("scheduled arrival is out of range".to_string()))?;

        let trip = Trip {
            id: Uuid::new_v4(),
            vehicle_config_id: vehicle.id,
            vehicle_type: vehicle.vehicle_type,
            route_id: route.id,
            reverse: request.reverse,
            origin_name: origin.name.clone(),
            destination_name: destination.name.clone(),
            status: TripStatus::Scheduled,
            scheduled_departure: request.scheduled_departure,
            scheduled_arrival,
            actual_departure: None,
            actual_arrival: None,
            total_seats,
            min_seats: vehicle.min_seats,
            booked_seats: 0,
            total_price,
            current_per_head_price: pricing_engine::per_head_price(total_price, 0),
            price_locked: false,
            pricing,
            driver_id: None,
            dispatch_override: false,
            cancellation_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        self.ledgers.repository().insert(&TripLedger::new(trip.clone())).await?;
        log::info!(
            "🚐 Viaje programado {}: {} → {} a las {} ({} plazas, total {})",
            trip.id,
            trip.origin_name,
            trip.destination_name,
            trip.scheduled_departure,
            trip.total_seats,
            trip.total_price
        );
        Ok(trip)
    }

    pub async fn get_trip(&self, trip_id: Uuid) -> AppResult<Trip> {
        Ok(self.ledgers.load(trip_id).await?.trip)
    }

    pub async fn list_trips(&self, status: Option<TripStatus>, window: PageWindow) -> AppResult<(Vec<Trip>, i64)> {
        self.ledgers.repository().list_trips(status, window).await
    }

    /// Libera al conductor tras una transición ya persistida; un fallo aquí no deshace el viaje
    async fn release_driver(&self, trip: &Trip) {
        if let Some(driver_id) = trip.driver_id {
            if let Err(e) = self.drivers.release(driver_id, trip.id).await {
                log::error!("❌ No se pudo liberar al conductor {} del viaje {}: {}", driver_id, trip.id, e);
            }
        }
    }

    /// Cancelación manual con cascada sobre las reservas
    pub async fn cancel_trip(&self, trip_id: Uuid, reason: Option<String>) -> AppResult<(Trip, CascadeSummary)> {
        let now = self.clock.now();
        let (summary, ledger) = self.ledgers.mutate(trip_id, |l| l.cancel_trip(reason, now)).await?;

        self.release_driver(&ledger.trip).await;
        log::info!(
            "🛑 Viaje {} cancelado: {} reservas canceladas, {} reembolsadas ({})",
            trip_id,
            summary.cancelled_bookings.len(),
            summary.refunded_bookings.len(),
            summary.refund_total
        );
        Ok((ledger.trip, summary))
    }

    /// DISPATCHED → IN_TRANSIT
    pub async fn depart(&self, trip_id: Uuid) -> AppResult<(Trip, Vec<Uuid>)> {
        let now = self.clock.now();
        let (cancelled, ledger) = self.ledgers.mutate(trip_id, |l| l.depart(now)).await?;

        log::info!("🛣️ Viaje {} en ruta ({} reservas impagadas canceladas)", trip_id, cancelled.len());
        Ok((ledger.trip, cancelled))
    }

    /// IN_TRANSIT → COMPLETED
    pub async fn arrive(&self, trip_id: Uuid) -> AppResult<Trip> {
        let now = self.clock.now();
        let ((), ledger) = self.ledgers.mutate(trip_id, |l| l.arrive(now)).await?;

        self.release_driver(&ledger.trip).await;
        log::info!("🏁 Viaje {} completado", trip_id);
        Ok(ledger.trip)
    }

    /// Cancela los viajes nunca despachados cuya salida ya pasó sin alcanzar el mínimo
    pub async fn cancel_stale_trips(&self) -> AppResult<Vec<Uuid>> {
        let now = self.clock.now();
        let candidates: Vec<Trip> = self
            .ledgers
            .repository()
            .open_trips()
            .await?
            .into_iter()
            .filter(|t| t.scheduled_departure <= now && !t.meets_min_seats())
            .collect();

        let mut cancelled = Vec::new();
        for trip in candidates {
            match self.cancel_if_stale(trip.id, now).await {
                Ok(Some(summary)) => {
                    log::warn!(
                        "⚠️ Viaje {} cancelado automáticamente ({}/{} plazas): {} reservas afectadas",
                        trip.id,
                        trip.booked_seats,
                        trip.min_seats,
                        summary.cancelled_bookings.len() + summary.refunded_bookings.len()
                    );
                    cancelled.push(trip.id);
                }
                Ok(None) => {}
                Err(e) => log::error!("❌ Error cancelando el viaje vencido {}: {}", trip.id, e),
            }
        }
        Ok(cancelled)
    }

    async fn cancel_if_stale(&self, trip_id: Uuid, now: DateTime<Utc>) -> AppResult<Option<CascadeSummary>> {
        let mut lease = self.ledgers.lock(trip_id).await?;
        // Revalidar bajo el candado: pudo llenarse o despacharse entretanto
        let trip = &lease.ledger().trip;
        if !trip.status.is_open() || trip.meets_min_seats() {
            return Ok(None);
        }

        let summary = lease
            .ledger_mut()
            .cancel_trip(Some(STALE_TRIP_REASON.to_string()), now)?;
        let ledger = lease.commit().await?;
        self.release_driver(&ledger.trip).await;
        Ok(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::fixtures;
    use crate::models::trip_ledger::HoldRequest;
    use crate::repositories::{Repositories, TripRepository};
    use crate::utils::clock::SystemClock;

    async fn setup(seats_held: i32) -> (TripScheduler, Arc<dyn TripRepository>, Uuid) {
        let repos = Repositories::in_memory();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let now = clock.now();

        let mut ledger = TripLedger::new(fixtures::trip(now));
        if seats_held > 0 {
            let hold = HoldRequest { user_id: Uuid::new_v4(), seat_count: seats_held, pickup_point: None, drop_point: None };
            ledger.place_hold(hold, Duration::minutes(10), now).unwrap();
        }
        let trip_id = ledger.trip.id;
        repos.trips.insert(&ledger).await.unwrap();

        let scheduler = TripScheduler::new(
            Arc::new(TripLedgers::new(repos.trips.clone())),
            repos.vehicle_configs,
            repos.routes,
            repos.drivers,
            Arc::new(PricingConfigService::new(repos.pricing, clock.clone())),
            clock,
        );
        (scheduler, repos.trips, trip_id)
    }

    #[tokio::test]
    async fn test_stale_check_leaves_filled_trip_untouched() {
        let (scheduler, trips, trip_id) = setup(2).await;
        let now = Utc::now();

        assert!(scheduler.cancel_if_stale(trip_id, now).await.unwrap().is_none());
        let stored = trips.load(trip_id).await.unwrap().unwrap();
        assert_eq!(stored.trip.version, 0);
        assert_eq!(stored.trip.status, TripStatus::Filling);
    }

    #[tokio::test]
    async fn test_stale_check_cancels_trip_below_minimum() {
        let (scheduler, trips, trip_id) = setup(1).await;

        let summary = scheduler.cancel_if_stale(trip_id, Utc::now()).await.unwrap().unwrap();
        assert_eq!(summary.cancelled_bookings.len(), 1);
        let stored = trips.load(trip_id).await.unwrap().unwrap();
        assert_eq!(stored.trip.status, TripStatus::Cancelled);
        assert_eq!(stored.trip.version, 1);
        assert_eq!(stored.trip.cancellation_reason.as_deref(), Some(STALE_TRIP_REASON));
    }
}
