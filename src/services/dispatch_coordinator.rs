//! Coordinación de despacho
//!
//! Asigna conductores a viajes (manual o automáticamente) y pasa el viaje a
//! DISPATCHED. El conductor se reserva antes de confirmar el viaje y se libera
//! si la confirmación falla.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::Driver;
use crate::models::trip::Trip;
use crate::repositories::{DriverRepository, RouteRepository};
use crate::services::trip_ledgers::TripLedgers;
use crate::utils::clock::Clock;
use crate::utils::errors::{not_found_error, AppError, AppResult};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distancia en km entre dos puntos (lat, lng)
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lng2) = (to.0.to_radians(), to.1.to_radians());
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Criterio de elección de conductor entre los disponibles
pub trait DriverAssignmentStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `origin` son las coordenadas de salida del viaje, si se conocen
    fn select(&self, trip: &Trip, origin: Option<(f64, f64)>, candidates: &[Driver]) -> Option<Uuid>;
}

/// Conductor disponible más cercano al origen; sin posición conocida va al final
#[derive(Debug, Default)]
pub struct NearestAvailable;

impl DriverAssignmentStrategy for NearestAvailable {
    fn name(&self) -> &'static str {
        "nearest"
    }

    fn select(&self, _trip: &Trip, origin: Option<(f64, f64)>, candidates: &[Driver]) -> Option<Uuid> {
        let distance = |driver: &Driver| match (origin, driver.current_lat.zip(driver.current_lng)) {
            (Some(origin), Some(position)) => haversine_km(origin, position),
            _ => f64::INFINITY,
        };

        candidates
            .iter()
            .filter(|d| d.can_take_trip())
            .min_by(|a, b| distance(a).total_cmp(&distance(b)).then_with(|| a.id.cmp(&b.id)))
            .map(|d| d.id)
    }
}

/// Reparto rotatorio entre los conductores disponibles
#[derive(Debug, Default)]
pub struct RoundRobin {
    next: AtomicUsize,
}

impl DriverAssignmentStrategy for RoundRobin {
    fn name(&self) -> &'static str {
        "round_robin"
    }

    fn select(&self, _trip: &Trip, _origin: Option<(f64, f64)>, candidates: &[Driver]) -> Option<Uuid> {
        let mut available: Vec<&Driver> = candidates.iter().filter(|d| d.can_take_trip()).collect();
        if available.is_empty() {
            return None;
        }
        available.sort_by_key(|d| d.id);
        let turn = self.next.fetch_add(1, Ordering::Relaxed);
        Some(available[turn % available.len()].id)
    }
}

/// Estrategia elegida por configuración (`DISPATCH_STRATEGY`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Nearest,
    RoundRobin,
}

impl StrategyKind {
    pub fn build(self) -> Box<dyn DriverAssignmentStrategy> {
        match self {
            StrategyKind::Nearest => Box::new(NearestAvailable),
            StrategyKind::RoundRobin => Box::new(RoundRobin::default()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Nearest => f.write_str("nearest"),
            StrategyKind::RoundRobin => f.write_str("round_robin"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(StrategyKind::Nearest),
            "round_robin" | "round-robin" => Ok(StrategyKind::RoundRobin),
            other => Err(format!("unknown dispatch strategy '{}'", other)),
        }
    }
}

/// Asignación realizada por el auto-despacho
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchAssignment {
    pub trip_id: Uuid,
    pub driver_id: Uuid,
}

/// Resultado de una pasada de auto-despacho
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AutoDispatchReport {
    pub dispatched: Vec<DispatchAssignment>,
    /// Viajes listos sin conductor disponible: requieren seguimiento manual
    pub pending: Vec<Uuid>,
}

pub struct DispatchCoordinator {
    ledgers: Arc<TripLedgers>,
    drivers: Arc<dyn DriverRepository>,
    routes: Arc<dyn RouteRepository>,
    strategy: Box<dyn DriverAssignmentStrategy>,
    dispatch_lead: Duration,
    clock: Arc<dyn Clock>,
}

impl DispatchCoordinator {
    pub fn new(
        ledgers: Arc<TripLedgers>,
        drivers: Arc<dyn DriverRepository>,
        routes: Arc<dyn RouteRepository>,
        strategy: Box<dyn DriverAssignmentStrategy>,
        dispatch_lead: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { ledgers, drivers, routes, strategy, dispatch_lead, clock }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Coordenadas del punto de salida según el sentido del viaje
    async fn trip_origin(&self, trip: &Trip) -> AppResult<Option<(f64, f64)>> {
        let route = self.routes.find_by_id(trip.route_id).await?;
        Ok(route.map(|route| {
            let (origin, _) = route.endpoints(trip.reverse);
            (origin.lat, origin.lng)
        }))
    }

    async fn pick_driver(&self, trip: &Trip) -> AppResult<Option<Uuid>> {
        let candidates = self.drivers.list_available().await?;
        let origin = self.trip_origin(trip).await?;
        Ok(self.strategy.select(trip, origin, &candidates))
    }

    /// Núcleo de la asignación. `Ok(None)` si no hay conductor disponible.
    async fn try_assign(
        &self,
        trip_id: Uuid,
        requested_driver: Option<Uuid>,
        override_min_seats: bool,
    ) -> AppResult<Option<Trip>> {
        let mut lease = self.ledgers.lock(trip_id).await?;
        lease.ledger().ensure_dispatchable(override_min_seats)?;

        let driver_id = match requested_driver {
            Some(driver_id) => {
                let driver = self
                    .drivers
                    .find_by_id(driver_id)
                    .await?
                    .ok_or_else(|| not_found_error("Driver", &driver_id.to_string()))?;
                if !driver.can_take_trip() {
                    return Err(AppError::Conflict(format!("Driver {} is not available", driver_id)));
                }
                driver_id
            }
            None => match self.pick_driver(&lease.ledger().trip).await? {
                Some(driver_id) => driver_id,
                None => return Ok(None),
            },
        };

        if !self.drivers.claim(driver_id, trip_id).await? {
            return Err(AppError::Conflict(format!("Driver {} was assigned to another trip", driver_id)));
        }

        let now = self.clock.now();
        let committed = match lease.ledger_mut().dispatch(driver_id, override_min_seats, now) {
            Ok(()) => lease.commit().await,
            Err(e) => Err(e),
        };

        match committed {
            Ok(ledger) => {
                log::info!(
                    "🚀 Viaje {} despachado con el conductor {} ({}/{} plazas{})",
                    trip_id,
                    driver_id,
                    ledger.trip.booked_seats,
                    ledger.trip.total_seats,
                    if ledger.trip.dispatch_override { ", con override" } else { "" }
                );
                Ok(Some(ledger.trip))
            }
            Err(e) => {
                if let Err(release_err) = self.drivers.release(driver_id, trip_id).await {
                    log::error!(
                        "❌ No se pudo liberar al conductor {} tras fallar el despacho de {}: {}",
                        driver_id,
                        trip_id,
                        release_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Asignar conductor (el indicado o el que elija la estrategia) y despachar
    pub async fn assign_driver(
        &self,
        trip_id: Uuid,
        driver_id: Option<Uuid>,
        override_min_seats: bool,
    ) -> AppResult<Trip> {
        self.try_assign(trip_id, driver_id, override_min_seats)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("No driver available for trip {}", trip_id)))
    }

    /// Variante a nivel de reserva: despacha el viaje de la reserva
    pub async fn assign_driver_for_booking(
        &self,
        booking_id: Uuid,
        driver_id: Option<Uuid>,
        override_min_seats: bool,
    ) -> AppResult<Trip> {
        let booking = self
            .ledgers
            .repository()
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))?;
        self.assign_driver(booking.trip_id, driver_id, override_min_seats).await
    }

    /// Despacha los viajes con el mínimo cubierto que salen dentro del margen configurado
    pub async fn auto_dispatch(&self) -> AppResult<AutoDispatchReport> {
        let horizon = self.clock.now() + self.dispatch_lead;
        let ready: Vec<Trip> = self
            .ledgers
            .repository()
            .open_trips()
            .await?
            .into_iter()
            .filter(|t| t.meets_min_seats() && t.scheduled_departure <= horizon)
            .collect();

        let mut report = AutoDispatchReport::default();
        for trip in ready {
            match self.try_assign(trip.id, None, false).await {
                Ok(Some(dispatched)) => report.dispatched.push(DispatchAssignment {
                    trip_id: dispatched.id,
                    driver_id: dispatched.driver_id.unwrap_or_default(),
                }),
                Ok(None) => {
                    log::warn!(
                        "⚠️ Sin conductor disponible para el viaje {} ({} → {}), requiere seguimiento manual",
                        trip.id,
                        trip.origin_name,
                        trip.destination_name
                    );
                    report.pending.push(trip.id);
                }
                Err(AppError::InvalidStateTransition(reason)) => {
                    log::debug!("Viaje {} omitido en auto-despacho: {}", trip.id, reason);
                }
                Err(e) => {
                    log::warn!("⚠️ Auto-despacho del viaje {} fallido: {}", trip.id, e);
                    report.pending.push(trip.id);
                }
            }
        }

        if !report.dispatched.is_empty() || !report.pending.is_empty() {
            log::info!(
                "📋 Auto-despacho: {} despachados, {} pendientes",
                report.dispatched.len(),
                report.pending.len()
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::fixtures;
    use chrono::Utc;

    fn driver(lat: Option<f64>, lng: Option<f64>) -> Driver {
        let now = Utc::now();
        Driver {
            id: Uuid::new_v4(),
            full_name: "Ravi Kumar".to_string(),
            phone: "+919876543210".to_string(),
            vehicle_number: "KA01AB1234".to_string(),
            is_available: true,
            current_lat: lat,
            current_lng: lng,
            current_trip_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_haversine_known_distance() {
        // Bengaluru → Mysuru, ~128 km en línea recta
        let d = haversine_km((12.9716, 77.5946), (12.2958, 76.6394));
        assert!((d - 128.0).abs() < 5.0, "got {}", d);
        assert!(haversine_km((10.0, 10.0), (10.0, 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_nearest_prefers_closest_known_position() {
        let trip = fixtures::trip(Utc::now());
        let far = driver(Some(13.3), Some(77.1));
        let near = driver(Some(12.98), Some(77.6));
        let unknown = driver(None, None);
        let mut busy = driver(Some(12.9716), Some(77.5946));
        busy.is_available = false;

        let pick = NearestAvailable.select(
            &trip,
            Some((12.9716, 77.5946)),
            &[far.clone(), unknown.clone(), busy, near.clone()],
        );
        assert_eq!(pick, Some(near.id));
        assert_eq!(NearestAvailable.select(&trip, Some((12.9716, 77.5946)), &[unknown.clone()]), Some(unknown.id));
        assert_eq!(NearestAvailable.select(&trip, None, &[]), None);
    }

    #[test]
    fn test_round_robin_rotates() {
        let trip = fixtures::trip(Utc::now());
        let drivers = vec![driver(None, None), driver(None, None)];
        let strategy = RoundRobin::default();
        let first = strategy.select(&trip, None, &drivers).unwrap();
        let second = strategy.select(&trip, None, &drivers).unwrap();
        let third = strategy.select(&trip, None, &drivers).unwrap();
        assert_ne!(first, second);
        assert_eq!(first, third);
    }

    #[tokio::test]
    async fn test_trip_origin_follows_direction_after_route_rename() {
        use crate::models::route::{GeoPoint, Route};
        use crate::repositories::Repositories;
        use crate::utils::clock::SystemClock;
        use rust_decimal::Decimal;

        let repos = Repositories::in_memory();
        let now = Utc::now();
        let route = Route {
            id: Uuid::new_v4(),
            origin: GeoPoint { name: "Bangalore City".into(), lat: 12.97, lng: 77.59 },
            destination: GeoPoint { name: "Mysore".into(), lat: 12.29, lng: 76.64 },
            distance_km: 145.0,
            duration_minutes: 180,
            price_multiplier: Decimal::ONE,
            is_bidirectional: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        repos.routes.insert(&route).await.unwrap();

        let coordinator = DispatchCoordinator::new(
            Arc::new(TripLedgers::new(repos.trips)),
            repos.drivers,
            repos.routes,
            StrategyKind::Nearest.build(),
            Duration::minutes(60),
            Arc::new(SystemClock),
        );

        // El viaje guarda los nombres anteriores al cambio de nombre de la ruta
        let mut trip = fixtures::trip(now);
        trip.route_id = route.id;
        assert_eq!(coordinator.trip_origin(&trip).await.unwrap(), Some((12.97, 77.59)));

        trip.reverse = true;
        assert_eq!(coordinator.trip_origin(&trip).await.unwrap(), Some((12.29, 76.64)));
    }

    #[test]
    fn test_strategy_kind_parse() {
        assert_eq!("nearest".parse::<StrategyKind>(), Ok(StrategyKind::Nearest));
        assert_eq!("ROUND_ROBIN".parse::<StrategyKind>(), Ok(StrategyKind::RoundRobin));
        assert!("random".parse::<StrategyKind>().is_err());
        assert_eq!(StrategyKind::RoundRobin.build().name(), "round_robin");
    }
}
