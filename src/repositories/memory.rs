//! Almacenamiento en memoria
//!
//! Implementa todos los traits de repositorio sobre mapas protegidos con
//! `tokio::sync::RwLock`. Se usa cuando no hay base de datos configurada y en tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus};
use crate::models::driver::Driver;
use crate::models::pricing::PricingConfig;
use crate::models::route::Route;
use crate::models::trip::{Trip, TripStatus};
use crate::models::trip_ledger::TripLedger;
use crate::models::vehicle_config::{VehicleConfig, VehicleType};
use crate::repositories::{
    BookingFilter, DriverRepository, PageWindow, PricingConfigRepository, RouteRepository,
    TripRepository, VehicleConfigRepository,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Default)]
pub struct InMemoryStore {
    vehicle_configs: RwLock<HashMap<Uuid, VehicleConfig>>,
    routes: RwLock<HashMap<Uuid, Route>>,
    pricing: RwLock<Option<PricingConfig>>,
    drivers: RwLock<HashMap<Uuid, Driver>>,
    trips: RwLock<TripTables>,
}

#[derive(Default)]
struct TripTables {
    ledgers: HashMap<Uuid, TripLedger>,
    /// booking_id → trip_id
    booking_index: HashMap<Uuid, Uuid>,
}

fn paginate<T: Clone>(items: Vec<T>, window: PageWindow) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    (window.slice(&items), total)
}

#[async_trait]
impl VehicleConfigRepository for InMemoryStore {
    async fn insert(&self, config: &VehicleConfig) -> AppResult<()> {
        self.vehicle_configs.write().await.insert(config.id, config.clone());
        Ok(())
    }

    async fn update(&self, config: &VehicleConfig) -> AppResult<()> {
        let mut configs = self.vehicle_configs.write().await;
        match configs.get_mut(&config.id) {
            Some(existing) => {
                *existing = config.clone();
                Ok(())
            }
            None => Err(not_found_error("Vehicle config", &config.id.to_string())),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VehicleConfig>> {
        Ok(self.vehicle_configs.read().await.get(&id).cloned())
    }

    async fn find_by_type(&self, vehicle_type: VehicleType) -> AppResult<Option<VehicleConfig>> {
        Ok(self
            .vehicle_configs
            .read()
            .await
            .values()
            .find(|c| c.vehicle_type == vehicle_type)
            .cloned())
    }

    async fn list(&self, include_inactive: bool, window: PageWindow) -> AppResult<(Vec<VehicleConfig>, i64)> {
        let mut configs: Vec<VehicleConfig> = self
            .vehicle_configs
            .read()
            .await
            .values()
            .filter(|c| include_inactive || c.is_active)
            .cloned()
            .collect();
        configs.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        Ok(paginate(configs, window))
    }
}

#[async_trait]
impl RouteRepository for InMemoryStore {
    async fn insert(&self, route: &Route) -> AppResult<()> {
        self.routes.write().await.insert(route.id, route.clone());
        Ok(())
    }

    async fn update(&self, route: &Route) -> AppResult<()> {
        let mut routes = self.routes.write().await;
        match routes.get_mut(&route.id) {
            Some(existing) => {
                *existing = route.clone();
                Ok(())
            }
            None => Err(not_found_error("Route", &route.id.to_string())),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Route>> {
        Ok(self.routes.read().await.get(&id).cloned())
    }

    async fn list(&self, include_inactive: bool, window: PageWindow) -> AppResult<(Vec<Route>, i64)> {
        let mut routes: Vec<Route> = self
            .routes
            .read()
            .await
            .values()
            .filter(|r| include_inactive || r.is_active)
            .cloned()
            .collect();
        routes.sort_by(|a, b| {
            a.origin
                .name
                .cmp(&b.origin.name)
                .then_with(|| a.destination.name.cmp(&b.destination.name))
        });
        Ok(paginate(routes, window))
    }
}

#[async_trait]
impl PricingConfigRepository for InMemoryStore {
    async fn current(&self) -> AppResult<Option<PricingConfig>> {
        Ok(self.pricing.read().await.clone())
    }

    async fn save(&self, config: &PricingConfig) -> AppResult<()> {
        *self.pricing.write().await = Some(config.clone());
        Ok(())
    }
}

#[async_trait]
impl DriverRepository for InMemoryStore {
    async fn insert(&self, driver: &Driver) -> AppResult<()> {
        self.drivers.write().await.insert(driver.id, driver.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(self.drivers.read().await.get(&id).cloned())
    }

    async fn list(&self, window: PageWindow) -> AppResult<(Vec<Driver>, i64)> {
        let mut drivers: Vec<Driver> = self.drivers.read().await.values().cloned().collect();
        drivers.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(paginate(drivers, window))
    }

    async fn list_available(&self) -> AppResult<Vec<Driver>> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .read()
            .await
            .values()
            .filter(|d| d.can_take_trip())
            .cloned()
            .collect();
        drivers.sort_by_key(|d| d.created_at);
        Ok(drivers)
    }

    async fn update_availability(
        &self,
        id: Uuid,
        is_available: bool,
        position: Option<(f64, f64)>,
    ) -> AppResult<Option<Driver>> {
        let mut drivers = self.drivers.write().await;
        Ok(drivers.get_mut(&id).map(|driver| {
            driver.is_available = is_available;
            if let Some((lat, lng)) = position {
                driver.current_lat = Some(lat);
                driver.current_lng = Some(lng);
            }
            driver.updated_at = Utc::now();
            driver.clone()
        }))
    }

    async fn claim(&self, id: Uuid, trip_id: Uuid) -> AppResult<bool> {
        let mut drivers = self.drivers.write().await;
        match drivers.get_mut(&id) {
            Some(driver) if driver.can_take_trip() => {
                driver.is_available = false;
                driver.current_trip_id = Some(trip_id);
                driver.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, id: Uuid, trip_id: Uuid) -> AppResult<()> {
        let mut drivers = self.drivers.write().await;
        if let Some(driver) = drivers.get_mut(&id) {
            if driver.current_trip_id == Some(trip_id) {
                driver.is_available = true;
                driver.current_trip_id = None;
                driver.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TripRepository for InMemoryStore {
    async fn insert(&self, ledger: &TripLedger) -> AppResult<()> {
        let mut tables = self.trips.write().await;
        if tables.ledgers.contains_key(&ledger.trip.id) {
            return Err(AppError::Conflict(format!("Trip {} already exists", ledger.trip.id)));
        }
        for booking in &ledger.bookings {
            tables.booking_index.insert(booking.id, ledger.trip.id);
        }
        tables.ledgers.insert(ledger.trip.id, ledger.clone());
        Ok(())
    }

    async fn load(&self, trip_id: Uuid) -> AppResult<Option<TripLedger>> {
        Ok(self.trips.read().await.ledgers.get(&trip_id).cloned())
    }

    async fn save(&self, ledger: &TripLedger, expected_version: i64) -> AppResult<()> {
        let mut tables = self.trips.write().await;
        let stored_version = tables
            .ledgers
            .get(&ledger.trip.id)
            .map(|stored| stored.trip.version)
            .ok_or_else(|| not_found_error("Trip", &ledger.trip.id.to_string()))?;

        if stored_version != expected_version {
            return Err(AppError::Conflict(format!(
                "Trip {} was modified concurrently (version {} != {})",
                ledger.trip.id, stored_version, expected_version
            )));
        }

        for booking in &ledger.bookings {
            tables.booking_index.insert(booking.id, ledger.trip.id);
        }
        tables.ledgers.insert(ledger.trip.id, ledger.clone());
        Ok(())
    }

    async fn list_trips(&self, status: Option<TripStatus>, window: PageWindow) -> AppResult<(Vec<Trip>, i64)> {
        let mut trips: Vec<Trip> = self
            .trips
            .read()
            .await
            .ledgers
            .values()
            .map(|l| &l.trip)
            .filter(|t| status.map(|s| t.status == s).unwrap_or(true))
            .cloned()
            .collect();
        trips.sort_by_key(|t| (t.scheduled_departure, t.created_at));
        Ok(paginate(trips, window))
    }

    async fn open_trips(&self) -> AppResult<Vec<Trip>> {
        let mut trips: Vec<Trip> = self
            .trips
            .read()
            .await
            .ledgers
            .values()
            .map(|l| &l.trip)
            .filter(|t| t.status.is_open())
            .cloned()
            .collect();
        trips.sort_by_key(|t| t.scheduled_departure);
        Ok(trips)
    }

    async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>> {
        let tables = self.trips.read().await;
        Ok(tables
            .booking_index
            .get(&booking_id)
            .and_then(|trip_id| tables.ledgers.get(trip_id))
            .and_then(|ledger| ledger.bookings.iter().find(|b| b.id == booking_id))
            .cloned())
    }

    async fn list_bookings(&self, filter: &BookingFilter, window: PageWindow) -> AppResult<(Vec<Booking>, i64)> {
        let tables = self.trips.read().await;
        let mut bookings: Vec<Booking> = tables
            .ledgers
            .values()
            .filter(|l| filter.trip_id.map(|id| l.trip.id == id).unwrap_or(true))
            .flat_map(|l| l.bookings.iter())
            .filter(|b| filter.status.map(|s| b.status == s).unwrap_or(true))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(paginate(bookings, window))
    }

    async fn trips_with_expired_holds(&self, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        Ok(self
            .trips
            .read()
            .await
            .ledgers
            .values()
            .filter(|l| l.bookings.iter().any(|b| b.hold_expired(now)))
            .map(|l| l.trip.id)
            .collect())
    }

    async fn trip_status_counts(&self) -> AppResult<Vec<(TripStatus, i64)>> {
        let tables = self.trips.read().await;
        let mut counts: HashMap<TripStatus, i64> = HashMap::new();
        for ledger in tables.ledgers.values() {
            *counts.entry(ledger.trip.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn booking_status_counts(&self) -> AppResult<Vec<(BookingStatus, i64)>> {
        let tables = self.trips.read().await;
        let mut counts: HashMap<BookingStatus, i64> = HashMap::new();
        for booking in tables.ledgers.values().flat_map(|l| l.bookings.iter()) {
            *counts.entry(booking.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}
