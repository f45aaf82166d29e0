//! Repositorios
//!
//! Cada entidad tiene un trait de persistencia con dos implementaciones:
//! PostgreSQL (sqlx) y memoria (cuando no hay `DATABASE_URL`, y en tests).
//! El viaje y sus reservas se guardan juntos como `TripLedger`.

pub mod driver_repository;
pub mod memory;
pub mod pricing_config_repository;
pub mod route_repository;
pub mod trip_repository;
pub mod vehicle_config_repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus};
use crate::models::driver::Driver;
use crate::models::pricing::PricingConfig;
use crate::models::route::Route;
use crate::models::trip::{Trip, TripStatus};
use crate::models::trip_ledger::TripLedger;
use crate::models::vehicle_config::{VehicleConfig, VehicleType};
use crate::utils::errors::AppResult;

pub use driver_repository::PgDriverRepository;
pub use memory::InMemoryStore;
pub use pricing_config_repository::PgPricingConfigRepository;
pub use route_repository::PgRouteRepository;
pub use trip_repository::PgTripRepository;
pub use vehicle_config_repository::PgVehicleConfigRepository;

/// Ventana de paginación ya resuelta (limit/offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

impl PageWindow {
    pub fn all() -> Self {
        Self { limit: i64::MAX, offset: 0 }
    }

    pub(crate) fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let offset = usize::try_from(self.offset).unwrap_or(0);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.iter().skip(offset).take(limit).cloned().collect()
    }
}

/// Filtros para el listado de reservas
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub trip_id: Option<Uuid>,
}

#[async_trait]
pub trait VehicleConfigRepository: Send + Sync {
    async fn insert(&self, config: &VehicleConfig) -> AppResult<()>;
    async fn update(&self, config: &VehicleConfig) -> AppResult<()>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VehicleConfig>>;
    async fn find_by_type(&self, vehicle_type: VehicleType) -> AppResult<Option<VehicleConfig>>;
    /// Ordenado por `display_order`
    async fn list(&self, include_inactive: bool, window: PageWindow) -> AppResult<(Vec<VehicleConfig>, i64)>;
}

#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn insert(&self, route: &Route) -> AppResult<()>;
    async fn update(&self, route: &Route) -> AppResult<()>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Route>>;
    async fn list(&self, include_inactive: bool, window: PageWindow) -> AppResult<(Vec<Route>, i64)>;
}

#[async_trait]
pub trait PricingConfigRepository: Send + Sync {
    async fn current(&self) -> AppResult<Option<PricingConfig>>;
    async fn save(&self, config: &PricingConfig) -> AppResult<()>;
}

#[async_trait]
pub trait DriverRepository: Send + Sync {
    async fn insert(&self, driver: &Driver) -> AppResult<()>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>>;
    async fn list(&self, window: PageWindow) -> AppResult<(Vec<Driver>, i64)>;
    async fn list_available(&self) -> AppResult<Vec<Driver>>;
    async fn update_availability(
        &self,
        id: Uuid,
        is_available: bool,
        position: Option<(f64, f64)>,
    ) -> AppResult<Option<Driver>>;
    /// Marca al conductor como ocupado con el viaje si sigue libre. `false` si ya no lo está.
    async fn claim(&self, id: Uuid, trip_id: Uuid) -> AppResult<bool>;
    /// Libera al conductor si sigue asignado a ese viaje
    async fn release(&self, id: Uuid, trip_id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn insert(&self, ledger: &TripLedger) -> AppResult<()>;
    async fn load(&self, trip_id: Uuid) -> AppResult<Option<TripLedger>>;
    /// Persiste viaje y reservas de forma atómica si la versión guardada es `expected_version`
    async fn save(&self, ledger: &TripLedger, expected_version: i64) -> AppResult<()>;
    async fn list_trips(&self, status: Option<TripStatus>, window: PageWindow) -> AppResult<(Vec<Trip>, i64)>;
    /// Viajes en SCHEDULED o FILLING, por hora de salida
    async fn open_trips(&self) -> AppResult<Vec<Trip>>;
    async fn find_booking(&self, booking_id: Uuid) -> AppResult<Option<Booking>>;
    async fn list_bookings(&self, filter: &BookingFilter, window: PageWindow) -> AppResult<(Vec<Booking>, i64)>;
    async fn trips_with_expired_holds(&self, now: DateTime<Utc>) -> AppResult<Vec<Uuid>>;
    async fn trip_status_counts(&self) -> AppResult<Vec<(TripStatus, i64)>>;
    async fn booking_status_counts(&self) -> AppResult<Vec<(BookingStatus, i64)>>;
}

/// Conjunto de repositorios que comparten los servicios
#[derive(Clone)]
pub struct Repositories {
    pub vehicle_configs: Arc<dyn VehicleConfigRepository>,
    pub routes: Arc<dyn RouteRepository>,
    pub pricing: Arc<dyn PricingConfigRepository>,
    pub drivers: Arc<dyn DriverRepository>,
    pub trips: Arc<dyn TripRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::default());
        Self {
            vehicle_configs: store.clone(),
            routes: store.clone(),
            pricing: store.clone(),
            drivers: store.clone(),
            trips: store,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            vehicle_configs: Arc::new(PgVehicleConfigRepository::new(pool.clone())),
            routes: Arc::new(PgRouteRepository::new(pool.clone())),
            pricing: Arc::new(PgPricingConfigRepository::new(pool.clone())),
            drivers: Arc::new(PgDriverRepository::new(pool.clone())),
            trips: Arc::new(PgTripRepository::new(pool)),
        }
    }
}

/// Convierte una columna de texto en enum, tratando valores desconocidos como error de datos
pub(crate) fn parse_column<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T, sqlx::Error> {
    value.parse::<T>().map_err(|e| sqlx::Error::Decode(e.into()))
}
