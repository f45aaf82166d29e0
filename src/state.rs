//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum: configuración, reloj y servicios.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::Repositories;
use crate::services::{
    BookingManager, DashboardService, DispatchCoordinator, DriverService, PricingConfigService, RouteService,
    TripLedgers, TripScheduler, VehicleConfigService,
};
use crate::utils::clock::Clock;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub clock: Arc<dyn Clock>,
    pub vehicle_configs: Arc<VehicleConfigService>,
    pub routes: Arc<RouteService>,
    pub pricing: Arc<PricingConfigService>,
    pub drivers: Arc<DriverService>,
    pub trips: Arc<TripScheduler>,
    pub bookings: Arc<BookingManager>,
    pub dispatch: Arc<DispatchCoordinator>,
    pub dashboard: Arc<DashboardService>,
}

impl AppState {
    pub fn new(repositories: Repositories, config: EnvironmentConfig, clock: Arc<dyn Clock>) -> Self {
        let ledgers = Arc::new(TripLedgers::new(repositories.trips.clone()));
        let pricing = Arc::new(PricingConfigService::new(repositories.pricing.clone(), clock.clone()));

        let trips = Arc::new(TripScheduler::new(
            ledgers.clone(),
            repositories.vehicle_configs.clone(),
            repositories.routes.clone(),
            repositories.drivers.clone(),
            pricing.clone(),
            clock.clone(),
        ));
        let bookings = Arc::new(BookingManager::new(
            ledgers.clone(),
            config.refund_policy.clone(),
            config.hold_ttl(),
            clock.clone(),
        ));
        let dispatch = Arc::new(DispatchCoordinator::new(
            ledgers,
            repositories.drivers.clone(),
            repositories.routes.clone(),
            config.dispatch_strategy.build(),
            config.dispatch_lead(),
            clock.clone(),
        ));
        let dashboard = Arc::new(DashboardService::new(
            repositories.trips.clone(),
            repositories.drivers.clone(),
            repositories.vehicle_configs.clone(),
            repositories.routes.clone(),
        ));

        Self {
            vehicle_configs: Arc::new(VehicleConfigService::new(repositories.vehicle_configs.clone(), clock.clone())),
            routes: Arc::new(RouteService::new(repositories.routes.clone(), clock.clone())),
            drivers: Arc::new(DriverService::new(repositories.drivers, clock.clone())),
            config: Arc::new(config),
            clock,
            pricing,
            trips,
            bookings,
            dispatch,
            dashboard,
        }
    }
}
