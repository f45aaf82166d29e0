//! Resumen para la consola de operaciones

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::booking::BookingStatus;
use crate::models::trip::TripStatus;
use crate::repositories::{DriverRepository, PageWindow, RouteRepository, TripRepository, VehicleConfigRepository};
use crate::utils::errors::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub trips_by_status: BTreeMap<String, i64>,
    pub bookings_by_status: BTreeMap<String, i64>,
    pub open_trips: i64,
    pub available_drivers: i64,
    pub active_vehicle_configs: i64,
    pub active_routes: i64,
}

pub struct DashboardService {
    trips: Arc<dyn TripRepository>,
    drivers: Arc<dyn DriverRepository>,
    vehicle_configs: Arc<dyn VehicleConfigRepository>,
    routes: Arc<dyn RouteRepository>,
}

impl DashboardService {
    pub fn new(
        trips: Arc<dyn TripRepository>,
        drivers: Arc<dyn DriverRepository>,
        vehicle_configs: Arc<dyn VehicleConfigRepository>,
        routes: Arc<dyn RouteRepository>,
    ) -> Self {
        Self { trips, drivers, vehicle_configs, routes }
    }

    pub async fn stats(&self) -> AppResult<DashboardStats> {
        let mut trips_by_status: BTreeMap<String, i64> =
            TripStatus::ALL.iter().map(|s| (s.as_str().to_string(), 0)).collect();
        for (status, count) in self.trips.trip_status_counts().await? {
            trips_by_status.insert(status.as_str().to_string(), count);
        }

        let mut bookings_by_status: BTreeMap<String, i64> =
            BookingStatus::ALL.iter().map(|s| (s.as_str().to_string(), 0)).collect();
        for (status, count) in self.trips.booking_status_counts().await? {
            bookings_by_status.insert(status.as_str().to_string(), count);
        }

        let open_trips = [TripStatus::Scheduled, TripStatus::Filling]
            .iter()
            .map(|s| trips_by_status.get(s.as_str()).copied().unwrap_or(0))
            .sum();

        let available_drivers = self.drivers.list_available().await?.len() as i64;
        let (_, active_vehicle_configs) = self.vehicle_configs.list(false, PageWindow { limit: 1, offset: 0 }).await?;
        let (_, active_routes) = self.routes.list(false, PageWindow { limit: 1, offset: 0 }).await?;

        Ok(DashboardStats {
            trips_by_status,
            bookings_by_status,
            open_trips,
            available_drivers,
            active_vehicle_configs,
            active_routes,
        })
    }
}
