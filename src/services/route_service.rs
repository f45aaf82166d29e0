//! Catálogo de rutas
//!
//! Alta, edición, baja lógica y búsqueda por nombre de origen/destino
//! (sin distinguir mayúsculas; las rutas bidireccionales casan en ambos sentidos).

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::dto::catalog_dto::{CreateRouteRequest, RouteLookupQuery, RouteMatch, UpdateRouteRequest};
use crate::models::route::{GeoPoint, Route};
use crate::repositories::{PageWindow, RouteRepository};
use crate::utils::clock::Clock;
use crate::utils::errors::{not_found_error, AppResult};
use crate::utils::validation::{check, validate_coordinates, validate_not_empty, validate_positive};

/// Precisión de la columna `price_multiplier` (NUMERIC(8, 4))
const MULTIPLIER_SCALE: u32 = 4;
const MULTIPLIER_LIMIT: i64 = 10_000;

pub struct RouteService {
    repository: Arc<dyn RouteRepository>,
    clock: Arc<dyn Clock>,
}

fn normalize(point: GeoPoint) -> GeoPoint {
    GeoPoint { name: point.name.trim().to_string(), ..point }
}

impl RouteService {
    pub fn new(repository: Arc<dyn RouteRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    fn validate_route(route: &Route) -> AppResult<()> {
        check("origin", validate_not_empty(&route.origin.name))?;
        check("destination", validate_not_empty(&route.destination.name))?;
        check("origin", validate_coordinates(route.origin.lat, route.origin.lng))?;
        check("destination", validate_coordinates(route.destination.lat, route.destination.lng))?;
        if route.origin.name.eq_ignore_ascii_case(&route.destination.name) {
            check("destination", Err(ValidationError::new("same_as_origin")))?;
        }
        check("distance_km", validate_positive(route.distance_km))?;
        check("duration_minutes", validate_positive(route.duration_minutes))?;
        check("price_multiplier", validate_positive(route.price_multiplier))?;
        if route.price_multiplier.normalize().scale() > MULTIPLIER_SCALE
            || route.price_multiplier >= Decimal::from(MULTIPLIER_LIMIT)
        {
            check("price_multiplier", Err(ValidationError::new("precision")))?;
        }
        Ok(())
    }

    pub async fn create(&self, request: CreateRouteRequest) -> AppResult<Route> {
        request.validate()?;

        let now = self.clock.now();
        let route = Route {
            id: Uuid::new_v4(),
            origin: normalize(request.origin),
            destination: normalize(request.destination),
            distance_km: request.distance_km,
            duration_minutes: request.duration_minutes,
            price_multiplier: request.price_multiplier.unwrap_or(Decimal::ONE),
            is_bidirectional: request.is_bidirectional.unwrap_or(true),
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        Self::validate_route(&route)?;
        self.repository.insert(&route).await?;

        log::info!("✅ Ruta creada: {} → {}", route.origin.name, route.destination.name);
        Ok(route)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Route> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Route", &id.to_string()))
    }

    pub async fn list(&self, include_inactive: bool, window: PageWindow) -> AppResult<(Vec<Route>, i64)> {
        self.repository.list(include_inactive, window).await
    }

    pub async fn update(&self, id: Uuid, request: UpdateRouteRequest) -> AppResult<Route> {
        request.validate()?;
        let mut route = self.get(id).await?;

        if let Some(origin) = request.origin {
            route.origin = normalize(origin);
        }
        if let Some(destination) = request.destination {
            route.destination = normalize(destination);
        }
        if let Some(distance_km) = request.distance_km {
            route.distance_km = distance_km;
        }
        if let Some(duration_minutes) = request.duration_minutes {
            route.duration_minutes = duration_minutes;
        }
        if let Some(price_multiplier) = request.price_multiplier {
            route.price_multiplier = price_multiplier;
        }
        if let Some(is_bidirectional) = request.is_bidirectional {
            route.is_bidirectional = is_bidirectional;
        }
        if let Some(is_active) = request.is_active {
            route.is_active = is_active;
        }
        route.updated_at = self.clock.now();

        Self::validate_route(&route)?;
        self.repository.update(&route).await?;

        log::info!("✅ Ruta actualizada: {}", route.id);
        Ok(route)
    }

    pub async fn deactivate(&self, id: Uuid) -> AppResult<Route> {
        let mut route = self.get(id).await?;
        route.is_active = false;
        route.updated_at = self.clock.now();
        self.repository.update(&route).await?;

        log::info!("🗑️ Ruta desactivada: {}", route.id);
        Ok(route)
    }

    /// Buscar una ruta activa por nombres; prefiere el sentido directo
    pub async fn lookup(&self, query: RouteLookupQuery) -> AppResult<RouteMatch> {
        query.validate()?;
        let (routes, _) = self.repository.list(false, PageWindow::all()).await?;

        let mut matches: Vec<RouteMatch> = routes
            .into_iter()
            .filter_map(|route| {
                route
                    .matches(&query.origin, &query.destination)
                    .map(|reverse| RouteMatch { route, reverse })
            })
            .collect();
        matches.sort_by_key(|m| m.reverse);

        matches.into_iter().next().ok_or_else(|| {
            not_found_error("Route", &format!("{} → {}", query.origin.trim(), query.destination.trim()))
        })
    }
}
