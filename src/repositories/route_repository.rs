use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::route::{GeoPoint, Route};
use crate::repositories::{PageWindow, RouteRepository};
use crate::utils::errors::AppResult;

// Fila de la tabla routes
#[derive(Debug, sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
    origin_name: String,
    origin_lat: f64,
    origin_lng: f64,
    destination_name: String,
    destination_lat: f64,
    destination_lng: f64,
    distance_km: f64,
    duration_minutes: i32,
    price_multiplier: Decimal,
    is_bidirectional: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Route {
            id: row.id,
            origin: GeoPoint { name: row.origin_name, lat: row.origin_lat, lng: row.origin_lng },
            destination: GeoPoint {
                name: row.destination_name,
                lat: row.destination_lat,
                lng: row.destination_lng,
            },
            distance_km: row.distance_km,
            duration_minutes: row.duration_minutes,
            price_multiplier: row.price_multiplier,
            is_bidirectional: row.is_bidirectional,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgRouteRepository {
    pool: PgPool,
}

impl PgRouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RouteRepository for PgRouteRepository {
    async fn insert(&self, route: &Route) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO routes (
                id, origin_name, origin_lat, origin_lng, destination_name, destination_lat,
                destination_lng, distance_km, duration_minutes, price_multiplier,
                is_bidirectional, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(route.id)
        .bind(&route.origin.name)
        .bind(route.origin.lat)
        .bind(route.origin.lng)
        .bind(&route.destination.name)
        .bind(route.destination.lat)
        .bind(route.destination.lng)
        .bind(route.distance_km)
        .bind(route.duration_minutes)
        .bind(route.price_multiplier)
        .bind(route.is_bidirectional)
        .bind(route.is_active)
        .bind(route.created_at)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, route: &Route) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE routes
            SET origin_name = $2, origin_lat = $3, origin_lng = $4, destination_name = $5,
                destination_lat = $6, destination_lng = $7, distance_km = $8,
                duration_minutes = $9, price_multiplier = $10, is_bidirectional = $11,
                is_active = $12, updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(route.id)
        .bind(&route.origin.name)
        .bind(route.origin.lat)
        .bind(route.origin.lng)
        .bind(&route.destination.name)
        .bind(route.destination.lat)
        .bind(route.destination.lng)
        .bind(route.distance_km)
        .bind(route.duration_minutes)
        .bind(route.price_multiplier)
        .bind(route.is_bidirectional)
        .bind(route.is_active)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>("SELECT * FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Route::from))
    }

    async fn list(&self, include_inactive: bool, window: PageWindow) -> AppResult<(Vec<Route>, i64)> {
        let rows = sqlx::query_as::<_, RouteRow>(
            r#"
            SELECT * FROM routes
            WHERE ($1 OR is_active)
            ORDER BY origin_name, destination_name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(include_inactive)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM routes WHERE ($1 OR is_active)")
            .bind(include_inactive)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Route::from).collect(), total))
    }
}
