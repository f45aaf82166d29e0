use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::vehicle_config::{VehicleConfig, VehicleType};
use crate::repositories::{parse_column, PageWindow, VehicleConfigRepository};
use crate::utils::errors::AppResult;

// Fila de la tabla vehicle_configs
#[derive(Debug, sqlx::FromRow)]
struct VehicleConfigRow {
    id: Uuid,
    vehicle_type: String,
    display_name: String,
    total_price: Decimal,
    min_seats: i32,
    max_seats: i32,
    display_order: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VehicleConfigRow> for VehicleConfig {
    type Error = sqlx::Error;

    fn try_from(row: VehicleConfigRow) -> Result<Self, Self::Error> {
        Ok(VehicleConfig {
            id: row.id,
            vehicle_type: parse_column::<VehicleType>(&row.vehicle_type)?,
            display_name: row.display_name,
            total_price: row.total_price,
            min_seats: row.min_seats,
            max_seats: row.max_seats,
            display_order: row.display_order,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgVehicleConfigRepository {
    pool: PgPool,
}

impl PgVehicleConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleConfigRepository for PgVehicleConfigRepository {
    async fn insert(&self, config: &VehicleConfig) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicle_configs (
                id, vehicle_type, display_name, total_price, min_seats, max_seats,
                display_order, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(config.id)
        .bind(config.vehicle_type.as_str())
        .bind(&config.display_name)
        .bind(config.total_price)
        .bind(config.min_seats)
        .bind(config.max_seats)
        .bind(config.display_order)
        .bind(config.is_active)
        .bind(config.created_at)
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, config: &VehicleConfig) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE vehicle_configs
            SET vehicle_type = $2, display_name = $3, total_price = $4, min_seats = $5,
                max_seats = $6, display_order = $7, is_active = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(config.id)
        .bind(config.vehicle_type.as_str())
        .bind(&config.display_name)
        .bind(config.total_price)
        .bind(config.min_seats)
        .bind(config.max_seats)
        .bind(config.display_order)
        .bind(config.is_active)
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<VehicleConfig>> {
        let row = sqlx::query_as::<_, VehicleConfigRow>("SELECT * FROM vehicle_configs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(VehicleConfig::try_from).transpose()?)
    }

    async fn find_by_type(&self, vehicle_type: VehicleType) -> AppResult<Option<VehicleConfig>> {
        let row = sqlx::query_as::<_, VehicleConfigRow>(
            "SELECT * FROM vehicle_configs WHERE vehicle_type = $1 LIMIT 1",
        )
        .bind(vehicle_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VehicleConfig::try_from).transpose()?)
    }

    async fn list(&self, include_inactive: bool, window: PageWindow) -> AppResult<(Vec<VehicleConfig>, i64)> {
        let rows = sqlx::query_as::<_, VehicleConfigRow>(
            r#"
            SELECT * FROM vehicle_configs
            WHERE ($1 OR is_active)
            ORDER BY display_order, display_name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(include_inactive)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM vehicle_configs WHERE ($1 OR is_active)")
                .bind(include_inactive)
                .fetch_one(&self.pool)
                .await?;

        let configs = rows
            .into_iter()
            .map(VehicleConfig::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((configs, total))
    }
}
