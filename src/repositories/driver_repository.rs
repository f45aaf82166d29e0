use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::driver::Driver;
use crate::repositories::{DriverRepository, PageWindow};
use crate::utils::errors::AppResult;

pub struct PgDriverRepository {
    pool: PgPool,
}

impl PgDriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriverRepository for PgDriverRepository {
    async fn insert(&self, driver: &Driver) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO drivers (
                id, full_name, phone, vehicle_number, is_available, current_lat, current_lng,
                current_trip_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(driver.id)
        .bind(&driver.full_name)
        .bind(&driver.phone)
        .bind(&driver.vehicle_number)
        .bind(driver.is_available)
        .bind(driver.current_lat)
        .bind(driver.current_lng)
        .bind(driver.current_trip_id)
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(driver)
    }

    async fn list(&self, window: PageWindow) -> AppResult<(Vec<Driver>, i64)> {
        let drivers = sqlx::query_as::<_, Driver>(
            "SELECT * FROM drivers ORDER BY full_name LIMIT $1 OFFSET $2",
        )
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM drivers")
            .fetch_one(&self.pool)
            .await?;

        Ok((drivers, total))
    }

    async fn list_available(&self) -> AppResult<Vec<Driver>> {
        let drivers = sqlx::query_as::<_, Driver>(
            "SELECT * FROM drivers WHERE is_available AND current_trip_id IS NULL ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(drivers)
    }

    async fn update_availability(
        &self,
        id: Uuid,
        is_available: bool,
        position: Option<(f64, f64)>,
    ) -> AppResult<Option<Driver>> {
        let (lat, lng) = position.unzip();
        let driver = sqlx::query_as::<_, Driver>(
            r#"
            UPDATE drivers
            SET is_available = $2,
                current_lat = COALESCE($3, current_lat),
                current_lng = COALESCE($4, current_lng),
                updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(is_available)
        .bind(lat)
        .bind(lng)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(driver)
    }

    async fn claim(&self, id: Uuid, trip_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE drivers
            SET is_available = FALSE, current_trip_id = $2, updated_at = $3
            WHERE id = $1 AND is_available AND current_trip_id IS NULL
            "#,
        )
        .bind(id)
        .bind(trip_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, id: Uuid, trip_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE drivers
            SET is_available = TRUE, current_trip_id = NULL, updated_at = $3
            WHERE id = $1 AND current_trip_id = $2
            "#,
        )
        .bind(id)
        .bind(trip_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
