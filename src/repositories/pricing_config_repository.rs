use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::pricing::PricingConfig;
use crate::repositories::PricingConfigRepository;
use crate::utils::errors::AppResult;

/// Fila única (id = 1) con la configuración serializada en JSONB
pub struct PgPricingConfigRepository {
    pool: PgPool,
}

impl PgPricingConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PricingConfigRepository for PgPricingConfigRepository {
    async fn current(&self) -> AppResult<Option<PricingConfig>> {
        let row: Option<(Json<PricingConfig>,)> =
            sqlx::query_as("SELECT config FROM pricing_config WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(Json(config),)| config))
    }

    async fn save(&self, config: &PricingConfig) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pricing_config (id, config, updated_at)
            VALUES (1, $1, $2)
            ON CONFLICT (id) DO UPDATE SET config = EXCLUDED.config, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(Json(config))
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
