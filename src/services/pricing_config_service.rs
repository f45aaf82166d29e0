//! Configuración de tarifas vigente
//!
//! Es la configuración que se copia en cada viaje nuevo. Cambiarla no altera
//! los viajes existentes.

use std::sync::Arc;

use rust_decimal::Decimal;
use validator::{Validate, ValidationError};

use crate::dto::catalog_dto::UpdatePricingConfigRequest;
use crate::models::pricing::PricingConfig;
use crate::repositories::PricingConfigRepository;
use crate::utils::clock::Clock;
use crate::utils::errors::AppResult;
use crate::utils::validation::{check, validate_hour, validate_non_negative, validate_positive, validate_range};

pub struct PricingConfigService {
    repository: Arc<dyn PricingConfigRepository>,
    clock: Arc<dyn Clock>,
}

impl PricingConfigService {
    pub fn new(repository: Arc<dyn PricingConfigRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Configuración actual; los valores por defecto si nunca se guardó ninguna
    pub async fn current(&self) -> AppResult<PricingConfig> {
        match self.repository.current().await? {
            Some(config) => Ok(config),
            None => Ok(PricingConfig { updated_at: self.clock.now(), ..PricingConfig::default() }),
        }
    }

    fn validate_config(config: &PricingConfig) -> AppResult<()> {
        let hundred = Decimal::ONE_HUNDRED;
        check("commission_percent", validate_range(config.commission_percent, Decimal::ZERO, hundred))?;
        check("platform_fee_percent", validate_range(config.platform_fee_percent, Decimal::ZERO, hundred))?;
        check("gst_percent", validate_range(config.gst_percent, Decimal::ZERO, hundred))?;
        check("min_commission_amount", validate_non_negative(config.min_commission_amount))?;
        check("max_commission_amount", validate_non_negative(config.max_commission_amount))?;
        if config.min_commission_amount > config.max_commission_amount {
            let mut error = ValidationError::new("min_exceeds_max");
            error.add_param("min".into(), &config.min_commission_amount);
            error.add_param("max".into(), &config.max_commission_amount);
            check("min_commission_amount", Err(error))?;
        }
        check("night_fare_multiplier", validate_positive(config.night_fare_multiplier))?;
        check("night_start_hour", validate_hour(config.night_start_hour))?;
        check("night_end_hour", validate_hour(config.night_end_hour))?;
        check("utc_offset_minutes", validate_range(config.utc_offset_minutes, -12 * 60, 14 * 60))?;
        Ok(())
    }

    pub async fn update(&self, request: UpdatePricingConfigRequest) -> AppResult<PricingConfig> {
        request.validate()?;
        let mut config = self.current().await?;

        if let Some(value) = request.commission_percent {
            config.commission_percent = value;
        }
        if let Some(value) = request.platform_fee_percent {
            config.platform_fee_percent = value;
        }
        if let Some(value) = request.gst_percent {
            config.gst_percent = value;
        }
        if let Some(value) = request.min_commission_amount {
            config.min_commission_amount = value;
        }
        if let Some(value) = request.max_commission_amount {
            config.max_commission_amount = value;
        }
        if let Some(value) = request.commission_enabled {
            config.commission_enabled = value;
        }
        if let Some(value) = request.night_fare_enabled {
            config.night_fare_enabled = value;
        }
        if let Some(value) = request.night_fare_multiplier {
            config.night_fare_multiplier = value;
        }
        if let Some(value) = request.night_start_hour {
            config.night_start_hour = value;
        }
        if let Some(value) = request.night_end_hour {
            config.night_end_hour = value;
        }
        if let Some(value) = request.utc_offset_minutes {
            config.utc_offset_minutes = value;
        }
        config.updated_at = self.clock.now();

        Self::validate_config(&config)?;
        self.repository.save(&config).await?;

        log::info!(
            "💰 Tarifas actualizadas: comisión {}%, tasa plataforma {}%, GST {}%",
            config.commission_percent,
            config.platform_fee_percent,
            config.gst_percent
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryStore;
    use crate::utils::clock::SystemClock;
    use crate::utils::errors::AppError;

    fn service() -> PricingConfigService {
        PricingConfigService::new(Arc::new(InMemoryStore::default()), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn test_defaults_until_first_update() {
        let service = service();
        let config = service.current().await.unwrap();
        assert_eq!(config.commission_percent, Decimal::new(10, 0));
        assert_eq!(config.night_start_hour, 22);
    }

    #[tokio::test]
    async fn test_update_persists_partial_changes() {
        let service = service();
        service
            .update(UpdatePricingConfigRequest {
                night_fare_enabled: Some(true),
                gst_percent: Some(Decimal::new(5, 0)),
                ..Default::default()
            })
            .await
            .unwrap();

        let config = service.current().await.unwrap();
        assert!(config.night_fare_enabled);
        assert_eq!(config.gst_percent, Decimal::new(5, 0));
        assert_eq!(config.commission_percent, Decimal::new(10, 0));
    }

    #[tokio::test]
    async fn test_rejects_inverted_commission_bounds() {
        let service = service();
        let err = service
            .update(UpdatePricingConfigRequest {
                min_commission_amount: Some(Decimal::new(600, 0)),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationErrors(_)));
        assert_eq!(service.current().await.unwrap().min_commission_amount, Decimal::new(10, 0));
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_hour() {
        let service = service();
        let err = service
            .update(UpdatePricingConfigRequest { night_end_hour: Some(24), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationErrors(_)));
    }
}
