//! Registro de configuraciones de vehículo
//!
//! Una configuración por tipo de vehículo. Desactivar una configuración no
//! afecta a los viajes ya programados (guardan su propia copia de capacidad y precio).

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::catalog_dto::{CreateVehicleConfigRequest, UpdateVehicleConfigRequest};
use crate::models::vehicle_config::VehicleConfig;
use crate::repositories::{PageWindow, VehicleConfigRepository};
use crate::utils::clock::Clock;
use crate::utils::errors::{conflict_error, not_found_error, AppResult};
use crate::utils::validation::{check, validate_not_empty, validate_positive, validate_range};

pub struct VehicleConfigService {
    repository: Arc<dyn VehicleConfigRepository>,
    clock: Arc<dyn Clock>,
}

impl VehicleConfigService {
    pub fn new(repository: Arc<dyn VehicleConfigRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    fn validate_config(config: &VehicleConfig) -> AppResult<()> {
        check("display_name", validate_not_empty(&config.display_name))?;
        check("total_price", validate_positive(config.total_price))?;
        check("min_seats", validate_range(config.min_seats, 1, config.max_seats))?;
        Ok(())
    }

    async fn ensure_type_is_free(&self, config: &VehicleConfig) -> AppResult<()> {
        if let Some(existing) = self.repository.find_by_type(config.vehicle_type).await? {
            if existing.id != config.id {
                return Err(conflict_error("VehicleConfig", "vehicle_type", config.vehicle_type.as_str()));
            }
        }
        Ok(())
    }

    pub async fn create(&self, request: CreateVehicleConfigRequest) -> AppResult<VehicleConfig> {
        request.validate()?;

        let now = self.clock.now();
        let config = VehicleConfig {
            id: Uuid::new_v4(),
            vehicle_type: request.vehicle_type,
            display_name: request.display_name.trim().to_string(),
            total_price: request.total_price,
            min_seats: request.min_seats,
            max_seats: request.max_seats,
            display_order: request.display_order.unwrap_or(0),
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        Self::validate_config(&config)?;
        self.ensure_type_is_free(&config).await?;
        self.repository.insert(&config).await?;

        log::info!("✅ Configuración de vehículo creada: {} ({})", config.display_name, config.vehicle_type);
        Ok(config)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<VehicleConfig> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("VehicleConfig", &id.to_string()))
    }

    pub async fn list(&self, include_inactive: bool, window: PageWindow) -> AppResult<(Vec<VehicleConfig>, i64)> {
        self.repository.list(include_inactive, window).await
    }

    pub async fn update(&self, id: Uuid, request: UpdateVehicleConfigRequest) -> AppResult<VehicleConfig> {
        request.validate()?;
        let mut config = self.get(id).await?;

        if let Some(vehicle_type) = request.vehicle_type {
            config.vehicle_type = vehicle_type;
        }
        if let Some(display_name) = request.display_name {
            config.display_name = display_name.trim().to_string();
        }
        if let Some(total_price) = request.total_price {
            config.total_price = total_price;
        }
        if let Some(min_seats) = request.min_seats {
            config.min_seats = min_seats;
        }
        if let Some(max_seats) = request.max_seats {
            config.max_seats = max_seats;
        }
        if let Some(display_order) = request.display_order {
            config.display_order = display_order;
        }
        if let Some(is_active) = request.is_active {
            config.is_active = is_active;
        }
        config.updated_at = self.clock.now();

        Self::validate_config(&config)?;
        self.ensure_type_is_free(&config).await?;
        self.repository.update(&config).await?;

        log::info!("✅ Configuración de vehículo actualizada: {}", config.id);
        Ok(config)
    }

    /// Baja lógica: la configuración deja de ofrecerse para nuevos viajes
    pub async fn deactivate(&self, id: Uuid) -> AppResult<VehicleConfig> {
        let mut config = self.get(id).await?;
        config.is_active = false;
        config.updated_at = self.clock.now();
        self.repository.update(&config).await?;

        log::info!("🗑️ Configuración de vehículo desactivada: {}", config.id);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle_config::VehicleType;
    use crate::repositories::InMemoryStore;
    use crate::utils::clock::SystemClock;
    use crate::utils::errors::AppError;
    use rust_decimal::Decimal;

    fn service() -> VehicleConfigService {
        VehicleConfigService::new(Arc::new(InMemoryStore::default()), Arc::new(SystemClock))
    }

    fn request(vehicle_type: VehicleType) -> CreateVehicleConfigRequest {
        CreateVehicleConfigRequest {
            vehicle_type,
            display_name: "Shared Sedan".to_string(),
            total_price: Decimal::new(2400, 0),
            min_seats: 2,
            max_seats: 4,
            display_order: Some(1),
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_one_config_per_vehicle_type() {
        let service = service();
        service.create(request(VehicleType::SharedCar)).await.unwrap();
        let err = service.create(request(VehicleType::SharedCar)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(service.create(request(VehicleType::Suv)).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_min_above_max_and_non_positive_price() {
        let service = service();
        let mut bad_seats = request(VehicleType::SharedCar);
        bad_seats.min_seats = 5;
        assert!(matches!(service.create(bad_seats).await, Err(AppError::ValidationErrors(_))));

        let mut free = request(VehicleType::SharedCar);
        free.total_price = Decimal::ZERO;
        assert!(matches!(service.create(free).await, Err(AppError::ValidationErrors(_))));
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_active_listing() {
        let service = service();
        let config = service.create(request(VehicleType::PremiumCar)).await.unwrap();
        service.deactivate(config.id).await.unwrap();

        let (active, total) = service.list(false, PageWindow::all()).await.unwrap();
        assert!(active.is_empty());
        assert_eq!(total, 0);
        let (all, _) = service.list(true, PageWindow::all()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_update_applies_partial_changes() {
        let service = service();
        let config = service.create(request(VehicleType::SharedAuto)).await.unwrap();
        let updated = service
            .update(
                config.id,
                UpdateVehicleConfigRequest { total_price: Some(Decimal::new(900, 0)), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(updated.total_price, Decimal::new(900, 0));
        assert_eq!(updated.max_seats, 4);
    }
}
