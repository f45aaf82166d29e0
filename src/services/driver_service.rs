//! Registro de conductores y disponibilidad

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::driver_dto::{CreateDriverRequest, UpdateAvailabilityRequest};
use crate::models::driver::Driver;
use crate::repositories::{DriverRepository, PageWindow};
use crate::utils::clock::Clock;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::{check, validate_coordinates};

pub struct DriverService {
    repository: Arc<dyn DriverRepository>,
    clock: Arc<dyn Clock>,
}

fn check_position(lat: Option<f64>, lng: Option<f64>) -> AppResult<Option<(f64, f64)>> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            check("current_lat", validate_coordinates(lat, lng))?;
            Ok(Some((lat, lng)))
        }
        (None, None) => Ok(None),
        _ => Err(AppError::Validation("current_lat and current_lng must be given together".to_string())),
    }
}

impl DriverService {
    pub fn new(repository: Arc<dyn DriverRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub async fn register(&self, request: CreateDriverRequest) -> AppResult<Driver> {
        request.validate()?;
        let position = check_position(request.current_lat, request.current_lng)?;

        let now = self.clock.now();
        let driver = Driver {
            id: Uuid::new_v4(),
            full_name: request.full_name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            vehicle_number: request.vehicle_number.replace([' ', '-'], "").to_uppercase(),
            is_available: true,
            current_lat: position.map(|p| p.0),
            current_lng: position.map(|p| p.1),
            current_trip_id: None,
            created_at: now,
            updated_at: now,
        };
        self.repository.insert(&driver).await?;

        log::info!("✅ Conductor registrado: {} ({})", driver.full_name, driver.vehicle_number);
        Ok(driver)
    }

    pub async fn list(&self, window: PageWindow) -> AppResult<(Vec<Driver>, i64)> {
        self.repository.list(window).await
    }

    /// Un conductor con viaje en curso sigue ocupado aunque se marque disponible
    pub async fn update_availability(&self, id: Uuid, request: UpdateAvailabilityRequest) -> AppResult<Driver> {
        request.validate()?;
        let position = check_position(request.current_lat, request.current_lng)?;

        let driver = self
            .repository
            .update_availability(id, request.is_available, position)
            .await?
            .ok_or_else(|| not_found_error("Driver", &id.to_string()))?;

        log::info!(
            "🔄 Disponibilidad del conductor {}: {}",
            driver.id,
            if driver.is_available { "disponible" } else { "no disponible" }
        );
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryStore;
    use crate::utils::clock::SystemClock;

    fn service() -> DriverService {
        DriverService::new(Arc::new(InMemoryStore::default()), Arc::new(SystemClock))
    }

    fn request() -> CreateDriverRequest {
        CreateDriverRequest {
            full_name: "Ravi Kumar".to_string(),
            phone: "+91 98765 43210".to_string(),
            vehicle_number: "ka-01-ab-1234".to_string(),
            current_lat: Some(12.97),
            current_lng: Some(77.59),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_vehicle_number() {
        let driver = service().register(request()).await.unwrap();
        assert_eq!(driver.vehicle_number, "KA01AB1234");
        assert!(driver.can_take_trip());
    }

    #[tokio::test]
    async fn test_rejects_half_position_and_bad_phone() {
        let service = service();
        let mut half = request();
        half.current_lng = None;
        assert!(matches!(service.register(half).await, Err(AppError::Validation(_))));

        let mut phone = request();
        phone.phone = "12ab".to_string();
        assert!(matches!(service.register(phone).await, Err(AppError::ValidationErrors(_))));
    }

    #[tokio::test]
    async fn test_update_availability_of_unknown_driver() {
        let err = service()
            .update_availability(
                Uuid::new_v4(),
                UpdateAvailabilityRequest { is_available: false, current_lat: None, current_lng: None },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
