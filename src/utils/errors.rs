//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    ValidationErrors(#[from] validator::ValidationErrors),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl AppError {
    /// Código estable que consume la consola de administración
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::ValidationErrors(_) | AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::InvalidOtp => "INVALID_OTP",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidStateTransition(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationErrors(_)
            | AppError::Validation(_)
            | AppError::CapacityExceeded(_)
            | AppError::InvalidOtp
            | AppError::Configuration(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code().to_string();

        let error_response = match self {
            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                ErrorResponse {
                    error: "Database Error".to_string(),
                    message: "An error occurred while accessing the database".to_string(),
                    details: Some(json!({ "sql_error": e.to_string() })),
                    code,
                }
            }

            AppError::ValidationErrors(e) => {
                tracing::warn!("Validation error: {}", e);
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(e)),
                    code,
                }
            }

            AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                ErrorResponse {
                    error: "Internal Server Error".to_string(),
                    message: "An unexpected error occurred".to_string(),
                    details: Some(json!({ "internal_error": msg })),
                    code,
                }
            }

            AppError::InvalidOtp => ErrorResponse {
                error: "Invalid OTP".to_string(),
                message: "The OTP does not match this booking".to_string(),
                details: None,
                code,
            },

            other => {
                let error = match &other {
                    AppError::Validation(_) => "Validation Error",
                    AppError::CapacityExceeded(_) => "Capacity Exceeded",
                    AppError::InvalidStateTransition(_) => "Invalid State Transition",
                    AppError::NotFound(_) => "Not Found",
                    AppError::Configuration(_) => "Configuration Error",
                    _ => "Conflict",
                };
                let message = match other {
                    AppError::Validation(msg)
                    | AppError::CapacityExceeded(msg)
                    | AppError::InvalidStateTransition(msg)
                    | AppError::NotFound(msg)
                    | AppError::Configuration(msg)
                    | AppError::Conflict(msg) => msg,
                    rest => rest.to_string(),
                };
                tracing::debug!("{}: {}", error, message);
                ErrorResponse {
                    error: error.to_string(),
                    message,
                    details: None,
                    code,
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Función helper para transiciones de estado no permitidas
pub fn transition_error(entity: &str, from: &str, action: &str) -> AppError {
    AppError::InvalidStateTransition(format!("Cannot {} a {} in status {}", action, entity, from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_by_kind() {
        assert_eq!(not_found_error("Trip", "x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            transition_error("trip", "DISPATCHED", "dispatch").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::CapacityExceeded("full".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::InvalidOtp.code(), "INVALID_OTP");
    }

    #[test]
    fn test_conflict_error_message() {
        let err = conflict_error("Vehicle config", "vehicle_type", "SUV");
        assert_eq!(err.to_string(), "Conflict: Vehicle config with vehicle_type 'SUV' already exists");
    }
}
