//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! de catálogo (vehículos, rutas, tarifas y conductores).

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

use crate::utils::errors::AppError;

lazy_static! {
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{10,15}$").expect("phone regex");
    static ref VEHICLE_NUMBER_REGEX: Regex =
        Regex::new(r"^[A-Z]{2}[0-9]{1,2}[A-Z]{0,3}[0-9]{4}$").expect("vehicle number regex");
}

/// Convertir un error de campo en `AppError` con el mismo formato que el derive
pub fn field_error(field: &'static str, error: ValidationError) -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    AppError::ValidationErrors(errors)
}

/// Aplicar una validación y asociar el error al campo indicado
pub fn check(field: &'static str, result: Result<(), ValidationError>) -> Result<(), AppError> {
    result.map_err(|e| field_error(field, e))
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor esté en un rango específico
pub fn validate_range<T: PartialOrd + std::fmt::Display + Serialize>(
    value: T,
    min: T,
    max: T,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        let mut error = ValidationError::new("range");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar formato de teléfono (dígitos, prefijo + opcional)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    if !PHONE_REGEX.is_match(&compact) {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar número de registro del vehículo (ej. KA01AB1234)
pub fn validate_vehicle_number(value: &str) -> Result<(), ValidationError> {
    let clean = value.replace([' ', '-'], "").to_uppercase();
    if !VEHICLE_NUMBER_REGEX.is_match(&clean) {
        let mut error = ValidationError::new("vehicle_number");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de coordenadas GPS
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &lat);
        error.add_param("range".into(), &"-90.0 to 90.0".to_string());
        return Err(error);
    }

    if !(-180.0..=180.0).contains(&lng) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &lng);
        error.add_param("range".into(), &"-180.0 to 180.0".to_string());
        return Err(error);
    }

    Ok(())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar una hora del día (0-23)
pub fn validate_hour(value: u32) -> Result<(), ValidationError> {
    validate_range(value, 0, 23)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_validate_range() {
        assert!(validate_range(5, 1, 10).is_ok());
        assert!(validate_range(0, 1, 10).is_err());
        assert!(validate_range(15, 1, 10).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+919876543210").is_ok());
        assert!(validate_phone("98765 43210").is_ok());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("98765abc10").is_err());
    }

    #[test]
    fn test_validate_vehicle_number() {
        assert!(validate_vehicle_number("KA01AB1234").is_ok());
        assert!(validate_vehicle_number("ka-01-ab-1234").is_ok());
        assert!(validate_vehicle_number("1234").is_err());
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(12.97, 77.59).is_ok());
        assert!(validate_coordinates(91.0, 77.59).is_err());
        assert!(validate_coordinates(12.97, -181.0).is_err());
    }

    #[test]
    fn test_validate_positive_decimal() {
        assert!(validate_positive(Decimal::new(15, 1)).is_ok());
        assert!(validate_positive(Decimal::ZERO).is_err());
        assert!(validate_non_negative(Decimal::ZERO).is_ok());
        assert!(validate_non_negative(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_field_error_is_validation_kind() {
        let err = field_error("name", ValidationError::new("not_empty"));
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
